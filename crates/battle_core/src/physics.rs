//! Collision and separation physics.
//!
//! Resolves residual overlaps between living agents after combat. Pairs
//! are visited once each, in ascending id order, and pushed apart along
//! their contact normal with a damped velocity exchange. This pass never
//! damages or kills.

use crate::components::Agent;
use crate::math::Vec2;
use crate::random::RandomSource;

/// Extra clearance kept between agent edges.
pub const SEPARATION_PADDING: f32 = 1.0;

/// Fraction of the normal velocity difference exchanged on contact.
pub const IMPULSE_SHARE: f32 = 0.5;

/// Damping applied to the exchanged impulse.
pub const IMPULSE_DAMPING: f32 = 0.7;

/// Nudge applied to exactly coincident agents before separating them.
pub const COINCIDENT_JITTER: f32 = 0.5;

/// Push apart every overlapping pair of living agents.
pub fn separation_system(agents: &mut [Agent], rng: &mut dyn RandomSource) {
    for i in 0..agents.len() {
        if !agents[i].alive {
            continue;
        }
        for j in (i + 1)..agents.len() {
            if !agents[j].alive {
                continue;
            }
            let (head, tail) = agents.split_at_mut(j);
            separate_pair(&mut head[i], &mut tail[0], rng);
        }
    }
}

/// Resolve the overlap between two agents, if any.
pub fn separate_pair(a: &mut Agent, b: &mut Agent, rng: &mut dyn RandomSource) {
    let min_distance = a.radius + b.radius + SEPARATION_PADDING;
    let mut delta = b.position - a.position;
    let mut distance = delta.length();

    if distance >= min_distance {
        return;
    }

    if distance == 0.0 {
        let nudge = Vec2::from_angle(rng.angle(), COINCIDENT_JITTER);
        a.position -= nudge;
        b.position += nudge;
        delta = nudge;
        distance = COINCIDENT_JITTER;
    }

    let normal = delta * (1.0 / distance);
    let overlap = min_distance - distance;
    let shift = normal * (overlap * 0.5);
    a.position -= shift;
    b.position += shift;

    let va = a.velocity.dot(normal);
    let vb = b.velocity.dot(normal);
    let impulse = (va - vb) * IMPULSE_SHARE * IMPULSE_DAMPING;
    a.velocity -= normal * impulse;
    b.velocity += normal * impulse;
}
