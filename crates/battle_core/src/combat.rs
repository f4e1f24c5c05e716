//! Weapon loadouts and combat resolution.
//!
//! This module implements every rule that can damage or kill an agent:
//! - Ranged fire spawning one or more projectiles toward a target
//! - Projectile impact with flat damage and kill credit to the owner
//! - Hero mutual annihilation and the large-area explosion it triggers
//! - Hero instant kills on contact with any non-hero
//! - Melee swings gated by a per-attacker cooldown
//!
//! All kills go through one path so attribution and buffs are applied
//! exactly once per alive-to-dead transition.

use serde::{Deserialize, Serialize};

use crate::components::{
    Agent, AgentId, Color, CombatRole, Projectile, Weapon, WeaponKind, WeaponPattern,
};
use crate::config::FieldConfig;
use crate::math::{Rect, Vec2};
use crate::progression::apply_buff;
use crate::random::RandomSource;
use crate::simulation::{BattleState, StepEvents};
use crate::systems::{emit_burst, emit_particle};

/// Frames a projectile survives without hitting anything.
pub const PROJECTILE_LIFE: u32 = 220;

/// Extra distance beyond the target radius that still counts as a hit.
pub const PROJECTILE_HIT_PADDING: f32 = 2.0;

/// Two heroes closer than their radii plus this annihilate each other.
pub const HERO_CLASH_PADDING: f32 = 2.0;

/// A hero closer than the combined radii plus this kills a non-hero outright.
pub const HERO_CONTACT_PADDING: f32 = 1.0;

/// Maximum aim error on each axis.
pub const AIM_NOISE: f32 = 6.0;

/// Distance beyond the shooter radius at which projectiles appear.
pub const MUZZLE_OFFSET: f32 = 6.0;

/// Debris spawned by a large-area explosion.
pub const EXPLOSION_PARTICLES: usize = 900;

/// Lower bound on either side of the explosion rectangle.
pub const EXPLOSION_MIN_SIZE: f32 = 60.0;

// ============================================================================
// Loadouts
// ============================================================================

/// A rolled weapon plus the timer intervals that go with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loadout {
    /// Weapon stats.
    pub weapon: Weapon,
    /// Interval between ranged shots.
    pub fire_interval: f32,
    /// Interval between melee swings.
    pub swing_interval: f32,
}

/// Fallback swing interval for agents without a melee weapon.
pub const DEFAULT_SWING_INTERVAL: f32 = 600.0;

/// Roll the stats for a weapon archetype.
///
/// Burst weapons trade damage for volume: the shotgun's six pellets deal
/// half a gun shot each, the minigun fires several times faster for a
/// third of the damage.
pub fn roll_loadout(kind: WeaponKind, rng: &mut dyn RandomSource) -> Loadout {
    let ranged = |damage: u32, pellets: u32, spread: f32, projectile_speed: f32| Weapon {
        kind,
        damage,
        pattern: WeaponPattern::Ranged {
            pellets,
            spread,
            projectile_speed,
        },
    };

    match kind {
        WeaponKind::Gun => Loadout {
            weapon: ranged(18, 1, 0.0, 4.0),
            fire_interval: rng.range(600.0, 1100.0),
            swing_interval: DEFAULT_SWING_INTERVAL,
        },
        WeaponKind::Shotgun => Loadout {
            weapon: ranged(9, 6, 0.6, 4.0),
            fire_interval: rng.range(1200.0, 2000.0),
            swing_interval: DEFAULT_SWING_INTERVAL,
        },
        WeaponKind::Minigun => Loadout {
            weapon: ranged(6, 1, 0.0, 6.0),
            fire_interval: rng.range(120.0, 260.0),
            swing_interval: DEFAULT_SWING_INTERVAL,
        },
        WeaponKind::Sword | WeaponKind::Axe => {
            let damage = rng.range(70.0, 110.0).floor() as u32;
            let reach = 10.0 + rng.range(0.0, 6.0);
            let swing_interval = rng.range(500.0, 1000.0);
            Loadout {
                weapon: Weapon {
                    kind,
                    damage,
                    pattern: WeaponPattern::Melee { reach },
                },
                // Never consulted for melee agents.
                fire_interval: rng.range(400.0, 1200.0),
                swing_interval,
            }
        }
    }
}

// ============================================================================
// Combat Events
// ============================================================================

/// What caused an agent to die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillCause {
    /// Lethal projectile hit. Credited to the owner.
    Projectile,
    /// Lethal melee swing. Credited to the attacker.
    Melee,
    /// Touched by a hero. Credited to the hero.
    HeroContact,
    /// Two heroes touched. Uncredited.
    Annihilation,
    /// Caught in a large-area explosion. Uncredited.
    Explosion,
}

/// An agent died this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillEvent {
    /// Credited agent, if any.
    pub killer: Option<AgentId>,
    /// Agent that died.
    pub victim: AgentId,
    /// How it died.
    pub cause: KillCause,
}

/// Damage was dealt by a projectile or melee swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// The agent dealing damage.
    pub attacker: AgentId,
    /// The agent receiving damage.
    pub target: AgentId,
    /// Amount of damage dealt.
    pub damage: u32,
}

/// Two heroes annihilated each other and set off an explosion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplosionEvent {
    /// The two heroes, in id order.
    pub heroes: (AgentId, AgentId),
    /// Midpoint of the heroes when they touched.
    pub center: Vec2,
    /// Region in which non-heroes were killed.
    pub area: Rect,
}

// ============================================================================
// Kill resolution
// ============================================================================

/// Kill `victim`, emit its death burst and credit `killer` if given.
///
/// Does nothing if the victim is already dead, so a single death can
/// never be credited twice.
pub(crate) fn resolve_kill(
    state: &mut BattleState,
    victim: usize,
    killer: Option<usize>,
    cause: KillCause,
    rng: &mut dyn RandomSource,
    events: &mut StepEvents,
) {
    let Some(agent) = state.agents.get_mut(victim) else {
        return;
    };
    if !agent.alive {
        return;
    }

    agent.kill();
    let (position, color, victim_id) = (agent.position, agent.color, agent.id);
    emit_burst(&mut state.particles, position, color, rng);

    let credited = killer.and_then(|k| {
        let killer = state.agents.get_mut(k)?;
        if !killer.alive {
            return None;
        }
        apply_buff(killer, rng);
        Some(killer.id)
    });

    tracing::debug!(victim = victim_id, killer = ?credited, ?cause, "Agent killed");
    events.kills.push(KillEvent {
        killer: credited,
        victim: victim_id,
        cause,
    });
}

// ============================================================================
// Ranged fire
// ============================================================================

/// Spawn the shooter's pellets aimed at `aim`.
///
/// Returns the number of projectiles spawned (zero for melee weapons).
pub fn fire_weapon(
    shooter: &Agent,
    aim: Vec2,
    rng: &mut dyn RandomSource,
    projectiles: &mut Vec<Projectile>,
) -> u32 {
    let WeaponPattern::Ranged {
        pellets,
        spread,
        projectile_speed,
    } = shooter.weapon.pattern
    else {
        return 0;
    };

    let base_angle = (aim - shooter.position).angle();
    let center = pellets.saturating_sub(1) as f32 / 2.0;

    for i in 0..pellets {
        let offset = if pellets == 1 {
            0.0
        } else {
            (i as f32 - center) * spread
        };
        let angle = base_angle + offset * (rng.next_unit() * 0.8 + 0.6);
        let direction = Vec2::from_angle(angle, 1.0);

        projectiles.push(Projectile {
            owner: shooter.id,
            position: shooter.position + direction * (shooter.radius + MUZZLE_OFFSET),
            velocity: direction * projectile_speed,
            life: PROJECTILE_LIFE,
            damage: shooter.weapon.damage,
        });
    }

    pellets
}

// ============================================================================
// Resolution phases
// ============================================================================

/// Age projectiles and apply the first hit of each.
///
/// A projectile is removed when its lifetime runs out, when its owner is
/// dead, or on impact with the first living non-owner agent (id order)
/// within the target radius plus [`PROJECTILE_HIT_PADDING`].
pub fn projectile_impact_system(
    state: &mut BattleState,
    rng: &mut dyn RandomSource,
    events: &mut StepEvents,
) {
    let mut projectiles = std::mem::take(&mut state.projectiles);

    projectiles.retain_mut(|projectile| {
        projectile.life = projectile.life.saturating_sub(1);
        if projectile.life == 0 {
            return false;
        }

        let owner_alive = state
            .agents
            .get(projectile.owner as usize)
            .is_some_and(|owner| owner.alive);
        if !owner_alive {
            return false;
        }

        let hit = state.agents.iter().position(|agent| {
            agent.alive
                && agent.id != projectile.owner
                && agent.position.distance(projectile.position)
                    < agent.radius + PROJECTILE_HIT_PADDING
        });

        let Some(target) = hit else {
            return true;
        };

        let remaining = state.agents[target].health.apply_damage(projectile.damage);
        emit_burst(&mut state.particles, projectile.position, Color::IMPACT, rng);
        events.damage.push(DamageEvent {
            attacker: projectile.owner,
            target: state.agents[target].id,
            damage: projectile.damage,
        });

        if remaining <= 0 {
            resolve_kill(
                state,
                target,
                Some(projectile.owner as usize),
                KillCause::Projectile,
                rng,
                events,
            );
        }

        false
    });

    state.projectiles = projectiles;
}

/// Kill every pair of touching heroes and detonate at their midpoint.
///
/// Runs before [`hero_contact_system`] so a hero is never credited for
/// killing the other hero.
pub fn hero_annihilation_system(
    state: &mut BattleState,
    rng: &mut dyn RandomSource,
    events: &mut StepEvents,
) {
    let heroes: Vec<usize> = state
        .agents
        .iter()
        .enumerate()
        .filter(|(_, agent)| agent.alive && agent.is_hero())
        .map(|(index, _)| index)
        .collect();

    for (n, &a) in heroes.iter().enumerate() {
        for &b in &heroes[n + 1..] {
            let (first, second) = (&state.agents[a], &state.agents[b]);
            if !first.alive || !second.alive || !first.touches(second, HERO_CLASH_PADDING) {
                continue;
            }

            let center = first.position.midpoint(second.position);
            let pair = (first.id, second.id);
            tracing::debug!(heroes = ?pair, x = center.x, y = center.y, "Heroes annihilated");

            resolve_kill(state, a, None, KillCause::Annihilation, rng, events);
            resolve_kill(state, b, None, KillCause::Annihilation, rng, events);

            let area = large_area_explosion(state, center, rng, events);
            events.explosions.push(ExplosionEvent {
                heroes: pair,
                center,
                area,
            });
        }
    }
}

/// Living heroes instantly kill any living non-hero they touch.
pub fn hero_contact_system(
    state: &mut BattleState,
    rng: &mut dyn RandomSource,
    events: &mut StepEvents,
) {
    for hero in 0..state.agents.len() {
        if !state.agents[hero].alive || !state.agents[hero].is_hero() {
            continue;
        }

        for victim in 0..state.agents.len() {
            if victim == hero {
                continue;
            }
            let (h, v) = (&state.agents[hero], &state.agents[victim]);
            if !v.alive || v.is_hero() || !h.touches(v, HERO_CONTACT_PADDING) {
                continue;
            }

            resolve_kill(
                state,
                victim,
                Some(hero),
                KillCause::HeroContact,
                rng,
                events,
            );
        }
    }
}

/// Melee attackers swing at living agents within reach.
///
/// One swing per ready cooldown: the first target in id order takes the
/// hit and the cooldown restarts.
pub fn melee_system(state: &mut BattleState, rng: &mut dyn RandomSource, events: &mut StepEvents) {
    for attacker in 0..state.agents.len() {
        {
            let a = &state.agents[attacker];
            if !a.alive || a.role() != CombatRole::Melee {
                continue;
            }
        }

        for target in 0..state.agents.len() {
            if target == attacker {
                continue;
            }
            let (a, t) = (&state.agents[attacker], &state.agents[target]);
            if !a.alive || !t.alive {
                continue;
            }
            if a.distance_to(t) > a.radius + t.radius + a.weapon.reach() || !a.swing.is_ready() {
                continue;
            }

            let damage = a.weapon.damage;
            let attacker_id = a.id;

            let victim = &mut state.agents[target];
            let remaining = victim.health.apply_damage(damage);
            let (position, target_id) = (victim.position, victim.id);
            emit_burst(&mut state.particles, position, Color::MELEE_HIT, rng);
            state.agents[attacker].swing.reset();

            events.damage.push(DamageEvent {
                attacker: attacker_id,
                target: target_id,
                damage,
            });

            if remaining <= 0 {
                resolve_kill(state, target, Some(attacker), KillCause::Melee, rng, events);
            }
        }
    }
}

// ============================================================================
// Large-area explosion
// ============================================================================

/// Quarter-field rectangle centered on `center`, clamped inside the field.
#[must_use]
pub fn explosion_area(field: &FieldConfig, center: Vec2) -> Rect {
    let width = (field.width / 2.0).floor().max(EXPLOSION_MIN_SIZE);
    let height = (field.height / 2.0).floor().max(EXPLOSION_MIN_SIZE);
    let left = (center.x - width / 2.0)
        .floor()
        .min(field.width - width)
        .max(0.0);
    let top = (center.y - height / 2.0)
        .floor()
        .min(field.height - height)
        .max(0.0);
    Rect::new(left, top, width, height)
}

/// Fill the explosion area with debris and kill every non-hero inside it.
///
/// The kills are uncredited. Returns the affected area.
pub fn large_area_explosion(
    state: &mut BattleState,
    center: Vec2,
    rng: &mut dyn RandomSource,
    events: &mut StepEvents,
) -> Rect {
    let area = explosion_area(&state.field, center);

    state.particles.reserve(EXPLOSION_PARTICLES);
    for _ in 0..EXPLOSION_PARTICLES {
        let position = Vec2::new(
            area.left + rng.next_unit() * area.width,
            area.top + rng.next_unit() * area.height,
        );
        let velocity = Vec2::new(rng.range(-4.0, 4.0), rng.range(-4.0, 4.0));
        let life = rng.range(40.0, 140.0);
        let color = Color::random_fire(rng);
        emit_particle(&mut state.particles, position, velocity, life, color);
    }

    for index in 0..state.agents.len() {
        let agent = &state.agents[index];
        if agent.alive && !agent.is_hero() && area.contains(agent.position) {
            resolve_kill(state, index, None, KillCause::Explosion, rng, events);
        }
    }

    tracing::debug!(
        left = area.left,
        top = area.top,
        width = area.width,
        height = area.height,
        "Large-area explosion"
    );
    area
}
