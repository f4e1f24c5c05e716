//! Behavior and movement systems.
//!
//! Systems contain the logic that processes components.
//! Each system should do one thing well.
//!
//! Per frame, every living agent picks the nearest target, wanders,
//! integrates its position, bounces off the field walls and fires if its
//! weapon is ready. Projectiles and particles then drift on their own.

use crate::combat::{fire_weapon, AIM_NOISE};
use crate::components::{Agent, AgentId, Color, CombatRole, Particle};
use crate::config::FieldConfig;
use crate::math::Vec2;
use crate::random::RandomSource;
use crate::simulation::{BattleState, StepEvents};

/// Per-axis velocity noise added every frame.
pub const WANDER_JITTER: f32 = 0.06;

/// Distance from each wall at which agents bounce.
pub const BOUNDARY_INSET: f32 = 10.0;

/// Particles in a standard hit or death burst.
pub const BURST_PARTICLES: usize = 40;

/// Fraction of particle velocity applied per frame unit.
pub const PARTICLE_DRAG: f32 = 0.7;

/// Downward acceleration of particles per frame unit.
pub const PARTICLE_GRAVITY: f32 = 0.05;

/// Index of the nearest living agent other than `index`.
///
/// Ties keep the first agent found in id order.
#[must_use]
pub fn nearest_target(agents: &[Agent], index: usize) -> Option<usize> {
    let origin = agents.get(index)?.position;
    let mut best: Option<(usize, f32)> = None;

    for (other, agent) in agents.iter().enumerate() {
        if other == index || !agent.alive {
            continue;
        }
        let distance = agent.position.distance_squared(origin);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((other, distance));
        }
    }

    best.map(|(other, _)| other)
}

/// Advance the wander timer and pick a fresh heading once it runs out.
pub fn wander(agent: &mut Agent, dt: f32, rng: &mut dyn RandomSource) {
    agent.wander.advance(dt);
    if agent.wander.elapsed <= agent.wander.interval {
        return;
    }

    let interval = rng.range(400.0, 2000.0);
    agent.wander.reset_with_interval(interval);
    let speed = agent.role().wander_speed(agent.is_hero());
    agent.velocity = Vec2::from_angle(rng.angle(), speed);
}

/// Add a small random nudge to each velocity axis.
pub fn apply_jitter(agent: &mut Agent, rng: &mut dyn RandomSource) {
    agent.velocity.x += rng.range(-WANDER_JITTER, WANDER_JITTER);
    agent.velocity.y += rng.range(-WANDER_JITTER, WANDER_JITTER);
}

/// Cap speed at the role maximum, keeping the heading.
pub fn clamp_speed(agent: &mut Agent) {
    agent.velocity = agent.velocity.clamp_length(agent.role().max_speed());
}

/// Clamp the position inside the inset walls, flipping velocity on contact.
pub fn reflect_off_walls(agent: &mut Agent, field: &FieldConfig) {
    let (min_x, max_x) = (BOUNDARY_INSET, field.width - BOUNDARY_INSET);
    let (min_y, max_y) = (BOUNDARY_INSET, field.height - BOUNDARY_INSET);

    if agent.position.x < min_x {
        agent.position.x = min_x;
        agent.velocity.x = -agent.velocity.x;
    } else if agent.position.x > max_x {
        agent.position.x = max_x;
        agent.velocity.x = -agent.velocity.x;
    }

    if agent.position.y < min_y {
        agent.position.y = min_y;
        agent.velocity.y = -agent.velocity.y;
    } else if agent.position.y > max_y {
        agent.position.y = max_y;
        agent.velocity.y = -agent.velocity.y;
    }
}

/// Move, time and fire every living agent in id order.
pub fn behavior_system(
    state: &mut BattleState,
    dt: f32,
    rng: &mut dyn RandomSource,
    events: &mut StepEvents,
) {
    let field = state.field;

    for index in 0..state.agents.len() {
        if !state.agents[index].alive {
            continue;
        }

        let target = nearest_target(&state.agents, index);
        let aim = target.map(|t| state.agents[t].position);

        let agent = &mut state.agents[index];
        agent.target = target.map(|t| t as AgentId);

        wander(agent, dt, rng);
        apply_jitter(agent, rng);
        clamp_speed(agent);
        agent.position += agent.velocity * dt;
        reflect_off_walls(agent, &field);

        agent.fire.advance(dt);
        agent.swing.advance(dt);

        if agent.role() == CombatRole::Ranged && agent.fire.has_elapsed() {
            if let Some(aim) = aim {
                let noisy = aim
                    + Vec2::new(
                        rng.range(-AIM_NOISE, AIM_NOISE),
                        rng.range(-AIM_NOISE, AIM_NOISE),
                    );
                events.shots_fired += fire_weapon(agent, noisy, rng, &mut state.projectiles);
            }
            agent.fire.reset();
        }
    }
}

/// Integrate projectile positions.
pub fn projectile_motion_system(state: &mut BattleState, dt: f32) {
    for projectile in &mut state.projectiles {
        projectile.position += projectile.velocity * dt;
    }
}

/// Drift particles under drag and gravity and drop the expired ones.
pub fn particle_system(particles: &mut Vec<Particle>, dt: f32) {
    for particle in particles.iter_mut() {
        particle.position += particle.velocity * (dt * PARTICLE_DRAG);
        particle.velocity.y += PARTICLE_GRAVITY * dt;
        particle.life -= dt;
    }
    particles.retain(|particle| particle.life > 0.0);
}

/// Push a single particle.
pub fn emit_particle(
    particles: &mut Vec<Particle>,
    position: Vec2,
    velocity: Vec2,
    life: f32,
    color: Color,
) {
    particles.push(Particle {
        position,
        velocity,
        life,
        color,
    });
}

/// Emit a standard burst of debris at `position`.
pub fn emit_burst(
    particles: &mut Vec<Particle>,
    position: Vec2,
    color: Color,
    rng: &mut dyn RandomSource,
) {
    particles.reserve(BURST_PARTICLES);
    for _ in 0..BURST_PARTICLES {
        let velocity = Vec2::new(rng.range(-3.0, 3.0), rng.range(-3.0, 3.0));
        let life = rng.range(30.0, 80.0);
        emit_particle(particles, position, velocity, life, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::WeaponKind;
    use crate::population::{spawn_agent, AgentSpawnParams};
    use crate::random::SeededSource;

    /// Always returns the same sample. 0.5 maps every symmetric range to 0.
    struct ConstantSource(f32);

    impl RandomSource for ConstantSource {
        fn next_unit(&mut self) -> f32 {
            self.0
        }
    }

    fn agent_at(id: AgentId, x: f32, y: f32, rng: &mut dyn RandomSource) -> Agent {
        spawn_agent(
            id,
            AgentSpawnParams {
                position: Vec2::new(x, y),
                fire_interval: Some(10_000.0),
                ..Default::default()
            },
            rng,
        )
    }

    fn state(agents: Vec<Agent>) -> BattleState {
        BattleState {
            agents,
            projectiles: Vec::new(),
            particles: Vec::new(),
            field: FieldConfig::default(),
        }
    }

    #[test]
    fn test_nearest_target_prefers_first_on_tie() {
        let mut rng = ConstantSource(0.5);
        let agents = vec![
            agent_at(0, 100.0, 100.0, &mut rng),
            agent_at(1, 110.0, 100.0, &mut rng),
            agent_at(2, 90.0, 100.0, &mut rng),
        ];
        assert_eq!(nearest_target(&agents, 0), Some(1));
    }

    #[test]
    fn test_nearest_target_skips_dead() {
        let mut rng = ConstantSource(0.5);
        let mut agents = vec![
            agent_at(0, 100.0, 100.0, &mut rng),
            agent_at(1, 105.0, 100.0, &mut rng),
            agent_at(2, 200.0, 100.0, &mut rng),
        ];
        agents[1].kill();
        assert_eq!(nearest_target(&agents, 0), Some(2));

        agents[2].kill();
        assert_eq!(nearest_target(&agents, 0), None);
    }

    #[test]
    fn test_bounce_clamps_and_flips_once() {
        let mut rng = ConstantSource(0.5);
        let mut agent = agent_at(0, 5.0, 300.0, &mut rng);
        agent.velocity = Vec2::new(-1.0, 0.0);

        reflect_off_walls(&mut agent, &FieldConfig::default());
        assert!((agent.position.x - BOUNDARY_INSET).abs() < f32::EPSILON);
        assert!((agent.velocity.x - 1.0).abs() < f32::EPSILON);

        // Already on the wall and moving away: no second flip
        reflect_off_walls(&mut agent, &FieldConfig::default());
        assert!((agent.velocity.x - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bounce_far_walls() {
        let mut rng = ConstantSource(0.5);
        let mut agent = agent_at(0, 995.0, 698.0, &mut rng);
        agent.velocity = Vec2::new(1.0, 2.0);

        reflect_off_walls(&mut agent, &FieldConfig::default());
        assert!((agent.position.x - 990.0).abs() < f32::EPSILON);
        assert!((agent.position.y - 690.0).abs() < f32::EPSILON);
        assert!(agent.velocity.x < 0.0 && agent.velocity.y < 0.0);
    }

    #[test]
    fn test_clamp_speed_by_role() {
        let mut rng = ConstantSource(0.5);
        let mut agent = agent_at(0, 100.0, 100.0, &mut rng);
        agent.velocity = Vec2::new(10.0, 0.0);
        clamp_speed(&mut agent);
        assert!((agent.speed() - CombatRole::Ranged.max_speed()).abs() < 1e-4);
    }

    #[test]
    fn test_wander_picks_new_heading_when_due() {
        let mut rng = ConstantSource(0.25);
        let mut agent = agent_at(0, 100.0, 100.0, &mut rng);
        agent.wander = crate::components::Cooldown::new(5.0);

        wander(&mut agent, 3.0, &mut rng);
        assert_eq!(agent.velocity, Vec2::ZERO);

        wander(&mut agent, 3.0, &mut rng);
        assert!((agent.speed() - 0.6).abs() < 1e-4);
        assert!((agent.wander.elapsed).abs() < f32::EPSILON);
        assert!((agent.wander.interval - 800.0).abs() < 1e-3);
    }

    #[test]
    fn test_behavior_moves_living_and_skips_dead() {
        let mut rng = ConstantSource(0.5);
        let mut a = agent_at(0, 100.0, 100.0, &mut rng);
        a.velocity = Vec2::new(1.0, 0.0);
        let mut b = agent_at(1, 300.0, 300.0, &mut rng);
        b.velocity = Vec2::new(1.0, 0.0);
        b.kill();

        let mut state = state(vec![a, b]);
        behavior_system(&mut state, 2.0, &mut rng, &mut StepEvents::default());

        assert!((state.agents[0].position.x - 102.0).abs() < 1e-4);
        assert!((state.agents[1].position.x - 300.0).abs() < f32::EPSILON);
        assert_eq!(state.agents[0].target, None);
    }

    #[test]
    fn test_ranged_agent_fires_at_target_when_ready() {
        let mut rng = ConstantSource(0.5);
        let mut shooter = agent_at(0, 100.0, 100.0, &mut rng);
        shooter.fire = crate::components::Cooldown::new(0.5);
        let target = agent_at(1, 300.0, 100.0, &mut rng);

        let mut state = state(vec![shooter, target]);
        let mut events = StepEvents::default();
        behavior_system(&mut state, 1.0, &mut rng, &mut events);

        assert_eq!(events.shots_fired, 1);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectiles[0].owner, 0);
        assert!(state.projectiles[0].velocity.x > 0.0);
        assert!(state.agents[0].fire.elapsed.abs() < f32::EPSILON);
    }

    #[test]
    fn test_ranged_agent_holds_fire_at_exact_interval() {
        let mut rng = ConstantSource(0.5);
        let mut shooter = agent_at(0, 100.0, 100.0, &mut rng);
        shooter.fire = crate::components::Cooldown::new(1.0);
        let target = agent_at(1, 300.0, 100.0, &mut rng);

        let mut state = state(vec![shooter, target]);
        let mut events = StepEvents::default();
        behavior_system(&mut state, 1.0, &mut rng, &mut events);
        assert_eq!(events.shots_fired, 0);

        behavior_system(&mut state, 1.0, &mut rng, &mut events);
        assert_eq!(events.shots_fired, 1);
    }

    #[test]
    fn test_fire_cooldown_resets_without_target() {
        let mut rng = ConstantSource(0.5);
        let mut shooter = agent_at(0, 100.0, 100.0, &mut rng);
        shooter.fire = crate::components::Cooldown::new(0.5);

        let mut state = state(vec![shooter]);
        let mut events = StepEvents::default();
        behavior_system(&mut state, 1.0, &mut rng, &mut events);

        assert_eq!(events.shots_fired, 0);
        assert!(state.projectiles.is_empty());
        assert!(state.agents[0].fire.elapsed.abs() < f32::EPSILON);
    }

    #[test]
    fn test_melee_agents_never_fire() {
        let mut rng = SeededSource::seeded(3);
        let swordsman = spawn_agent(
            0,
            AgentSpawnParams {
                position: Vec2::new(100.0, 100.0),
                weapon: WeaponKind::Sword,
                fire_interval: Some(0.0),
                ..Default::default()
            },
            &mut rng,
        );
        let target = agent_at(1, 400.0, 100.0, &mut rng);

        let mut state = state(vec![swordsman, target]);
        let mut events = StepEvents::default();
        behavior_system(&mut state, 1.0, &mut rng, &mut events);
        assert_eq!(events.shots_fired, 0);
    }

    #[test]
    fn test_particles_fall_and_expire() {
        let mut particles = Vec::new();
        emit_particle(&mut particles, Vec2::ZERO, Vec2::new(1.0, 0.0), 2.0, Color::IMPACT);

        particle_system(&mut particles, 1.0);
        assert_eq!(particles.len(), 1);
        assert!((particles[0].position.x - PARTICLE_DRAG).abs() < 1e-5);
        assert!((particles[0].velocity.y - PARTICLE_GRAVITY).abs() < 1e-5);

        particle_system(&mut particles, 1.0);
        assert!(particles.is_empty());
    }

    #[test]
    fn test_burst_size() {
        let mut rng = SeededSource::seeded(9);
        let mut particles = Vec::new();
        emit_burst(&mut particles, Vec2::new(5.0, 5.0), Color::MELEE_HIT, &mut rng);
        assert_eq!(particles.len(), BURST_PARTICLES);
        assert!(particles
            .iter()
            .all(|p| (30.0..80.0).contains(&p.life) && p.velocity.x.abs() <= 3.0));
    }
}
