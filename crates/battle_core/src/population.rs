//! Population construction.
//!
//! Builds a fresh set of agents with random placement, cosmetics and
//! loadouts, then promotes heroes and the special character by uniform
//! distinct selection.

use crate::combat::roll_loadout;
use crate::components::{
    Agent, AgentId, AgentKind, Color, CombatRole, Cooldown, Health, HeroKind, Shape, WeaponKind,
};
use crate::config::SimConfig;
use crate::math::Vec2;
use crate::random::RandomSource;

/// Distance from the field edge inside which agents are never spawned.
pub const SPAWN_MARGIN: f32 = 20.0;

/// Initial velocity band on each axis.
pub const SPAWN_SPEED: f32 = 0.4;

/// Minimum base speed of a hero before its speed bonus.
pub const HERO_MIN_SPEED: f32 = 0.6;

/// Hero speed multiplier.
pub const HERO_SPEED_BONUS: f32 = 1.6;

/// Ranged speed multiplier.
pub const RANGED_SPEED_SCALE: f32 = 0.6;

/// Parameters for spawning a single agent.
///
/// Unset optional fields are drawn from the weapon and kind defaults.
#[derive(Debug, Clone)]
pub struct AgentSpawnParams {
    /// Initial position.
    pub position: Vec2,
    /// Initial velocity.
    pub velocity: Vec2,
    /// Special tag.
    pub kind: AgentKind,
    /// Weapon archetype.
    pub weapon: WeaponKind,
    /// Starting hit points (defaults to the kind's maximum).
    pub health: Option<i32>,
    /// Starting radius (defaults to the kind's base radius).
    pub radius: Option<f32>,
    /// Damage override for the rolled weapon.
    pub damage: Option<u32>,
    /// Fire interval override.
    pub fire_interval: Option<f32>,
    /// Swing interval override.
    pub swing_interval: Option<f32>,
    /// Display color (defaults to the kind's color or a random pastel).
    pub color: Option<Color>,
    /// Display shape (defaults to a random shape).
    pub shape: Option<Shape>,
}

impl Default for AgentSpawnParams {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            kind: AgentKind::Normal,
            weapon: WeaponKind::Gun,
            health: None,
            radius: None,
            damage: None,
            fire_interval: None,
            swing_interval: None,
            color: None,
            shape: None,
        }
    }
}

/// Create one agent from spawn parameters.
pub fn spawn_agent(id: AgentId, params: AgentSpawnParams, rng: &mut dyn RandomSource) -> Agent {
    let mut loadout = roll_loadout(params.weapon, rng);
    if let Some(damage) = params.damage {
        loadout.weapon.damage = damage;
    }

    let color = params.color.unwrap_or_else(|| match params.kind {
        AgentKind::Hero(hero) => hero.color(),
        AgentKind::SpecialCharacter => Color::SPECIAL,
        AgentKind::Normal => Color::random_pastel(rng),
    });
    let shape = params.shape.unwrap_or_else(|| Shape::random(rng));
    let wander = Cooldown::new(rng.range(400.0, 2000.0)).with_elapsed(rng.range(0.0, 1200.0));
    let max_hp = params.health.unwrap_or_else(|| params.kind.max_hp());

    Agent {
        id,
        position: params.position,
        velocity: params.velocity,
        radius: params.radius.unwrap_or_else(|| params.kind.base_radius()),
        health: Health::new(max_hp),
        alive: true,
        kind: params.kind,
        weapon: loadout.weapon,
        fire: Cooldown::new(params.fire_interval.unwrap_or(loadout.fire_interval)),
        swing: Cooldown::new(params.swing_interval.unwrap_or(loadout.swing_interval)),
        wander,
        kills: 0,
        target: None,
        color,
        shape,
    }
}

/// Build a complete population for `config`.
///
/// Agent ids equal their index. Heroes take the first distinct picks in
/// [`HeroKind::ALL`] order; the special character is the next distinct
/// pick when any agent remains.
pub fn build_population(config: &SimConfig, rng: &mut dyn RandomSource) -> Vec<Agent> {
    let count = config.population as usize;
    let field = config.field;
    let margin_x = SPAWN_MARGIN.min(field.width / 2.0);
    let margin_y = SPAWN_MARGIN.min(field.height / 2.0);

    let placements: Vec<(Vec2, Vec2)> = (0..count)
        .map(|_| {
            let position = Vec2::new(
                rng.range(margin_x, field.width - margin_x),
                rng.range(margin_y, field.height - margin_y),
            );
            let velocity = Vec2::new(
                rng.range(-SPAWN_SPEED, SPAWN_SPEED),
                rng.range(-SPAWN_SPEED, SPAWN_SPEED),
            );
            (position, velocity)
        })
        .collect();

    let hero_count = usize::from(config.hero_count)
        .min(HeroKind::ALL.len())
        .min(count);
    let special_count = usize::from(count > hero_count);
    let picks = pick_distinct(count, hero_count + special_count, rng);
    let (heroes, special) = picks.split_at(hero_count);

    let agents: Vec<Agent> = placements
        .into_iter()
        .enumerate()
        .map(|(index, (position, velocity))| {
            let kind = if let Some(slot) = heroes.iter().position(|&h| h == index) {
                AgentKind::Hero(HeroKind::ALL[slot])
            } else if special.contains(&index) {
                AgentKind::SpecialCharacter
            } else {
                AgentKind::Normal
            };

            let weapon = match kind {
                AgentKind::Hero(_) => pick_weapon(&WeaponKind::MELEE, rng),
                AgentKind::SpecialCharacter => pick_weapon(&WeaponKind::RANGED, rng),
                AgentKind::Normal => {
                    if rng.chance(config.melee_fraction) {
                        pick_weapon(&WeaponKind::MELEE, rng)
                    } else {
                        pick_weapon(&WeaponKind::RANGED, rng)
                    }
                }
            };

            let params = AgentSpawnParams {
                position,
                velocity: initial_velocity(velocity, kind, weapon.role()),
                kind,
                weapon,
                ..Default::default()
            };
            spawn_agent(index as AgentId, params, rng)
        })
        .collect();

    tracing::debug!(
        population = agents.len(),
        heroes = hero_count,
        special = special_count,
        "Population built"
    );
    agents
}

fn pick_weapon(options: &[WeaponKind], rng: &mut dyn RandomSource) -> WeaponKind {
    options[rng.index(options.len())]
}

/// `k` distinct indices from `0..n`, in pick order.
///
/// Partial Fisher-Yates: exactly `k` draws, whatever the source returns.
fn pick_distinct(n: usize, k: usize, rng: &mut dyn RandomSource) -> Vec<usize> {
    let k = k.min(n);
    let mut pool: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = i + rng.index(n - i);
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool
}

/// Heroes keep their heading and move faster; ranged agents are slowed.
fn initial_velocity(velocity: Vec2, kind: AgentKind, role: CombatRole) -> Vec2 {
    let heading = velocity.angle();
    match (kind, role) {
        (AgentKind::Hero(_), _) => {
            let speed = velocity.length().max(HERO_MIN_SPEED) * HERO_SPEED_BONUS;
            Vec2::from_angle(heading, speed)
        }
        (_, CombatRole::Ranged) => velocity * RANGED_SPEED_SCALE,
        (_, CombatRole::Melee) => velocity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededSource;

    struct ConstantSource(f32);

    impl RandomSource for ConstantSource {
        fn next_unit(&mut self) -> f32 {
            self.0
        }
    }

    #[test]
    fn test_population_size_and_ids() {
        let mut rng = SeededSource::seeded(1);
        let config = SimConfig::default().with_population(50);
        let agents = build_population(&config, &mut rng);

        assert_eq!(agents.len(), 50);
        for (index, agent) in agents.iter().enumerate() {
            assert_eq!(agent.id as usize, index);
            assert!(agent.alive);
            assert_eq!(agent.kills, 0);
        }
    }

    #[test]
    fn test_two_distinct_heroes_and_one_special() {
        for seed in 0..20 {
            let mut rng = SeededSource::seeded(seed);
            let agents = build_population(&SimConfig::default().with_population(30), &mut rng);

            let supermen = agents
                .iter()
                .filter(|a| a.kind == AgentKind::Hero(HeroKind::Superman))
                .count();
            let batmen = agents
                .iter()
                .filter(|a| a.kind == AgentKind::Hero(HeroKind::Batman))
                .count();
            let specials = agents
                .iter()
                .filter(|a| a.kind == AgentKind::SpecialCharacter)
                .count();

            assert_eq!((supermen, batmen, specials), (1, 1, 1), "seed {seed}");
        }
    }

    #[test]
    fn test_pick_distinct_with_repeating_source() {
        let mut rng = ConstantSource(0.5);
        let picks = pick_distinct(5, 3, &mut rng);
        assert_eq!(picks.len(), 3);
        assert!(picks.iter().all(|&p| p < 5));
        assert_ne!(picks[0], picks[1]);
        assert_ne!(picks[1], picks[2]);
        assert_ne!(picks[0], picks[2]);
    }

    #[test]
    fn test_pick_distinct_takes_whole_range() {
        let mut rng = ConstantSource(0.99);
        let mut picks = pick_distinct(4, 9, &mut rng);
        picks.sort_unstable();
        assert_eq!(picks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_heroes_are_melee_with_hero_stats() {
        let mut rng = SeededSource::seeded(2);
        let agents = build_population(&SimConfig::default().with_population(20), &mut rng);

        for hero in agents.iter().filter(|a| a.is_hero()) {
            assert_eq!(hero.role(), CombatRole::Melee);
            assert_eq!(hero.health.current, 200);
            assert!((hero.radius - 12.0).abs() < f32::EPSILON);
            assert!(hero.speed() >= HERO_MIN_SPEED * HERO_SPEED_BONUS - 1e-4);
        }
    }

    #[test]
    fn test_normals_ranged_by_default() {
        let mut rng = SeededSource::seeded(3);
        let agents = build_population(&SimConfig::default().with_population(100), &mut rng);

        for agent in agents.iter().filter(|a| a.kind == AgentKind::Normal) {
            assert_eq!(agent.role(), CombatRole::Ranged);
            assert_eq!(agent.health.current, 100);
            assert!(agent.speed() <= SPAWN_SPEED * RANGED_SPEED_SCALE * 2.0_f32.sqrt() + 1e-4);
        }
    }

    #[test]
    fn test_melee_fraction_one_arms_all_normals_with_blades() {
        let mut rng = SeededSource::seeded(4);
        let config = SimConfig {
            melee_fraction: 1.0,
            ..SimConfig::default().with_population(40)
        };
        let agents = build_population(&config, &mut rng);
        assert!(agents
            .iter()
            .filter(|a| a.kind == AgentKind::Normal)
            .all(|a| a.role() == CombatRole::Melee));
    }

    #[test]
    fn test_spawn_inside_margins() {
        let mut rng = SeededSource::seeded(5);
        let config = SimConfig::default();
        let agents = build_population(&config, &mut rng);

        for agent in &agents {
            assert!(agent.position.x >= SPAWN_MARGIN && agent.position.x <= 1000.0 - SPAWN_MARGIN);
            assert!(agent.position.y >= SPAWN_MARGIN && agent.position.y <= 700.0 - SPAWN_MARGIN);
        }
    }

    #[test]
    fn test_small_populations() {
        let mut rng = SeededSource::seeded(6);
        assert!(build_population(&SimConfig::default().with_population(0), &mut rng).is_empty());

        let one = build_population(&SimConfig::default().with_population(1), &mut rng);
        assert_eq!(one.len(), 1);
        assert!(one[0].is_hero());

        let two = build_population(&SimConfig::default().with_population(2), &mut rng);
        assert!(two.iter().all(Agent::is_hero));

        let three = build_population(&SimConfig::default().with_population(3), &mut rng);
        assert_eq!(
            three
                .iter()
                .filter(|a| a.kind == AgentKind::SpecialCharacter)
                .count(),
            1
        );
    }

    #[test]
    fn test_no_heroes_when_disabled() {
        let mut rng = SeededSource::seeded(7);
        let agents = build_population(
            &SimConfig::default().with_population(10).with_heroes(0),
            &mut rng,
        );
        assert!(agents.iter().all(|a| !a.is_hero()));
        assert_eq!(
            agents
                .iter()
                .filter(|a| a.kind == AgentKind::SpecialCharacter)
                .count(),
            1
        );
    }

    #[test]
    fn test_spawn_agent_overrides() {
        let mut rng = SeededSource::seeded(8);
        let agent = spawn_agent(
            3,
            AgentSpawnParams {
                health: Some(15),
                radius: Some(5.0),
                damage: Some(99),
                fire_interval: Some(7.0),
                shape: Some(Shape::Star),
                ..Default::default()
            },
            &mut rng,
        );
        assert_eq!(agent.id, 3);
        assert_eq!(agent.health.current, 15);
        assert!((agent.radius - 5.0).abs() < f32::EPSILON);
        assert_eq!(agent.weapon.damage, 99);
        assert!((agent.fire.interval - 7.0).abs() < f32::EPSILON);
        assert_eq!(agent.shape, Shape::Star);
    }
}
