//! Test fixtures and helpers.
//!
//! Pre-built simulations, spawn parameters and a scripted random source
//! for consistent testing.

use battle_core::components::{AgentKind, HeroKind, WeaponKind};
use battle_core::config::SimConfig;
use battle_core::math::Vec2;
use battle_core::population::AgentSpawnParams;
use battle_core::random::RandomSource;
use battle_core::simulation::Simulation;

/// Largest sample a [`RandomSource`] may return.
const MAX_UNIT: f32 = 1.0 - f32::EPSILON;

/// A random source that replays a fixed list of samples in a loop.
///
/// With the single sample `0.5`, every symmetric range such as velocity
/// jitter or aim noise evaluates to zero, which makes movement exact.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    samples: Vec<f32>,
    cursor: usize,
}

impl ScriptedSource {
    /// Replay `samples` in order, wrapping around. An empty list yields `0.5`.
    #[must_use]
    pub fn new(samples: impl Into<Vec<f32>>) -> Self {
        Self {
            samples: samples.into(),
            cursor: 0,
        }
    }

    /// Always return `value`.
    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples drawn so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f32 {
        let sample = if self.samples.is_empty() {
            0.5
        } else {
            self.samples[self.cursor % self.samples.len()]
        };
        self.cursor += 1;
        sample.clamp(0.0, MAX_UNIT)
    }
}

/// Empty simulation on the default field driven by a constant `0.5` source.
///
/// Spawned agents keep their velocity exactly (no jitter) and never change
/// heading for hundreds of frames, so tests can place them precisely.
#[must_use]
pub fn scripted_simulation() -> Simulation {
    scripted_simulation_with(SimConfig::default())
}

/// Like [`scripted_simulation`] with a custom configuration.
///
/// The configured population is ignored; the simulation starts empty.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn scripted_simulation_with(config: SimConfig) -> Simulation {
    let mut sim = Simulation::with_source(
        config.with_population(0),
        Box::new(ScriptedSource::constant(0.5)),
    )
    .expect("fixture config must be valid");
    sim.reset(0);
    sim
}

/// Seeded simulation with a default-sized field and `population` agents.
///
/// # Panics
///
/// Panics if the default configuration is rejected.
#[must_use]
pub fn seeded_simulation(population: u32, seed: u64) -> Simulation {
    Simulation::seeded(SimConfig::default().with_population(population), seed)
        .expect("default config must be valid")
}

/// A stationary normal gunner.
#[must_use]
pub fn gunner_at(x: f32, y: f32) -> AgentSpawnParams {
    AgentSpawnParams {
        position: Vec2::new(x, y),
        weapon: WeaponKind::Gun,
        ..Default::default()
    }
}

/// A stationary normal swordsman.
#[must_use]
pub fn swordsman_at(x: f32, y: f32) -> AgentSpawnParams {
    AgentSpawnParams {
        position: Vec2::new(x, y),
        weapon: WeaponKind::Sword,
        ..Default::default()
    }
}

/// A stationary hero.
#[must_use]
pub fn hero_at(kind: HeroKind, x: f32, y: f32) -> AgentSpawnParams {
    AgentSpawnParams {
        position: Vec2::new(x, y),
        kind: AgentKind::Hero(kind),
        weapon: WeaponKind::Sword,
        ..Default::default()
    }
}

/// The stationary special character.
#[must_use]
pub fn special_at(x: f32, y: f32) -> AgentSpawnParams {
    AgentSpawnParams {
        position: Vec2::new(x, y),
        kind: AgentKind::SpecialCharacter,
        weapon: WeaponKind::Gun,
        ..Default::default()
    }
}

/// Run `sim` until it finishes or `max_frames` have been stepped.
///
/// Returns the number of frames stepped.
pub fn run_to_completion(sim: &mut Simulation, dt: f32, max_frames: u64) -> u64 {
    let start = sim.frame();
    while !sim.is_finished() && sim.frame() - start < max_frames {
        sim.step(dt);
    }
    sim.frame() - start
}
