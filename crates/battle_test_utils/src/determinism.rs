//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A seeded battle must replay exactly. Sources of non-determinism include:
//!
//! - **Unseeded randomness**: every random draw goes through the
//!   simulation's injected [`RandomSource`](battle_core::random::RandomSource).
//!
//! - **Iteration order**: agents are always visited in ascending id order
//!   and projectiles in spawn order.
//!
//! - **Thread scheduling**: each simulation is single-threaded; parallel
//!   runs must not share state.
//!
//! Floating-point results are reproducible on one machine and build,
//! which is what these checks cover.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use battle_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of frames simulated.
    pub frames: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Frames: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.frames,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `frames` - Number of frames to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one frame
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    frames: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..frames {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        frames,
    }
}

/// Run two identically configured simulations and compare final hashes.
///
/// # Example
///
/// ```
/// use battle_test_utils::determinism::verify_simulation_determinism;
/// use battle_test_utils::fixtures::seeded_simulation;
///
/// assert!(verify_simulation_determinism(|| seeded_simulation(30, 1), 100, 1.0));
/// ```
pub fn verify_simulation_determinism<F>(setup_fn: F, frames: u64, dt: f32) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(2, frames, &setup_fn, |sim| sim.step(dt), Simulation::state_hash)
        .is_deterministic
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of frames each simulation ran.
    pub frames: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Frames: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.frames,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// Catches hidden shared state that only shows up when simulations run
/// side by side.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(
    setup_fn: F,
    num_sims: usize,
    frames: u64,
    dt: f32,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..frames {
                        sim.step(dt);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        frames,
        num_sims,
    }
}

/// Compare two simulation runs frame by frame, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match, `Some(frame)` if they diverge at that frame.
pub fn find_first_divergence<F>(setup_fn: F, frames: u64, dt: f32) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for frame in 1..=frames {
        sim1.step(dt);
        sim2.step(dt);

        if sim1.state_hash() != sim2.state_hash() {
            tracing::warn!(frame, "Simulations diverged");
            return Some(frame);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use battle_core::components::WeaponKind;
    use battle_core::math::Vec2;
    use battle_core::population::AgentSpawnParams;
    use proptest::prelude::*;

    /// A position inside the default 1000x700 field.
    pub fn arb_position() -> impl Strategy<Value = Vec2> {
        (10.0f32..990.0, 10.0f32..690.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// A small velocity.
    pub fn arb_velocity() -> impl Strategy<Value = Vec2> {
        (-2.0f32..2.0, -2.0f32..2.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Any weapon archetype.
    pub fn arb_weapon() -> impl Strategy<Value = WeaponKind> {
        prop_oneof![
            Just(WeaponKind::Gun),
            Just(WeaponKind::Shotgun),
            Just(WeaponKind::Minigun),
            Just(WeaponKind::Sword),
            Just(WeaponKind::Axe),
        ]
    }

    /// A frame delta in the range produced by the frame clock at speed 1.
    pub fn arb_dt() -> impl Strategy<Value = f32> {
        0.1f32..2.5
    }

    /// Spawn parameters for a normal agent.
    pub fn arb_spawn_params() -> impl Strategy<Value = AgentSpawnParams> {
        (arb_position(), arb_velocity(), arb_weapon()).prop_map(|(position, velocity, weapon)| {
            AgentSpawnParams {
                position,
                velocity,
                weapon,
                ..Default::default()
            }
        })
    }

    /// Between one and `max_agents` spawn parameters.
    pub fn arb_agent_list(max_agents: usize) -> impl Strategy<Value = Vec<AgentSpawnParams>> {
        prop::collection::vec(arb_spawn_params(), 1..=max_agents)
    }
}
