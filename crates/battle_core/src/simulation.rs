//! Core simulation loop.
//!
//! This module contains the main [`Simulation`] struct that owns all
//! battle state and advances it one frame at a time.
//!
//! # Example
//!
//! ```
//! use battle_core::config::SimConfig;
//! use battle_core::simulation::Simulation;
//!
//! let config = SimConfig::default().with_population(20);
//! let mut sim = Simulation::seeded(config, 7).unwrap();
//!
//! while !sim.is_finished() && sim.frame() < 50 {
//!     sim.step(1.0);
//! }
//!
//! let snapshot = sim.snapshot();
//! assert!(snapshot.alive <= 20);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::combat::{
    hero_annihilation_system, hero_contact_system, melee_system, projectile_impact_system,
    DamageEvent, ExplosionEvent, KillEvent,
};
use crate::components::{Agent, AgentId, Particle, Projectile};
use crate::config::{FieldConfig, SimConfig};
use crate::error::{Result, SimError};
use crate::physics::separation_system;
use crate::population::{build_population, spawn_agent, AgentSpawnParams};
use crate::progression::{evaluate_outcome, scoreboard, Outcome, ScoreEntry, WinnerReport, SCOREBOARD_SIZE};
use crate::random::{EntropySource, RandomSource, SeededSource};
use crate::systems::{behavior_system, particle_system, projectile_motion_system};

/// Every mutable collection the engine owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleState {
    /// All agents, indexed by id. Dead agents stay in place.
    pub agents: Vec<Agent>,
    /// Projectiles in flight, in spawn order.
    pub projectiles: Vec<Projectile>,
    /// Visual debris.
    pub particles: Vec<Particle>,
    /// Field bounds.
    pub field: FieldConfig,
}

impl BattleState {
    /// Create an empty state for a field.
    #[must_use]
    pub fn new(field: FieldConfig) -> Self {
        Self {
            agents: Vec::new(),
            projectiles: Vec::new(),
            particles: Vec::new(),
            field,
        }
    }

    /// Number of living agents.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|agent| agent.alive).count()
    }
}

/// Events generated during a simulation step.
///
/// These can be used by front-ends to trigger sounds or effects, and by
/// tooling to collect metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepEvents {
    /// Damage dealt by projectiles and melee swings.
    pub damage: Vec<DamageEvent>,
    /// Agents that died this step.
    pub kills: Vec<KillEvent>,
    /// Hero annihilations.
    pub explosions: Vec<ExplosionEvent>,
    /// Projectiles spawned this step.
    pub shots_fired: u32,
}

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// Steps advance the simulation.
    Running,
    /// Steps are ignored until resumed.
    Paused,
    /// Terminal until reset.
    Finished {
        /// How the match ended.
        outcome: Outcome,
    },
}

/// Read-only view of the simulation for renderers and tooling.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    /// Frames stepped since the last reset.
    pub frame: u64,
    /// Lifecycle state.
    pub run_state: RunState,
    /// All agents, including dead ones.
    pub agents: &'a [Agent],
    /// Projectiles in flight.
    pub projectiles: &'a [Projectile],
    /// Visual debris.
    pub particles: &'a [Particle],
    /// Population size.
    pub population: usize,
    /// Living agents.
    pub alive: usize,
    /// Projectiles in flight.
    pub projectile_count: usize,
    /// Top agents by kills.
    pub scoreboard: Vec<ScoreEntry>,
}

/// The battle simulation.
///
/// Owns all state and advances it in a fixed order each step.
///
/// # System Execution Order
///
/// 1. **Behavior** - Target selection, wandering, movement and firing
/// 2. **Projectiles & particles** - Free motion
/// 3. **Projectile impact** - Damage from projectiles
/// 4. **Hero annihilation** - Touching heroes destroy each other
/// 5. **Hero contact** - Heroes kill touching non-heroes
/// 6. **Melee** - Swings at agents within reach
/// 7. **Separation** - Overlapping agents are pushed apart
/// 8. **Win check** - Finish when at most one agent remains
pub struct Simulation {
    config: SimConfig,
    state: BattleState,
    rng: Box<dyn RandomSource + Send>,
    frame: u64,
    run_state: RunState,
    events: StepEvents,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.frame)
            .field("run_state", &self.run_state)
            .field("population", &self.state.agents.len())
            .field("alive", &self.state.alive_count())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Create a simulation seeded from operating-system entropy.
    pub fn new(config: SimConfig) -> Result<Self> {
        Self::with_source(config, Box::new(EntropySource::from_entropy()))
    }

    /// Create a reproducible simulation.
    pub fn seeded(config: SimConfig, seed: u64) -> Result<Self> {
        Self::with_source(config, Box::new(SeededSource::seeded(seed)))
    }

    /// Create a simulation drawing all randomness from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if the configuration is out of range.
    pub fn with_source(config: SimConfig, mut rng: Box<dyn RandomSource + Send>) -> Result<Self> {
        config.validate()?;

        let mut state = BattleState::new(config.field);
        state.agents = build_population(&config, rng.as_mut());

        tracing::info!(
            population = state.agents.len(),
            width = config.field.width,
            height = config.field.height,
            "Simulation created"
        );

        Ok(Self {
            config,
            state,
            rng,
            frame: 0,
            run_state: RunState::Running,
            events: StepEvents::default(),
        })
    }

    /// Advance the simulation by `dt` frame units.
    ///
    /// Does nothing while paused or finished. Non-finite or negative
    /// deltas are treated as zero.
    pub fn step(&mut self, dt: f32) {
        if self.run_state != RunState::Running {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let mut events = StepEvents::default();
        let rng: &mut dyn RandomSource = self.rng.as_mut();

        // 1. Behavior & movement
        behavior_system(&mut self.state, dt, rng, &mut events);

        // 2. Free motion
        projectile_motion_system(&mut self.state, dt);
        particle_system(&mut self.state.particles, dt);

        // 3-6. Combat resolution
        projectile_impact_system(&mut self.state, rng, &mut events);
        hero_annihilation_system(&mut self.state, rng, &mut events);
        hero_contact_system(&mut self.state, rng, &mut events);
        melee_system(&mut self.state, rng, &mut events);

        // 7. Separation
        separation_system(&mut self.state.agents, rng);

        self.frame += 1;
        self.events = events;

        // 8. Win check
        if let Some(outcome) = evaluate_outcome(&self.state.agents) {
            match &outcome {
                Outcome::Winner(report) => {
                    tracing::info!(frame = self.frame, winner = report.id, kills = report.kills, "Match won");
                }
                Outcome::Draw => tracing::info!(frame = self.frame, "Match drawn"),
            }
            self.run_state = RunState::Finished { outcome };
        }

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(frame = self.frame, state_hash = hash, "Simulation state hash");
        }
    }

    /// Rebuild the population from scratch with `population` agents.
    ///
    /// Valid from any state. Clears projectiles, particles and events and
    /// returns to running.
    pub fn reset(&mut self, population: u32) {
        self.config.population = population;
        self.state = BattleState::new(self.config.field);
        self.state.agents = build_population(&self.config, self.rng.as_mut());
        self.frame = 0;
        self.run_state = RunState::Running;
        self.events = StepEvents::default();
        tracing::info!(population, "Simulation reset");
    }

    /// Append an agent built from `params` and return its id.
    pub fn spawn_agent(&mut self, params: AgentSpawnParams) -> AgentId {
        let id = self.state.agents.len() as AgentId;
        let agent = spawn_agent(id, params, self.rng.as_mut());
        self.state.agents.push(agent);
        id
    }

    /// Read-only view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            frame: self.frame,
            run_state: self.run_state,
            agents: &self.state.agents,
            projectiles: &self.state.projectiles,
            particles: &self.state.particles,
            population: self.state.agents.len(),
            alive: self.state.alive_count(),
            projectile_count: self.state.projectiles.len(),
            scoreboard: self.scoreboard(),
        }
    }

    /// Top agents by kills.
    #[must_use]
    pub fn scoreboard(&self) -> Vec<ScoreEntry> {
        scoreboard(&self.state.agents, SCOREBOARD_SIZE)
    }

    /// Stop stepping. Ignored once finished.
    pub fn pause(&mut self) {
        if self.run_state == RunState::Running {
            self.run_state = RunState::Paused;
        }
    }

    /// Resume stepping after a pause.
    pub fn resume(&mut self) {
        if self.run_state == RunState::Paused {
            self.run_state = RunState::Running;
        }
    }

    /// Check if the match has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.run_state, RunState::Finished { .. })
    }

    /// How the match ended, once finished.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        match self.run_state {
            RunState::Finished { outcome } => Some(outcome),
            RunState::Running | RunState::Paused => None,
        }
    }

    /// The sole survivor, once finished. `None` for a draw.
    #[must_use]
    pub fn winner(&self) -> Option<WinnerReport> {
        self.outcome().and_then(|outcome| outcome.winner().copied())
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Frames stepped since the last reset.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Events from the most recent step.
    #[must_use]
    pub fn last_events(&self) -> &StepEvents {
        &self.events
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Full battle state.
    #[must_use]
    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// Look up an agent.
    pub fn agent(&self, id: AgentId) -> Result<&Agent> {
        self.state
            .agents
            .get(id as usize)
            .ok_or(SimError::AgentNotFound(id))
    }

    /// Look up an agent mutably, for test setups and scripted scenarios.
    pub fn agent_mut(&mut self, id: AgentId) -> Result<&mut Agent> {
        self.state
            .agents
            .get_mut(id as usize)
            .ok_or(SimError::AgentNotFound(id))
    }

    /// Compute a hash of the simulation-relevant state.
    ///
    /// Particles are visual only and contribute just their count.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.frame.hash(&mut hasher);
        self.state.agents.len().hash(&mut hasher);

        for agent in &self.state.agents {
            agent.id.hash(&mut hasher);
            agent.alive.hash(&mut hasher);
            agent.position.x.to_bits().hash(&mut hasher);
            agent.position.y.to_bits().hash(&mut hasher);
            agent.velocity.x.to_bits().hash(&mut hasher);
            agent.velocity.y.to_bits().hash(&mut hasher);
            agent.radius.to_bits().hash(&mut hasher);
            agent.health.current.hash(&mut hasher);
            agent.kills.hash(&mut hasher);
            agent.kind.hash(&mut hasher);
            agent.weapon.kind.hash(&mut hasher);
        }

        self.state.projectiles.len().hash(&mut hasher);
        for projectile in &self.state.projectiles {
            projectile.owner.hash(&mut hasher);
            projectile.position.x.to_bits().hash(&mut hasher);
            projectile.position.y.to_bits().hash(&mut hasher);
            projectile.life.hash(&mut hasher);
            projectile.damage.hash(&mut hasher);
        }

        self.state.particles.len().hash(&mut hasher);
        hasher.finish()
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        let dead = self.state.agents.iter().filter(|a| !a.alive).count();
        let kills: usize = self.state.agents.iter().map(|a| a.kills as usize).sum();
        if kills > dead {
            tracing::error!(kills, dead, "More kills credited than agents dead");
        }
        for agent in self.state.agents.iter().filter(|a| a.alive) {
            if agent.health.is_depleted() {
                tracing::error!(id = agent.id, hp = agent.health.current, "Living agent with no hit points");
            }
        }
    }
}
