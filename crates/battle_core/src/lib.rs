//! # Battle Core
//!
//! Real-time battleground simulation engine.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO beyond loading a configuration file
//! - All randomness drawn from an injectable [`random::RandomSource`]
//!
//! This separation enables:
//! - Headless batch runs
//! - Seeded, reproducible matches
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`components`] - Agents, projectiles, particles and their parts
//! - [`population`] - Population construction
//! - [`systems`] - Behavior and movement
//! - [`combat`] - Weapons, damage and kill rules
//! - [`physics`] - Collision separation
//! - [`progression`] - Buffs, scoreboard and win condition
//! - [`simulation`] - Core simulation loop
//! - [`clock`] - Wall-clock to frame-unit conversion
//! - [`math`] - 2D vector utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod clock;
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod math;
pub mod physics;
pub mod population;
pub mod progression;
pub mod random;
pub mod simulation;
pub mod systems;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::FrameClock;
    pub use crate::combat::{DamageEvent, ExplosionEvent, KillCause, KillEvent};
    pub use crate::components::*;
    pub use crate::config::{FieldConfig, SimConfig, TimingConfig};
    pub use crate::error::{Result, SimError};
    pub use crate::math::{Rect, Vec2};
    pub use crate::population::AgentSpawnParams;
    pub use crate::progression::{Outcome, ScoreEntry, WinnerReport};
    pub use crate::random::{EntropySource, RandomSource, SeededSource};
    pub use crate::simulation::{BattleState, RunState, Simulation, Snapshot, StepEvents};
}
