//! Headless battle runner for scripted control and CI verification.
//!
//! This crate drives a [`battle_core`] simulation without graphics. It can be
//! controlled via JSON commands on stdin, with battle state output on stdout.
//! This enables:
//!
//! - **Scripted control**: A controller can step, pause and inspect a match
//! - **Balance testing**: Many seeded matches run in parallel with metrics
//! - **CI verification**: Seeds are replayed to check determinism
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (step, frame, reset, etc.)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"step","count":60}' | cargo run -p battle_headless
//!
//! # Play one seeded match
//! cargo run -p battle_headless -- run --seed 3
//!
//! # Verify determinism
//! cargo run -p battle_headless -- verify --seed 42 --runs 5
//! ```

pub mod batch;
pub mod metrics;
pub mod protocol;
pub mod runner;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner, RunnerError};
