//! Batch match runner for balance testing.
//!
//! Runs many seeded matches in parallel using rayon to collect balance
//! metrics across weapons and special agents efficiently.

use crate::metrics::{BatchSummary, GameMetrics, MetricsCollector};
use battle_core::config::SimConfig;
use battle_core::simulation::Simulation;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// File name written into the output directory by [`BatchResults::save_to_dir`].
pub const RESULTS_FILE: &str = "batch_results.json";

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Simulation settings shared by every match
    pub sim: SimConfig,
    /// Number of matches to run
    pub game_count: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed for deterministic runs
    pub seed_start: u64,
    /// Maximum frames per match (0 = unlimited)
    pub max_frames: u64,
    /// Frame units advanced per step
    pub dt: f32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            game_count: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_frames: 20_000,
            dt: 1.0,
        }
    }
}

impl BatchConfig {
    /// Create config for `game_count` matches of `sim`
    pub fn new(sim: SimConfig, game_count: u32) -> Self {
        Self {
            sim,
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set frame limit
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = max_frames;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match metrics
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Save results as [`RESULTS_FILE`] inside `dir` and return the path.
    pub fn save_to_dir(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(RESULTS_FILE);
        self.save(&path)?;
        Ok(path)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total matches
    pub total: u32,
    completed: AtomicU32,
    decided: AtomicU32,
    start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            decided: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed match
    pub fn record_completion(&self, had_winner: bool) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if had_winner {
            self.decided.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Matches that ended with a single survivor
    pub fn decided(&self) -> u32 {
        self.decided.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        self.current() as f64 / self.total.max(1) as f64 * 100.0
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.start_time.elapsed();
        let per_game = elapsed.as_secs_f64() / completed as f64;
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_game * remaining as f64)
    }

    /// Log progress
    pub fn display(&self) {
        let eta = self.eta();
        info!(
            completed = self.current(),
            total = self.total,
            decided = self.decided(),
            "Batch progress {:.1}% (ETA {}m {}s)",
            self.percentage(),
            eta.as_secs() / 60,
            eta.as_secs() % 60
        );
    }
}

/// Play one seeded match to completion or the frame limit.
pub fn run_single_game(
    sim_config: &SimConfig,
    seed: u64,
    max_frames: u64,
    dt: f32,
) -> Result<GameMetrics, String> {
    let mut sim = Simulation::seeded(sim_config.clone(), seed).map_err(|e| e.to_string())?;
    let mut collector = MetricsCollector::new(&format!("game_{seed}"), seed, sim_config.population);

    while !sim.is_finished() && (max_frames == 0 || sim.frame() < max_frames) {
        sim.step(dt);
        collector.set_frame(sim.frame());
        let agents = &sim.state().agents;
        collector.on_step(sim.last_events(), |id| {
            agents.get(id as usize).map(|agent| agent.kind)
        });
    }

    Ok(collector.finalize(sim.outcome(), sim.state_hash()))
}

/// Run a batch of matches
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let progress = BatchProgress::new(config.game_count);

    info!(
        games = config.game_count,
        population = config.sim.population,
        "Starting batch run"
    );

    // Configure thread pool if specified
    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<GameMetrics, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));

            match run_single_game(&config.sim, seed, config.max_frames, config.dt) {
                Ok(metrics) => {
                    progress.record_completion(metrics.winner.is_some());

                    let completed = progress.current();
                    if completed % 10 == 0 {
                        debug!("Progress: {}/{}", completed, config.game_count);
                    }
                    if completed % 100 == 0 {
                        progress.display();
                    }

                    Ok(metrics)
                }
                Err(e) => {
                    warn!("Game {} failed: {}", i, e);
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message: e,
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by running the same seed multiple times.
///
/// Returns `false` if any run fails or any final state hash differs.
pub fn verify_determinism(sim_config: &SimConfig, seed: u64, runs: u32, max_frames: u64) -> bool {
    let results: Result<Vec<GameMetrics>, String> = (0..runs.max(1))
        .map(|_| run_single_game(sim_config, seed, max_frames, 1.0))
        .collect();

    let Ok(results) = results else {
        return false;
    };

    let first = &results[0];
    results.iter().all(|r| {
        r.final_state_hash == first.final_state_hash
            && r.duration_frames == first.duration_frames
            && r.winner == first.winner
    })
}
