//! Headless battleground runner.
//!
//! This binary runs the battle without graphics, controlled via JSON on stdin/stdout.
//! Designed for scripted control, balance batches and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p battle_headless
//!
//! # Play one seeded match and print its metrics
//! cargo run -p battle_headless -- run --seed 7 --population 200
//!
//! # Run batch balance test
//! cargo run -p battle_headless -- batch --count 1000 --output results/
//!
//! # Check that a seed replays identically
//! cargo run -p battle_headless -- verify --seed 42 --runs 5
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::PathBuf;

use battle_core::config::SimConfig;
use battle_core::simulation::Simulation;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use battle_headless::{
    batch::{run_batch, run_single_game, verify_determinism, BatchConfig},
    runner::{HeadlessConfig, HeadlessRunner},
};

#[derive(Parser)]
#[command(name = "battle_headless")]
#[command(about = "Headless battleground runner for scripted control and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every mode that builds a simulation.
#[derive(Args, Clone, Default)]
struct SimArgs {
    /// RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured population
    #[arg(short, long)]
    population: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a match with JSON commands on stdin (default)
    Interactive {
        #[command(flatten)]
        sim: SimArgs,

        /// Seed for a reproducible session (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Output state after every step
        #[arg(long)]
        auto_state: bool,
    },

    /// Play one match to completion and print its metrics as JSON
    Run {
        #[command(flatten)]
        sim: SimArgs,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Frame limit (0 = unlimited)
        #[arg(long, default_value = "20000")]
        max_frames: u64,

        /// Frame units per step
        #[arg(long, default_value = "1.0")]
        dt: f32,
    },

    /// Run batch of matches for balance testing
    Batch {
        #[command(flatten)]
        sim: SimArgs,

        /// Number of matches to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Frame limit per match (0 = unlimited)
        #[arg(long, default_value = "20000")]
        max_frames: u64,
    },

    /// Verify determinism by replaying one seed several times
    Verify {
        #[command(flatten)]
        sim: SimArgs,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of runs to compare
        #[arg(short, long, default_value = "3")]
        runs: u32,

        /// Frame limit per run
        #[arg(long, default_value = "5000")]
        max_frames: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Interactive {
            sim,
            seed,
            auto_state,
        }) => {
            cmd_interactive(&sim, seed, auto_state);
        }
        Some(Commands::Run {
            sim,
            seed,
            max_frames,
            dt,
        }) => {
            cmd_run(&sim, seed, max_frames, dt);
        }
        Some(Commands::Batch {
            sim,
            count,
            parallel,
            output,
            seed,
            max_frames,
        }) => {
            cmd_batch(&sim, count, parallel, output, seed, max_frames);
        }
        Some(Commands::Verify {
            sim,
            seed,
            runs,
            max_frames,
        }) => {
            cmd_verify(&sim, seed, runs, max_frames);
        }
        None => {
            // Default: interactive mode
            cmd_interactive(&SimArgs::default(), None, false);
        }
    }
}

/// Build the simulation config from a file and overrides, exiting on error.
fn load_sim_config(args: &SimArgs) -> SimConfig {
    let config = match &args.config {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to load config");
                eprintln!("FATAL: {e}");
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    match args.population {
        Some(population) => config.with_population(population),
        None => config,
    }
}

/// Drive a match from stdin
fn cmd_interactive(args: &SimArgs, seed: Option<u64>, auto_state: bool) {
    tracing::info!(seed = ?seed, "Starting interactive session");

    let config = load_sim_config(args);
    let sim = match seed {
        Some(seed) => Simulation::seeded(config, seed),
        None => Simulation::new(config),
    };
    let sim = match sim {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    let mut runner = HeadlessRunner::with_config(
        sim,
        HeadlessConfig {
            auto_state_output: auto_state,
            ..Default::default()
        },
    );

    let stdin = io::stdin();
    if let Err(e) = runner.run(stdin.lock(), io::stdout().lock()) {
        tracing::error!(error = %e, "Interactive session failed");
        std::process::exit(1);
    }
}

/// Play a single match and print its metrics
fn cmd_run(args: &SimArgs, seed: u64, max_frames: u64, dt: f32) {
    let config = load_sim_config(args);
    tracing::info!(seed, population = config.population, max_frames, "Running match");

    let metrics = match run_single_game(&config, seed, max_frames, dt) {
        Ok(metrics) => metrics,
        Err(e) => {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    match &metrics.winner {
        Some(winner) => eprintln!("{winner}"),
        None if metrics.draw => eprintln!("Draw after {} frames", metrics.duration_frames),
        None => eprintln!("No winner after {} frames", metrics.duration_frames),
    }

    match serde_json::to_string(&metrics) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("FATAL: Failed to serialize metrics: {e}");
            std::process::exit(1);
        }
    }
}

/// Run batch of matches for balance testing
fn cmd_batch(args: &SimArgs, count: u32, parallel: u32, output: PathBuf, seed: u64, max_frames: u64) {
    use std::time::Instant;

    let batch_start = Instant::now();
    let sim = load_sim_config(args);

    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);

    tracing::info!(
        count = count,
        parallel = parallel,
        seed = seed,
        population = sim.population,
        output = %output.display(),
        cpus_available = num_cpus,
        max_frames = max_frames,
        "Batch configuration"
    );

    // Ensure output directory exists
    if let Err(e) = std::fs::create_dir_all(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to create output directory");
        eprintln!(
            "FATAL: Cannot create output directory '{}': {}",
            output.display(),
            e
        );
        std::process::exit(1);
    }

    let config = BatchConfig {
        sim,
        game_count: count,
        parallel_games: parallel,
        output_dir: output.clone(),
        seed_start: seed,
        max_frames,
        dt: 1.0,
    };

    let results = run_batch(config);

    tracing::info!(
        games_completed = results.games.len(),
        games_failed = results.errors.len(),
        total_duration_secs = format!("{:.1}", batch_start.elapsed().as_secs_f64()),
        "Batch execution finished"
    );

    let results_path = match results.save_to_dir(&output) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(error = %e, path = %output.display(), "Failed to save results");
            eprintln!("FATAL: Failed to save results: {e}");
            std::process::exit(1);
        }
    };

    // Print summary
    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games failed: {}", results.errors.len());
    }
    let mut weapons: Vec<_> = summary.wins_by_weapon.iter().collect();
    weapons.sort();
    for (weapon, wins) in weapons {
        eprintln!("  {weapon:<10} {wins:>5} wins");
    }
    eprintln!("Hero wins:    {}", summary.hero_wins);
    eprintln!("Special wins: {}", summary.special_wins);
    eprintln!("Draws:        {}", summary.draws);
    eprintln!("Timeouts:     {}", summary.timeouts);
    eprintln!("Avg frames:   {:.0}", summary.avg_duration_frames);
    eprintln!("Avg winner kills: {:.1}", summary.avg_winner_kills);
    eprintln!("Results: {}", results_path.display());
}

/// Replay one seed and compare final state hashes
fn cmd_verify(args: &SimArgs, seed: u64, runs: u32, max_frames: u64) {
    let config = load_sim_config(args);
    tracing::info!(
        "Verifying determinism: seed {} ({} runs, {} agents)",
        seed,
        runs,
        config.population
    );

    if verify_determinism(&config, seed, runs, max_frames) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}
