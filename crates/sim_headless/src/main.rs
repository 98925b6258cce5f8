//! Headless combat simulator.
//!
//! Loads a RON character file and runs it through the engine without any UI.
//! Results go to stdout (or a file), logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # One iteration, JSON result on stdout
//! cargo run -p sim_headless -- run --character characters/combat_rogue.ron --seed 7
//!
//! # Parallel batch, summary saved to results/
//! cargo run -p sim_headless -- batch --character characters/fire_mage.ron -n 10000 -o results/
//!
//! # Replay one iteration at twice real speed
//! cargo run -p sim_headless -- playback --character characters/resto_shaman.ron --speed 2
//!
//! # Check that a seed replays bit-for-bit
//! cargo run -p sim_headless -- verify --character characters/frost_mage.ron --seed 12345
//! ```
//!
//! `RUST_LOG` controls log output; `--verbose` forces `debug`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sim_core::character::{CharacterSpec, Simulator};
use sim_core::error::SimError;
use sim_headless::{
    batch::{run_batch, verify_determinism, BatchConfig, BatchError},
    character_loader::{load_character, CharacterFileError},
    playback::{play_back, PlaybackConfig, PlaybackFormat},
};

#[derive(Parser)]
#[command(name = "sim_headless")]
#[command(about = "Headless combat simulator for comparing character builds")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single iteration and print the result as JSON
    Run {
        /// Character file to load
        #[arg(short, long)]
        character: PathBuf,

        /// Seed (defaults to the character's seed, then 0)
        #[arg(long)]
        seed: Option<u64>,

        /// Override the fight length in seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run many iterations in parallel and summarise them
    Batch {
        /// Character file to load
        #[arg(short, long)]
        character: PathBuf,

        /// Number of iterations (defaults to the character's own count)
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        workers: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// First seed (defaults to the character's seed, then 0)
        #[arg(long)]
        seed: Option<u64>,

        /// Override the fight length in seconds
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Replay one iteration paced against the wall clock
    Playback {
        /// Character file to load
        #[arg(short, long)]
        character: PathBuf,

        /// Seed (defaults to the character's seed, then 0)
        #[arg(long)]
        seed: Option<u64>,

        /// Simulated seconds per real second (0 = no pacing)
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Emit JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Character file to load
        #[arg(short, long)]
        character: PathBuf,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Character(#[from] CharacterFileError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Seed {seed} produced {runs} differing results")]
    NonDeterministic { seed: u64, runs: u32 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries results, so logs go to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let outcome = match cli.command {
        Commands::Run {
            character,
            seed,
            duration,
            output,
        } => cmd_run(&character, seed, duration, output),
        Commands::Batch {
            character,
            count,
            workers,
            output,
            seed,
            duration,
        } => cmd_batch(&character, count, workers, output, seed, duration),
        Commands::Playback {
            character,
            seed,
            speed,
            json,
        } => cmd_playback(&character, seed, speed, json),
        Commands::Verify {
            character,
            seed,
            runs,
        } => cmd_verify(&character, seed, runs),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn load(path: &Path, duration: Option<f64>) -> Result<CharacterSpec, CliError> {
    let spec = load_character(path)?;
    Ok(match duration {
        Some(secs) => spec.with_duration(secs),
        None => spec,
    })
}

fn resolve_seed(spec: &CharacterSpec, seed: Option<u64>) -> u64 {
    seed.or(spec.seed).unwrap_or(0)
}

/// Run a single iteration
fn cmd_run(
    character: &Path,
    seed: Option<u64>,
    duration: Option<f64>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let spec = load(character, duration)?;
    let seed = resolve_seed(&spec, seed);
    let sim = Simulator::from_spec(&spec)?;

    let result = sim.simulate(&mut ChaCha8Rng::seed_from_u64(seed));
    tracing::info!(
        character = %spec.name,
        seed,
        total = result.total_output,
        per_second = result.output_per_second,
        events = result.events.len(),
        "Iteration complete"
    );

    let json = serde_json::to_string_pretty(&result)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, json)?;
            tracing::info!(path = %path.display(), "Result saved");
        }
        None => writeln!(io::stdout().lock(), "{json}")?,
    }
    Ok(())
}

/// Run a batch of iterations
fn cmd_batch(
    character: &Path,
    count: Option<u32>,
    workers: usize,
    output: PathBuf,
    seed: Option<u64>,
    duration: Option<f64>,
) -> Result<(), CliError> {
    let spec = load(character, duration)?;

    let num_cpus = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    let mut config = BatchConfig::for_character(&spec)
        .with_output(output)
        .with_workers(workers)
        .with_seed(resolve_seed(&spec, seed));
    if let Some(count) = count {
        config.iterations = count;
    }

    tracing::info!(
        character = %spec.name,
        iterations = config.iterations,
        workers,
        cpus_available = num_cpus,
        output = %config.output_dir.display(),
        "Batch configuration"
    );

    let results = run_batch(&spec, config)?;
    let path = results.default_path();
    results.save(&path)?;

    eprintln!("\n{}", "=".repeat(50));
    eprint!("{}", results.summary.report());
    eprintln!("{}", "=".repeat(50));
    eprintln!("Results saved to: {}", path.display());
    Ok(())
}

/// Replay one iteration
fn cmd_playback(
    character: &Path,
    seed: Option<u64>,
    speed: f64,
    json: bool,
) -> Result<(), CliError> {
    let spec = load(character, None)?;
    let seed = resolve_seed(&spec, seed);
    let sim = Simulator::from_spec(&spec)?;
    let result = sim.simulate(&mut ChaCha8Rng::seed_from_u64(seed));

    let format = if json {
        PlaybackFormat::Json
    } else {
        PlaybackFormat::Text
    };
    let config = PlaybackConfig::default().with_speed(speed).with_format(format);
    play_back(&result, &config, &mut io::stdout().lock())?;
    Ok(())
}

/// Verify determinism
fn cmd_verify(character: &Path, seed: u64, runs: u32) -> Result<(), CliError> {
    let spec = load(character, None)?;
    tracing::info!(character = %spec.name, seed, runs, "Verifying determinism");

    if verify_determinism(&spec, seed, runs)? {
        eprintln!("Deterministic: {runs} runs of seed {seed} agree");
        Ok(())
    } else {
        Err(CliError::NonDeterministic { seed, runs })
    }
}
