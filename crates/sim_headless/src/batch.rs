//! Parallel batch runner.
//!
//! Runs many iterations of one character across a rayon pool. Iteration `i`
//! always uses a `ChaCha8Rng` seeded with `seed_start + i`, so a batch gives
//! the same numbers no matter how many workers run it or in which order they
//! finish.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sim_core::character::{CharacterSpec, Simulator};
use sim_core::error::SimError;
use sim_core::result::SimulationResult;
use thiserror::Error;
use tracing::{debug, info};

use crate::metrics::BatchSummary;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of iterations to run
    pub iterations: u32,
    /// Seed of the first iteration
    pub seed_start: u64,
    /// Worker threads (0 = rayon default)
    pub workers: usize,
    /// Output directory for results
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            iterations: 1_000,
            seed_start: 0,
            workers: 0,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Create config for a number of iterations
    #[must_use]
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            ..Default::default()
        }
    }

    /// Config taken from a character's own iteration count and seed
    #[must_use]
    pub fn for_character(spec: &CharacterSpec) -> Self {
        Self {
            iterations: spec.iterations,
            seed_start: spec.seed.unwrap_or(0),
            ..Default::default()
        }
    }

    /// Set output directory
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set worker count
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Seed used by iteration `index`
    #[must_use]
    pub const fn seed_for(&self, index: u32) -> u64 {
        self.seed_start.wrapping_add(index as u64)
    }
}

/// Errors that stop a batch before it runs
#[derive(Debug, Error)]
pub enum BatchError {
    /// Character could not be configured
    #[error("Invalid character: {0}")]
    Config(#[from] SimError),

    /// Worker pool could not be built
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// One iteration's headline numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// Iteration index within the batch
    pub index: u32,
    /// Seed used
    pub seed: u64,
    /// Total damage or healing
    pub total_output: u64,
    /// Output per second
    pub output_per_second: f64,
    /// Total overheal
    pub total_overheal: u64,
}

/// Results from a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Character simulated
    pub character: CharacterSpec,
    /// Per-iteration records, in index order
    pub iterations: Vec<IterationRecord>,
    /// Aggregate summary
    pub summary: BatchSummary,
}

impl BatchResults {
    /// Save results to JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Default results file inside the configured output directory
    #[must_use]
    pub fn default_path(&self) -> PathBuf {
        let stem: String = self
            .character
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        self.config.output_dir.join(format!("{stem}_batch.json"))
    }
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total iterations
    pub total: usize,
    completed: AtomicUsize,
    start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed iteration, returning the new count
    pub fn record_completion(&self) -> usize {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current completion count
    #[must_use]
    pub fn current(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.current() as f64 / self.total.max(1) as f64 * 100.0
    }

    /// Get estimated time remaining
    #[must_use]
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::ZERO;
        }
        let per_iteration = self.start_time.elapsed().as_secs_f64() / completed as f64;
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_iteration * remaining as f64)
    }
}

fn run_iteration(sim: &Simulator, seed: u64) -> SimulationResult {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    sim.simulate(&mut rng)
}

fn run_iterations(
    sim: &Simulator,
    config: &BatchConfig,
    progress: &BatchProgress,
) -> Vec<SimulationResult> {
    let step = (progress.total / 10).max(1);
    (0..config.iterations)
        .into_par_iter()
        .map(|i| {
            let result = run_iteration(sim, config.seed_for(i));
            let completed = progress.record_completion();
            if completed % step == 0 {
                debug!(
                    completed,
                    total = progress.total,
                    percent = progress.percentage(),
                    eta_secs = progress.eta().as_secs_f64(),
                    "Batch progress"
                );
            }
            result
        })
        .collect()
}

/// Run a batch of iterations for one character
///
/// # Errors
///
/// Returns an error if the character is invalid or the worker pool cannot be
/// built.
pub fn run_batch(spec: &CharacterSpec, config: BatchConfig) -> Result<BatchResults, BatchError> {
    let sim = Simulator::from_spec(spec)?;
    let start = Instant::now();
    let progress = BatchProgress::new(config.iterations as usize);

    info!(
        character = %spec.name,
        class = %spec.class,
        iterations = config.iterations,
        seed_start = config.seed_start,
        workers = config.workers,
        "Starting batch run"
    );

    let results = if config.workers > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()?;
        pool.install(|| run_iterations(&sim, &config, &progress))
    } else {
        run_iterations(&sim, &config, &progress)
    };

    let execution_secs = start.elapsed().as_secs_f64();
    let summary =
        BatchSummary::from_results(spec.name.clone(), spec.class, &results, execution_secs);

    info!(
        iterations = results.len(),
        mean = summary.mean_output_per_second(),
        secs = execution_secs,
        per_sec = summary.throughput(),
        "Batch complete"
    );

    let iterations = results
        .iter()
        .zip(0u32..)
        .map(|(r, index)| IterationRecord {
            index,
            seed: config.seed_for(index),
            total_output: r.total_output,
            output_per_second: r.output_per_second,
            total_overheal: r.total_overheal,
        })
        .collect();

    Ok(BatchResults {
        config,
        character: spec.clone(),
        iterations,
        summary,
    })
}

/// Verify determinism by running the same seed several times
///
/// # Errors
///
/// Returns an error if the character is invalid or a result cannot be
/// encoded.
pub fn verify_determinism(spec: &CharacterSpec, seed: u64, runs: u32) -> Result<bool, BatchError> {
    let sim = Simulator::from_spec(spec)?;
    let fingerprints = (0..runs)
        .into_par_iter()
        .map(|_| run_iteration(&sim, seed).fingerprint())
        .collect::<Result<Vec<u64>, SimError>>()?;
    Ok(fingerprints.windows(2).all(|w| w[0] == w[1]))
}
