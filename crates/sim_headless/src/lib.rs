//! Headless simulation runner for build comparison and CI.
//!
//! This crate wraps the deterministic engine in `sim_core` with everything
//! that touches the outside world:
//!
//! - **Character files**: RON character definitions loaded from disk
//! - **Batches**: many seeded iterations spread over a rayon pool
//! - **Summaries**: per-ability shares, outcome rates and timing as JSON
//! - **Playback**: one iteration replayed at wall-clock speed
//!
//! # Example
//!
//! ```bash
//! # One iteration, JSON result on stdout
//! cargo run -p sim_headless -- run --character characters/combat_rogue.ron
//!
//! # 10k iterations in parallel, summary saved under results/
//! cargo run -p sim_headless -- batch --character characters/fire_mage.ron --count 10000
//!
//! # Watch one fight at four times real speed
//! cargo run -p sim_headless -- playback --character characters/resto_shaman.ron --speed 4
//! ```

pub mod batch;
pub mod character_loader;
pub mod metrics;
pub mod playback;

pub use batch::{
    run_batch, verify_determinism, BatchConfig, BatchError, BatchProgress, BatchResults,
    IterationRecord,
};
pub use character_loader::{
    load_character, load_characters_from_dir, parse_character, CharacterFileError,
};
pub use metrics::{AbilitySummary, BatchSummary};
pub use playback::{play_back, playback_lines, PlaybackConfig, PlaybackFormat, PlaybackLine};
