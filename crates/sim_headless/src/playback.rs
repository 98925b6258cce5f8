//! Wall-clock playback of a finished iteration.
//!
//! The engine always runs as fast as it can. Playback takes an event log that
//! has already been computed and writes it out paced against real time, so a
//! 60 second fight at speed 4 takes 15 seconds to scroll past.

use std::fmt;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sim_core::abilities::Ability;
use sim_core::attack_table::OutcomeKind;
use sim_core::clock::{ms_to_secs, Millis};
use sim_core::result::SimulationResult;

/// How playback lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackFormat {
    /// One aligned text line per event.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Playback settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Simulated seconds per wall-clock second. Zero or less disables pacing.
    pub speed: f64,
    /// Output format.
    pub format: PlaybackFormat,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            format: PlaybackFormat::Text,
        }
    }
}

impl PlaybackConfig {
    /// Unpaced playback.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            speed: 0.0,
            format: PlaybackFormat::Text,
        }
    }

    /// Builder method to set the speed factor.
    #[must_use]
    pub const fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Builder method to set the format.
    #[must_use]
    pub const fn with_format(mut self, format: PlaybackFormat) -> Self {
        self.format = format;
        self
    }

    /// Whether playback waits for the wall clock.
    #[must_use]
    pub fn is_paced(&self) -> bool {
        self.speed.is_finite() && self.speed > 0.0
    }

    /// Wall-clock offset at which an event at `time_ms` is shown.
    #[must_use]
    pub fn wall_offset(&self, time_ms: Millis) -> Duration {
        if self.is_paced() {
            Duration::try_from_secs_f64(ms_to_secs(time_ms) / self.speed).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

/// One event with running totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackLine {
    /// Simulated time.
    pub time_ms: Millis,
    /// Ability.
    pub ability: Ability,
    /// Outcome.
    pub outcome: OutcomeKind,
    /// Damage or healing.
    pub amount: u64,
    /// Overheal.
    pub overheal: u64,
    /// Output so far, including this event.
    pub running_total: u64,
    /// Output so far divided by elapsed fight time.
    pub running_per_second: f64,
}

impl fmt::Display for PlaybackLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>7.1}s] {:<20} {:<9} {:>6}",
            ms_to_secs(self.time_ms),
            self.ability.name(),
            format!("{:?}", self.outcome).to_lowercase(),
            self.amount
        )?;
        if self.overheal > 0 {
            write!(f, " (+{} over)", self.overheal)?;
        }
        write!(f, "  total {:>8}  {:>8.1}/s", self.running_total, self.running_per_second)
    }
}

/// Annotate an event log with running totals.
///
/// The per-second rate uses at least one second of elapsed time so events at
/// `t = 0` do not divide by zero.
#[must_use]
pub fn playback_lines(result: &SimulationResult) -> Vec<PlaybackLine> {
    let mut running_total = 0u64;
    result
        .events
        .iter()
        .map(|event| {
            running_total += event.amount;
            PlaybackLine {
                time_ms: event.time_ms,
                ability: event.ability,
                outcome: event.outcome,
                amount: event.amount,
                overheal: event.overheal,
                running_total,
                running_per_second: running_total as f64 / ms_to_secs(event.time_ms).max(1.0),
            }
        })
        .collect()
}

/// Write an iteration's events, paced against the wall clock.
///
/// Returns the number of lines written.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn play_back<W: Write>(
    result: &SimulationResult,
    config: &PlaybackConfig,
    out: &mut W,
) -> io::Result<usize> {
    let lines = playback_lines(result);
    tracing::info!(
        events = lines.len(),
        speed = config.speed,
        paced = config.is_paced(),
        "Starting playback"
    );

    let start = Instant::now();
    for line in &lines {
        let due = config.wall_offset(line.time_ms);
        let elapsed = start.elapsed();
        if due > elapsed {
            thread::sleep(due - elapsed);
        }
        match config.format {
            PlaybackFormat::Text => writeln!(out, "{line}")?,
            PlaybackFormat::Json => {
                serde_json::to_writer(&mut *out, line)?;
                writeln!(out)?;
            }
        }
        out.flush()?;
    }

    writeln!(
        out,
        "-- {} events, {} total, {:.1}/s over {:.0}s",
        lines.len(),
        result.total_output,
        result.output_per_second,
        result.duration_secs
    )?;
    Ok(lines.len())
}
