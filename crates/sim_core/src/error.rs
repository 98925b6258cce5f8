//! Error types for the combat simulation.
//!
//! Only configuration problems are errors. Everything that can happen inside a
//! running encounter (an empty weapon slot, a negative probability, a zero
//! length fight) is resolved locally and never surfaces here.

use thiserror::Error;

use crate::character::Class;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for simulation configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// Talent name not known for the class.
    #[error("Unknown {class} talent: '{name}'")]
    UnknownTalent {
        /// Class whose talent tree was searched.
        class: Class,
        /// Name as it appeared in the configuration.
        name: String,
    },

    /// Talent rank above the talent's maximum.
    #[error("Talent '{name}' rank {rank} exceeds maximum {max}")]
    TalentRankOutOfRange {
        /// Talent name.
        name: String,
        /// Requested rank.
        rank: u8,
        /// Highest legal rank.
        max: u8,
    },

    /// Ability name not recognised.
    #[error("Unknown ability: '{0}'")]
    UnknownAbility(String),

    /// Ability exists but cannot be used by the class.
    #[error("Ability '{ability}' is not usable by {class}")]
    AbilityNotAvailable {
        /// Ability name.
        ability: String,
        /// Class that tried to use it.
        class: Class,
    },

    /// Buff name not recognised in a rotation guard.
    #[error("Unknown buff: '{0}'")]
    UnknownBuff(String),

    /// Rotation command could not be parsed.
    #[error("Malformed rotation command '{command}': {reason}")]
    MalformedRotation {
        /// The offending command text.
        command: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Stats snapshot is not usable.
    #[error("Invalid stats: {0}")]
    InvalidStats(String),

    /// Result could not be encoded.
    #[error("Failed to encode result: {0}")]
    Encode(String),
}
