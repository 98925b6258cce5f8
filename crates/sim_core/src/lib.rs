//! # Sim Core
//!
//! Deterministic combat output simulation for character builds.
//!
//! This crate contains **only** simulation logic:
//! - No IO
//! - No system randomness (the generator is always injected)
//! - No wall-clock time (simulated time is integer milliseconds)
//!
//! This separation enables:
//! - Seeded, bit-for-bit reproducible iterations
//! - Parallel batches in the headless runner
//! - Fingerprint-based determinism testing
//!
//! ## Crate Structure
//!
//! - [`attack_table`] - Miss/dodge/glancing/crit/hit resolution
//! - [`armor`] - Physical damage mitigation
//! - [`calc`] - Melee, spell and heal calculators
//! - [`engine`] - The time-stepped encounter loop
//! - [`archetypes`] - Rogue, mage and shaman behaviour
//! - [`rotation`] - Ability priority lists with typed guards
//! - [`character`] - Serde character specs and class dispatch
//! - [`runner`] - Iteration runner and aggregates

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod archetypes;
pub mod armor;
pub mod attack_table;
pub mod buffs;
pub mod calc;
pub mod character;
pub mod clock;
pub mod engine;
pub mod error;
pub mod result;
pub mod rotation;
pub mod runner;
pub mod state;
pub mod stats;
pub mod talents;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::abilities::Ability;
    pub use crate::archetypes::mage::Mage;
    pub use crate::archetypes::rogue::Rogue;
    pub use crate::archetypes::shaman::{HealTarget, Shaman};
    pub use crate::attack_table::{AttackOutcome, AttackTable, OutcomeKind, SwingKind};
    pub use crate::buffs::Buff;
    pub use crate::calc::{compute_ability_damage, AbilityOutcome, CalcContext};
    pub use crate::character::{CharacterSpec, Class, Simulator};
    pub use crate::clock::Millis;
    pub use crate::engine::{Archetype, Engine};
    pub use crate::error::{Result, SimError};
    pub use crate::result::{AbilityBreakdown, OutcomeCounts, OutcomeRates, SimulationResult};
    pub use crate::rotation::{Condition, Rotation, RotationCommand};
    pub use crate::runner::{run_many, Aggregate, Simulate};
    pub use crate::state::{CombatEvent, SimulationState};
    pub use crate::stats::{CombatantStats, TargetStats, Weapon, WeaponEnchant, WeaponType};
    pub use crate::talents::{MageTalent, RogueTalent, ShamanTalent, TalentSet};
}
