//! Damage and healing calculators.
//!
//! Every calculator follows the same contract: take an ability's base
//! magnitude, apply independent multiplicative bonuses, consult an outcome
//! table and return an [`AbilityOutcome`]. Amounts are floored to whole
//! numbers exactly once, as the last step.
//!
//! Archetypes go through [`compute_ability_damage`], which picks the
//! calculator from the [`CalcContext`] they describe the use with.
//!
//! - [`melee`] - weapon swings and weapon-based specials
//! - [`spell`] - two-roll spell table for casters
//! - [`heal`] - heals clamped to the target's missing health

pub mod heal;
pub mod melee;
pub mod spell;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::abilities::Ability;
use crate::armor::School;
use crate::attack_table::{AttackTable, OutcomeKind};
use crate::stats::TargetStats;
use heal::{compute_heal, HealOutcome};
use melee::{finisher_base, resolve_physical, WeaponStrike};
use spell::{compute_spell, SpellDamage, SpellTable};

/// Result of computing one ability use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityOutcome {
    /// Magnitude before outcome, talent and armor modifiers.
    pub base_amount: f64,
    /// Floored final amount. For heals, the effective part only.
    pub final_amount: u64,
    /// Healing past the target's missing health (zero for damage).
    #[serde(default)]
    pub overheal: u64,
    /// Outcome the table produced.
    pub kind: OutcomeKind,
}

impl AbilityOutcome {
    /// Zero-damage outcome of a weapon ability with an empty slot.
    pub const NO_WEAPON: Self = Self {
        base_amount: 0.0,
        final_amount: 0,
        overheal: 0,
        kind: OutcomeKind::NoWeapon,
    };

    /// Whether the ability connected.
    #[must_use]
    pub const fn is_landed(&self) -> bool {
        self.kind.is_landed()
    }

    /// Whether the ability was a critical strike.
    #[must_use]
    pub fn is_crit(&self) -> bool {
        self.kind == OutcomeKind::Crit
    }
}

impl From<HealOutcome> for AbilityOutcome {
    fn from(heal: HealOutcome) -> Self {
        Self {
            base_amount: heal.base_amount,
            final_amount: heal.effective,
            overheal: heal.overheal,
            kind: heal.kind,
        }
    }
}

/// Everything a calculator needs besides the ability and the generator.
#[derive(Debug, Clone, Copy)]
pub enum CalcContext<'a> {
    /// Auto-attack or weapon-based special.
    Weapon {
        /// Weapon, hand and multipliers.
        strike: WeaponStrike<'a>,
        /// White or yellow table for the hand.
        table: &'a AttackTable,
        /// Armored target.
        target: &'a TargetStats,
        /// Attacker level for armor.
        attacker_level: u32,
    },
    /// Finisher: a flat roll plus an attack power coefficient.
    Finisher {
        /// Low end of the flat roll.
        min: f64,
        /// High end of the flat roll.
        max: f64,
        /// Effective attack power.
        attack_power: f64,
        /// Attack power coefficient.
        coefficient: f64,
        /// Product of talent multipliers.
        talent_multiplier: f64,
        /// Finisher table.
        table: &'a AttackTable,
        /// Armored target.
        target: &'a TargetStats,
        /// Attacker level for armor.
        attacker_level: u32,
    },
    /// Damage spell.
    Spell {
        /// Rank data.
        spell: SpellDamage,
        /// Spell power.
        spell_power: f64,
        /// Product of school and talent multipliers.
        multiplier: f64,
        /// Two-roll spell table.
        table: &'a SpellTable,
    },
    /// Heal on one target.
    Heal {
        /// Rank data.
        spell: SpellDamage,
        /// Healing power.
        healing_power: f64,
        /// Product of talent, buff and jump multipliers.
        multiplier: f64,
        /// Crit-only table.
        table: &'a SpellTable,
        /// Target's missing health.
        deficit: f64,
    },
}

impl CalcContext<'_> {
    /// Whether this calculator fits the ability.
    #[must_use]
    pub fn accepts(&self, ability: Ability) -> bool {
        match self {
            Self::Weapon { .. } | Self::Finisher { .. } => ability.school() == School::Physical,
            Self::Spell { .. } => ability.school() != School::Physical && !ability.is_heal(),
            Self::Heal { .. } => ability.is_heal(),
        }
    }
}

/// Compute one use of an ability.
///
/// Physical abilities take a weapon or finisher context, damage spells a
/// spell context and heals a heal context.
pub fn compute_ability_damage<R: Rng + ?Sized>(
    ability: Ability,
    context: &CalcContext<'_>,
    rng: &mut R,
) -> AbilityOutcome {
    debug_assert!(
        context.accepts(ability),
        "{ability} computed with a {context:?} context"
    );
    match *context {
        CalcContext::Weapon {
            strike,
            table,
            target,
            attacker_level,
        } => strike.compute(table, target, attacker_level, rng),
        CalcContext::Finisher {
            min,
            max,
            attack_power,
            coefficient,
            talent_multiplier,
            table,
            target,
            attacker_level,
        } => {
            let base = finisher_base(min, max, attack_power, coefficient, rng);
            resolve_physical(base, talent_multiplier, table, target, attacker_level, rng)
        }
        CalcContext::Spell {
            spell,
            spell_power,
            multiplier,
            table,
        } => compute_spell(&spell, spell_power, multiplier, table, rng),
        CalcContext::Heal {
            spell,
            healing_power,
            multiplier,
            table,
            deficit,
        } => compute_heal(&spell, healing_power, multiplier, table, deficit, rng).into(),
    }
}

/// Uniform roll in `[min, max]`. A degenerate range returns `min`.
pub fn uniform<R: Rng + ?Sized>(min: f64, max: f64, rng: &mut R) -> f64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

/// Floor to a whole amount, treating negative and non-finite values as zero.
#[must_use]
pub fn floor_amount(amount: f64) -> u64 {
    if amount.is_finite() && amount > 0.0 {
        amount.floor() as u64
    } else {
        0
    }
}

/// Product of independent multiplicative bonuses.
#[must_use]
pub fn stack_multipliers(multipliers: &[f64]) -> f64 {
    multipliers.iter().product()
}
