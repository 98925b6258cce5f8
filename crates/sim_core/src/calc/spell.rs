//! Spell damage.
//!
//! Spells use two independent draws: one for miss, then (if the spell landed)
//! one for crit. There is no dodge, glancing or armor.
//!
//! | Target level − caster level | Base miss |
//! |-----------------------------|-----------|
//! | ≤ 0                         | 4%        |
//! | 1                           | 5%        |
//! | 2                           | 6%        |
//! | 3                           | 17%       |
//! | each further level          | +11%      |

use rand::Rng;

use super::{floor_amount, uniform, AbilityOutcome};
use crate::attack_table::{AttackOutcome, OutcomeKind};

/// Default spell crit multiplier.
pub const SPELL_CRIT_MULTIPLIER: f64 = 1.5;

/// Spell miss chance before hit, from the level difference.
#[must_use]
pub fn base_spell_miss(caster_level: u32, target_level: u32) -> f64 {
    let diff = i64::from(target_level) - i64::from(caster_level);
    match diff {
        i64::MIN..=0 => 0.04,
        1 => 0.05,
        2 => 0.06,
        _ => (0.17 + (diff - 3) as f64 * 0.11).min(1.0),
    }
}

/// Two-outcome spell table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpellTable {
    /// Miss chance after hit.
    pub miss: f64,
    /// Crit chance, checked only when the spell did not miss.
    pub crit: f64,
    /// Crit damage multiplier.
    pub crit_multiplier: f64,
}

impl SpellTable {
    /// Build a table. Chances are clamped to `[0, 1]`.
    #[must_use]
    pub fn new(caster_level: u32, target_level: u32, spell_hit: f64, spell_crit: f64) -> Self {
        Self {
            miss: clamp_chance(base_spell_miss(caster_level, target_level) - spell_hit),
            crit: clamp_chance(spell_crit),
            crit_multiplier: SPELL_CRIT_MULTIPLIER,
        }
    }

    /// Table for effects that cannot miss (heals).
    #[must_use]
    pub fn unmissable(crit: f64) -> Self {
        Self {
            miss: 0.0,
            crit: clamp_chance(crit),
            crit_multiplier: SPELL_CRIT_MULTIPLIER,
        }
    }

    /// Builder method to override the crit multiplier.
    #[must_use]
    pub const fn with_crit_multiplier(mut self, multiplier: f64) -> Self {
        self.crit_multiplier = multiplier;
        self
    }

    /// Resolve an outcome from the two draws.
    #[must_use]
    pub fn resolve(&self, miss_draw: f64, crit_draw: f64) -> AttackOutcome {
        if miss_draw < self.miss {
            AttackOutcome {
                kind: OutcomeKind::Miss,
                damage_multiplier: 0.0,
            }
        } else if crit_draw < self.crit {
            AttackOutcome {
                kind: OutcomeKind::Crit,
                damage_multiplier: self.crit_multiplier,
            }
        } else {
            AttackOutcome {
                kind: OutcomeKind::Hit,
                damage_multiplier: 1.0,
            }
        }
    }

    /// Sample an outcome. The crit draw is only taken when the spell lands.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> AttackOutcome {
        let miss_draw = rng.gen::<f64>();
        if miss_draw < self.miss {
            return self.resolve(miss_draw, 1.0);
        }
        self.resolve(miss_draw, rng.gen::<f64>())
    }
}

fn clamp_chance(chance: f64) -> f64 {
    if chance.is_finite() {
        chance.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Damage range and scaling of a spell rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpellDamage {
    /// Minimum base damage.
    pub min: f64,
    /// Maximum base damage.
    pub max: f64,
    /// Fraction of spell power added.
    pub coefficient: f64,
}

impl SpellDamage {
    /// Define a spell rank.
    #[must_use]
    pub const fn new(min: f64, max: f64, coefficient: f64) -> Self {
        Self {
            min,
            max,
            coefficient,
        }
    }

    /// Base magnitude: `uniform(min, max) + power × coefficient`.
    pub fn base<R: Rng + ?Sized>(&self, power: f64, rng: &mut R) -> f64 {
        uniform(self.min, self.max, rng) + power * self.coefficient
    }
}

/// Compute a damage spell.
pub fn compute_spell<R: Rng + ?Sized>(
    spell: &SpellDamage,
    spell_power: f64,
    school_multiplier: f64,
    table: &SpellTable,
    rng: &mut R,
) -> AbilityOutcome {
    let base = spell.base(spell_power, rng);
    let outcome = table.roll(rng);
    AbilityOutcome {
        base_amount: base,
        final_amount: floor_amount(base * school_multiplier * outcome.damage_multiplier),
        overheal: 0,
        kind: outcome.kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_base_miss_by_level() {
        assert!((base_spell_miss(60, 58) - 0.04).abs() < 1e-12);
        assert!((base_spell_miss(60, 60) - 0.04).abs() < 1e-12);
        assert!((base_spell_miss(60, 61) - 0.05).abs() < 1e-12);
        assert!((base_spell_miss(60, 62) - 0.06).abs() < 1e-12);
        assert!((base_spell_miss(60, 63) - 0.17).abs() < 1e-12);
        assert!((base_spell_miss(60, 64) - 0.28).abs() < 1e-12);
    }

    #[test]
    fn test_hit_floors_miss_at_zero() {
        let table = SpellTable::new(60, 60, 0.10, 0.05);
        assert_eq!(table.miss, 0.0);
        let table = SpellTable::new(60, 63, 0.03, 0.05);
        assert!((table.miss - 0.14).abs() < 1e-12);
    }

    #[test]
    fn test_crit_only_checked_on_landed() {
        let table = SpellTable {
            miss: 0.5,
            crit: 1.0,
            crit_multiplier: 1.5,
        };
        assert_eq!(table.resolve(0.1, 0.0).kind, OutcomeKind::Miss);
        assert_eq!(table.resolve(0.6, 0.0).kind, OutcomeKind::Crit);
        assert!((table.resolve(0.6, 0.0).damage_multiplier - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_compute_spell_scales_with_power() {
        let frostbolt = SpellDamage::new(515.0, 515.0, 0.5);
        let table = SpellTable {
            miss: 0.0,
            crit: 0.0,
            crit_multiplier: 1.5,
        };
        let mut rng = StepRng::new(0, 1);
        let out = compute_spell(&frostbolt, 500.0, 1.0, &table, &mut rng);
        // 515 + 250 = 765
        assert_eq!(out.final_amount, 765);
        assert_eq!(out.kind, OutcomeKind::Hit);
    }
}
