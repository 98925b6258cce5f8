//! Healing.
//!
//! Heals never miss. The final amount is clamped to the target's missing
//! health, so every heal splits into effective healing and overheal.
//! Bouncing heals lose a fixed fraction per jump:
//!
//! ```text
//! factor(j) = (1 - reductionPerJump)^j
//! ```

use rand::Rng;

use super::floor_amount;
use super::spell::{SpellDamage, SpellTable};
use crate::attack_table::OutcomeKind;

/// One heal landing on one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealOutcome {
    /// Magnitude before multipliers and crit.
    pub base_amount: f64,
    /// Healing that restored missing health.
    pub effective: u64,
    /// Healing wasted on a full target.
    pub overheal: u64,
    /// Hit or crit.
    pub kind: OutcomeKind,
}

impl HealOutcome {
    /// Total healing before the deficit clamp.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.effective + self.overheal
    }
}

/// Split a floored heal into `(effective, overheal)` against a deficit.
#[must_use]
pub fn split_heal(amount: u64, deficit: f64) -> (u64, u64) {
    let room = floor_amount(deficit);
    let effective = amount.min(room);
    (effective, amount - effective)
}

/// Precomputed per-target factors for a bouncing heal.
///
/// Index 0 is the primary target.
#[must_use]
pub fn jump_factors(jumps: usize, reduction_per_jump: f64) -> Vec<f64> {
    let keep = (1.0 - reduction_per_jump).clamp(0.0, 1.0);
    (0..=jumps).map(|j| keep.powi(j as i32)).collect()
}

/// Compute a heal on one target.
pub fn compute_heal<R: Rng + ?Sized>(
    spell: &SpellDamage,
    healing_power: f64,
    multiplier: f64,
    table: &SpellTable,
    deficit: f64,
    rng: &mut R,
) -> HealOutcome {
    let base = spell.base(healing_power, rng);
    let outcome = table.roll(rng);
    let amount = floor_amount(base * multiplier * outcome.damage_multiplier);
    let (effective, overheal) = split_heal(amount, deficit);
    HealOutcome {
        base_amount: base,
        effective,
        overheal,
        kind: outcome.kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_split_heal() {
        assert_eq!(split_heal(1000, 400.0), (400, 600));
        assert_eq!(split_heal(1000, 5000.0), (1000, 0));
        assert_eq!(split_heal(1000, 0.0), (0, 1000));
        assert_eq!(split_heal(1000, -10.0), (0, 1000));
    }

    #[test]
    fn test_jump_factors() {
        let factors = jump_factors(2, 0.5);
        assert_eq!(factors, vec![1.0, 0.5, 0.25]);
        assert_eq!(jump_factors(0, 0.5), vec![1.0]);
    }

    #[test]
    fn test_heal_never_misses() {
        let spell = SpellDamage::new(1000.0, 1000.0, 0.0);
        let table = SpellTable::unmissable(0.0);
        let mut rng = StepRng::new(0, 1);
        let out = compute_heal(&spell, 0.0, 1.0, &table, 600.0, &mut rng);
        assert_eq!(out.kind, OutcomeKind::Hit);
        assert_eq!(out.effective, 600);
        assert_eq!(out.overheal, 400);
        assert_eq!(out.raw(), 1000);
    }
}
