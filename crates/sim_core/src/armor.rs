//! Armor-based physical damage mitigation.
//!
//! Formula:
//! ```text
//! Reduction  = Armor / (Armor + 400 + 85 × (Attacker Level - 60))
//! Multiplier = 1 - Reduction
//! ```
//!
//! Mitigation applies to physical damage only, after the attack table's own
//! multiplier. Spell damage bypasses it entirely; resistances are not modelled.

/// Fraction of physical damage removed by armor, in `[0, 1)`.
///
/// Non-positive armor and degenerate denominators yield zero reduction.
#[must_use]
pub fn armor_reduction(armor: f64, attacker_level: u32) -> f64 {
    if !(armor.is_finite() && armor > 0.0) {
        return 0.0;
    }
    let constant = 400.0 + 85.0 * (f64::from(attacker_level) - 60.0);
    let denominator = armor + constant;
    if denominator <= 0.0 {
        return 0.0;
    }
    (armor / denominator).clamp(0.0, 0.999_999)
}

/// Damage multiplier after armor.
#[must_use]
pub fn armor_multiplier(armor: f64, attacker_level: u32) -> f64 {
    1.0 - armor_reduction(armor, attacker_level)
}

/// Damage school of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum School {
    /// Weapon and physical damage.
    Physical,
    /// Fire spells.
    Fire,
    /// Frost spells.
    Frost,
    /// Arcane spells.
    Arcane,
    /// Nature spells (including heals).
    Nature,
}

impl School {
    /// Whether armor mitigates this school.
    #[must_use]
    pub const fn is_mitigated_by_armor(self) -> bool {
        matches!(self, Self::Physical)
    }
}

/// Apply armor to an amount of the given school.
#[must_use]
pub fn mitigate(amount: f64, school: School, armor: f64, attacker_level: u32) -> f64 {
    if school.is_mitigated_by_armor() {
        amount * armor_multiplier(armor, attacker_level)
    } else {
        amount
    }
}
