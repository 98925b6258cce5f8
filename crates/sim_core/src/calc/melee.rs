//! Melee damage.
//!
//! ```text
//! base   = roll(min, max) + attackPower / 14 × weaponSpeed
//! amount = floor(base × talents × outcome × armor)
//! ```
//!
//! Off-hand swings are scaled by `0.5 + dualWieldBonus` before the roll.

use rand::Rng;

use super::{floor_amount, uniform, AbilityOutcome};
use crate::armor::{mitigate, School};
use crate::attack_table::AttackTable;
use crate::stats::{Hand, TargetStats, Weapon};

/// Off-hand damage factor before talents.
pub const OFF_HAND_BASE_FACTOR: f64 = 0.5;

/// Attack power per point of weapon DPS.
pub const AP_PER_DPS: f64 = 14.0;

/// Off-hand damage factor for a dual-wield bonus (0.05 per talent rank).
#[must_use]
pub fn off_hand_factor(dual_wield_bonus: f64) -> f64 {
    OFF_HAND_BASE_FACTOR + dual_wield_bonus.max(0.0)
}

/// Weapon damage plus attack power normalised to the weapon's speed.
pub fn weapon_base<R: Rng + ?Sized>(weapon: &Weapon, attack_power: f64, rng: &mut R) -> f64 {
    uniform(weapon.min_damage, weapon.max_damage, rng) + attack_power / AP_PER_DPS * weapon.speed
}

/// Roll the table and apply outcome, talent and armor modifiers to a base.
pub fn resolve_physical<R: Rng + ?Sized>(
    base: f64,
    talent_multiplier: f64,
    table: &AttackTable,
    target: &TargetStats,
    attacker_level: u32,
    rng: &mut R,
) -> AbilityOutcome {
    let outcome = table.roll(rng);
    let raw = base * talent_multiplier * outcome.damage_multiplier;
    let mitigated = mitigate(raw, School::Physical, target.armor, attacker_level);
    AbilityOutcome {
        base_amount: base,
        final_amount: floor_amount(mitigated),
        overheal: 0,
        kind: outcome.kind,
    }
}

/// Inputs for a weapon swing or weapon-based special.
#[derive(Debug, Clone, Copy)]
pub struct WeaponStrike<'a> {
    /// Weapon in the striking hand, if any.
    pub weapon: Option<&'a Weapon>,
    /// Which hand strikes.
    pub hand: Hand,
    /// Effective attack power.
    pub attack_power: f64,
    /// Off-hand talent bonus (ignored for the main hand).
    pub dual_wield_bonus: f64,
    /// Multiplier on weapon damage (1.5 for Backstab).
    pub weapon_multiplier: f64,
    /// Flat bonus added after the weapon multiplier.
    pub flat_bonus: f64,
    /// Product of talent multipliers.
    pub talent_multiplier: f64,
}

impl<'a> WeaponStrike<'a> {
    /// Plain auto-attack with the given hand.
    #[must_use]
    pub const fn swing(weapon: Option<&'a Weapon>, hand: Hand, attack_power: f64) -> Self {
        Self {
            weapon,
            hand,
            attack_power,
            dual_wield_bonus: 0.0,
            weapon_multiplier: 1.0,
            flat_bonus: 0.0,
            talent_multiplier: 1.0,
        }
    }

    /// Builder method for the off-hand talent bonus.
    #[must_use]
    pub const fn with_dual_wield_bonus(mut self, bonus: f64) -> Self {
        self.dual_wield_bonus = bonus;
        self
    }

    /// Builder method for special attacks: `weapon × multiplier + flat`.
    #[must_use]
    pub const fn with_special(mut self, weapon_multiplier: f64, flat_bonus: f64) -> Self {
        self.weapon_multiplier = weapon_multiplier;
        self.flat_bonus = flat_bonus;
        self
    }

    /// Builder method for the talent multiplier.
    #[must_use]
    pub const fn with_talent_multiplier(mut self, multiplier: f64) -> Self {
        self.talent_multiplier = multiplier;
        self
    }

    /// Base damage before the table roll.
    pub fn base<R: Rng + ?Sized>(&self, weapon: &Weapon, rng: &mut R) -> f64 {
        let mut base =
            weapon_base(weapon, self.attack_power, rng) * self.weapon_multiplier + self.flat_bonus;
        if self.hand == Hand::Off {
            base *= off_hand_factor(self.dual_wield_bonus);
        }
        base
    }

    /// Compute the strike. An empty slot yields [`AbilityOutcome::NO_WEAPON`].
    pub fn compute<R: Rng + ?Sized>(
        &self,
        table: &AttackTable,
        target: &TargetStats,
        attacker_level: u32,
        rng: &mut R,
    ) -> AbilityOutcome {
        let Some(weapon) = self.weapon else {
            return AbilityOutcome::NO_WEAPON;
        };
        let base = self.base(weapon, rng);
        resolve_physical(base, self.talent_multiplier, table, target, attacker_level, rng)
    }
}

/// Finisher base: a flat roll plus an attack power coefficient.
pub fn finisher_base<R: Rng + ?Sized>(
    min: f64,
    max: f64,
    attack_power: f64,
    coefficient: f64,
    rng: &mut R,
) -> f64 {
    uniform(min, max, rng) + attack_power * coefficient
}
