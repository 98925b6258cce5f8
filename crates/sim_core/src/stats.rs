//! Immutable combatant and target snapshots.
//!
//! Stats are derived once from gear before a run starts. Talent and buff
//! effects are layered on top by each archetype's accessors and are never
//! written back into these structs.
//!
//! All chances are fractions: `0.05` means 5%.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Weapon family, used by type-gated talents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    /// Daggers - required by Backstab.
    Dagger,
    /// One-handed swords.
    #[default]
    Sword,
    /// One-handed maces.
    Mace,
    /// Fist weapons.
    Fist,
    /// One-handed axes.
    Axe,
}

/// Permanent weapon enchant with a proc effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponEnchant {
    /// Temporary attack power bonus.
    Crusader,
    /// Flat fire damage.
    Fiery,
}

impl WeaponEnchant {
    /// Procs per minute.
    #[must_use]
    pub const fn ppm(self) -> f64 {
        match self {
            Self::Crusader => 1.0,
            Self::Fiery => 6.0,
        }
    }
}

/// Chance per landed swing for a procs-per-minute effect.
#[must_use]
pub fn ppm_chance(weapon_speed: f64, ppm: f64) -> f64 {
    (weapon_speed / 60.0 * ppm).clamp(0.0, 1.0)
}

/// Which hand a weapon is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    /// Main hand.
    Main,
    /// Off hand.
    Off,
}

/// A melee weapon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Minimum base damage.
    pub min_damage: f64,
    /// Maximum base damage.
    pub max_damage: f64,
    /// Swing time in seconds.
    pub speed: f64,
    /// Weapon family.
    #[serde(default)]
    pub weapon_type: WeaponType,
    /// Enchant, if any.
    #[serde(default)]
    pub enchant: Option<WeaponEnchant>,
}

impl Weapon {
    /// Create a weapon without an enchant.
    #[must_use]
    pub const fn new(min_damage: f64, max_damage: f64, speed: f64, weapon_type: WeaponType) -> Self {
        Self {
            min_damage,
            max_damage,
            speed,
            weapon_type,
            enchant: None,
        }
    }

    /// Builder method to set the enchant.
    #[must_use]
    pub const fn with_enchant(mut self, enchant: WeaponEnchant) -> Self {
        self.enchant = Some(enchant);
        self
    }

    /// Swing time in milliseconds.
    #[must_use]
    pub fn speed_ms(&self) -> u64 {
        crate::clock::secs_to_ms(self.speed)
    }

    /// Average base damage.
    #[must_use]
    pub fn average_damage(&self) -> f64 {
        (self.min_damage + self.max_damage) / 2.0
    }
}

/// Immutable per-run combatant snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatantStats {
    /// Character level.
    pub level: u32,
    /// Weapon skill before talent bonuses.
    pub weapon_skill: u32,
    /// Melee hit chance.
    pub hit: f64,
    /// Melee crit chance.
    pub crit: f64,
    /// Melee haste (0.1 = 10% faster swings).
    pub haste: f64,
    /// Attack power.
    pub attack_power: f64,
    /// Spell damage bonus.
    pub spell_power: f64,
    /// Healing bonus.
    pub healing_power: f64,
    /// Spell hit chance.
    pub spell_hit: f64,
    /// Spell crit chance.
    pub spell_crit: f64,
    /// Spell haste (0.1 = 10% faster casts).
    pub spell_haste: f64,
    /// Size of the primary resource pool (energy or mana).
    pub max_resource: f64,
    /// Mana regenerated per five seconds regardless of casting.
    pub mana_per_5: f64,
    /// Mana regenerated per two-second tick while outside the five-second rule.
    pub spirit_regen: f64,
    /// Main-hand weapon.
    pub main_hand: Option<Weapon>,
    /// Off-hand weapon.
    pub off_hand: Option<Weapon>,
}

impl Default for CombatantStats {
    fn default() -> Self {
        Self {
            level: 60,
            weapon_skill: 300,
            hit: 0.0,
            crit: 0.0,
            haste: 0.0,
            attack_power: 0.0,
            spell_power: 0.0,
            healing_power: 0.0,
            spell_hit: 0.0,
            spell_crit: 0.0,
            spell_haste: 0.0,
            max_resource: 100.0,
            mana_per_5: 0.0,
            spirit_regen: 0.0,
            main_hand: None,
            off_hand: None,
        }
    }
}

impl CombatantStats {
    /// Weapon held in the given hand.
    #[must_use]
    pub const fn weapon(&self, hand: Hand) -> Option<&Weapon> {
        match hand {
            Hand::Main => self.main_hand.as_ref(),
            Hand::Off => self.off_hand.as_ref(),
        }
    }

    /// Whether an off-hand weapon is equipped.
    #[must_use]
    pub const fn is_dual_wielding(&self) -> bool {
        self.off_hand.is_some()
    }

    /// Reject snapshots that would make the simulation meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.level == 0 {
            return Err(SimError::InvalidStats("level must be at least 1".into()));
        }
        if !(self.max_resource.is_finite() && self.max_resource >= 0.0) {
            return Err(SimError::InvalidStats(format!(
                "resource pool must be non-negative, got {}",
                self.max_resource
            )));
        }
        for (label, weapon) in [("main hand", self.main_hand), ("off hand", self.off_hand)] {
            let Some(weapon) = weapon else {
                continue;
            };
            if weapon.speed <= 0.0 || !weapon.speed.is_finite() {
                return Err(SimError::InvalidStats(format!(
                    "{label} speed must be positive, got {}",
                    weapon.speed
                )));
            }
            if weapon.min_damage < 0.0 || weapon.max_damage < weapon.min_damage {
                return Err(SimError::InvalidStats(format!(
                    "{label} damage range {}-{} is invalid",
                    weapon.min_damage, weapon.max_damage
                )));
            }
        }
        Ok(())
    }
}

/// Combat target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetStats {
    /// Target level.
    pub level: u32,
    /// Armor after debuffs.
    pub armor: f64,
}

impl Default for TargetStats {
    fn default() -> Self {
        Self {
            level: 63,
            armor: 3731.0,
        }
    }
}

impl TargetStats {
    /// Defense skill of the target.
    #[must_use]
    pub const fn defense(&self) -> u32 {
        self.level * 5
    }

    /// Boss-tier targets are at least three levels above the attacker.
    #[must_use]
    pub const fn is_boss_tier(&self, attacker_level: u32) -> bool {
        self.level >= attacker_level + 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ppm_chance() {
        assert!((ppm_chance(2.0, 1.0) - 2.0 / 60.0).abs() < 1e-12);
        assert!((ppm_chance(60.0, 6.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_zero_speed() {
        let stats = CombatantStats {
            main_hand: Some(Weapon::new(10.0, 20.0, 0.0, WeaponType::Sword)),
            ..Default::default()
        };
        assert!(matches!(stats.validate(), Err(SimError::InvalidStats(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let stats = CombatantStats {
            off_hand: Some(Weapon::new(30.0, 20.0, 1.5, WeaponType::Dagger)),
            ..Default::default()
        };
        assert!(stats.validate().is_err());
    }

    #[test]
    fn test_boss_tier() {
        let target = TargetStats { level: 63, armor: 0.0 };
        assert!(target.is_boss_tier(60));
        assert!(!target.is_boss_tier(61));
        assert_eq!(target.defense(), 315);
    }
}
