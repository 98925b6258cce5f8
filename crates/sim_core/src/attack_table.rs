//! Melee attack resolution table.
//!
//! A single uniform draw is compared against cumulative outcome chances in a
//! fixed order:
//!
//! ```text
//! Miss -> Dodge -> Glancing (auto-attacks only) -> Crit -> Hit
//! ```
//!
//! The order decides which outcome wins where the chances overlap. Crit only
//! receives whatever probability mass is left after the avoidance outcomes,
//! and hit is the remainder. All chances are computed once from the immutable
//! snapshot when the table is built, never per roll.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::stats::TargetStats;

/// Miss chance against a target of equal effective skill.
pub const BASE_MISS: f64 = 0.05;

/// Dodge chance of a normal target.
pub const BASE_DODGE: f64 = 0.05;

/// Dodge chance of a boss-tier target.
pub const BOSS_DODGE: f64 = 0.065;

/// Upper bound on glancing chance.
pub const MAX_GLANCING: f64 = 0.40;

/// Damage multiplier of a melee critical strike.
pub const MELEE_CRIT_MULTIPLIER: f64 = 2.0;

/// Skill gap at which the miss slope steepens.
const STEEP_MISS_GAP: i64 = 11;

/// Outcome of a single attack or spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Attack missed.
    Miss,
    /// Target dodged.
    Dodge,
    /// Reduced-damage auto-attack.
    Glancing,
    /// Normal hit.
    Hit,
    /// Critical strike.
    Crit,
    /// Weapon ability used with an empty slot. Never produced by a table.
    NoWeapon,
}

impl OutcomeKind {
    /// Whether the attack connected with the target.
    #[must_use]
    pub const fn is_landed(self) -> bool {
        matches!(self, Self::Glancing | Self::Hit | Self::Crit)
    }
}

/// A sampled outcome with its damage multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// What happened.
    pub kind: OutcomeKind,
    /// Multiplier applied to the base damage (before armor).
    pub damage_multiplier: f64,
}

impl AttackOutcome {
    /// The zero-effect outcome of a weapon ability with no weapon.
    pub const NO_WEAPON: Self = Self {
        kind: OutcomeKind::NoWeapon,
        damage_multiplier: 0.0,
    };
}

/// Which table an attack rolls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwingKind {
    /// Auto-attack. Can glance, uses dual-wield miss.
    White,
    /// Special attack. Cannot glance, always uses single-wield miss.
    Special,
}

/// Attacker inputs the table depends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackerProfile {
    /// Attacker level.
    pub level: u32,
    /// Effective weapon skill including talents.
    pub weapon_skill: u32,
    /// Hit chance.
    pub hit: f64,
    /// Crit chance.
    pub crit: f64,
}

/// Miss chance from the skill gap alone, before hit is subtracted.
#[must_use]
pub fn skill_gap_miss(weapon_skill: u32, target_defense: u32) -> f64 {
    let gap = i64::from(target_defense) - i64::from(weapon_skill);
    let slope = if gap >= STEEP_MISS_GAP { 0.002 } else { 0.001 };
    BASE_MISS + gap as f64 * slope
}

/// Single-weapon miss chance after hit, floored at zero.
#[must_use]
pub fn single_wield_miss(weapon_skill: u32, target_defense: u32, hit: f64) -> f64 {
    (skill_gap_miss(weapon_skill, target_defense) - hit).clamp(0.0, 1.0)
}

/// Auto-attack miss chance while dual wielding.
#[must_use]
pub fn dual_wield_miss(single_miss: f64) -> f64 {
    (single_miss * 0.8 + 0.20).min(1.0)
}

/// Dodge chance of the target.
///
/// Skill above the attacker's level cap shaves 1% per 400 points.
#[must_use]
pub fn dodge_chance(attacker_level: u32, weapon_skill: u32, target: &TargetStats) -> f64 {
    let base = if target.is_boss_tier(attacker_level) {
        BOSS_DODGE
    } else {
        BASE_DODGE
    };
    let over_cap = weapon_skill.saturating_sub(attacker_level * 5);
    (base - f64::from(over_cap) * 0.01 / 400.0).max(0.0)
}

/// Glancing chance of an auto-attack.
///
/// Zero when the target is below the attacker's level.
#[must_use]
pub fn glancing_chance(attacker_level: u32, weapon_skill: u32, target: &TargetStats) -> f64 {
    if target.level < attacker_level {
        return 0.0;
    }
    let capped_skill = weapon_skill.min(attacker_level * 5);
    let gap = i64::from(target.defense()) - i64::from(capped_skill);
    (0.10 + 0.02 * gap as f64).clamp(0.0, MAX_GLANCING)
}

/// Damage multiplier of a glancing blow.
///
/// Stepped at three skill breakpoints, with a continuous penalty below the
/// lowest one. Non-decreasing in weapon skill for a fixed target.
#[must_use]
pub fn glancing_multiplier(weapon_skill: u32, target_defense: u32) -> f64 {
    let gap = i64::from(target_defense) - i64::from(weapon_skill);
    match gap {
        i64::MIN..=7 => 0.95,
        8..=10 => 0.85,
        11..=15 => 0.65,
        _ => (1.3 - 0.05 * gap as f64).clamp(0.01, 0.95),
    }
}

/// Precomputed outcome chances for one hand and one swing kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackTable {
    /// Miss chance.
    pub miss: f64,
    /// Dodge chance.
    pub dodge: f64,
    /// Glancing chance.
    pub glancing: f64,
    /// Crit chance actually reachable after avoidance.
    pub crit: f64,
    /// Remaining normal-hit chance.
    pub hit: f64,
    /// Damage multiplier applied on a glancing blow.
    pub glancing_multiplier: f64,
    /// Damage multiplier applied on a crit.
    pub crit_multiplier: f64,
}

impl AttackTable {
    /// Build the table for an attacker, target and swing kind.
    ///
    /// `dual_wield` only matters for [`SwingKind::White`].
    #[must_use]
    pub fn new(
        attacker: &AttackerProfile,
        target: &TargetStats,
        kind: SwingKind,
        dual_wield: bool,
    ) -> Self {
        let single = single_wield_miss(attacker.weapon_skill, target.defense(), attacker.hit);
        let miss = if kind == SwingKind::White && dual_wield {
            dual_wield_miss(single)
        } else {
            single
        };
        let dodge = dodge_chance(attacker.level, attacker.weapon_skill, target);
        let glancing = if kind == SwingKind::White {
            glancing_chance(attacker.level, attacker.weapon_skill, target)
        } else {
            0.0
        };

        let mut table = Self::from_chances(miss, dodge, glancing, attacker.crit);
        table.glancing_multiplier = glancing_multiplier(attacker.weapon_skill, target.defense());
        table
    }

    /// Build a table from raw chances, clamping so the five terms sum to one.
    ///
    /// Negative inputs are treated as zero and each term is capped at the
    /// mass left by the terms before it in roll order.
    #[must_use]
    pub fn from_chances(miss: f64, dodge: f64, glancing: f64, crit: f64) -> Self {
        let clamp = |value: f64, remaining: f64| {
            if value.is_finite() {
                value.clamp(0.0, remaining.max(0.0))
            } else {
                0.0
            }
        };
        let miss = clamp(miss, 1.0);
        let dodge = clamp(dodge, 1.0 - miss);
        let glancing = clamp(glancing, 1.0 - miss - dodge);
        let crit = clamp(crit, 1.0 - miss - dodge - glancing);
        let hit = (1.0 - miss - dodge - glancing - crit).max(0.0);
        Self {
            miss,
            dodge,
            glancing,
            crit,
            hit,
            glancing_multiplier: 0.95,
            crit_multiplier: MELEE_CRIT_MULTIPLIER,
        }
    }

    /// Builder method to override the crit multiplier.
    #[must_use]
    pub const fn with_crit_multiplier(mut self, multiplier: f64) -> Self {
        self.crit_multiplier = multiplier;
        self
    }

    /// Sum of all outcome chances (one, up to rounding).
    #[must_use]
    pub fn total(&self) -> f64 {
        self.miss + self.dodge + self.glancing + self.crit + self.hit
    }

    /// Resolve an outcome for a uniform draw in `[0, 1)`.
    #[must_use]
    pub fn resolve(&self, draw: f64) -> AttackOutcome {
        let mut threshold = self.miss;
        if draw < threshold {
            return self.outcome(OutcomeKind::Miss);
        }
        threshold += self.dodge;
        if draw < threshold {
            return self.outcome(OutcomeKind::Dodge);
        }
        threshold += self.glancing;
        if draw < threshold {
            return self.outcome(OutcomeKind::Glancing);
        }
        threshold += self.crit;
        if draw < threshold {
            return self.outcome(OutcomeKind::Crit);
        }
        self.outcome(OutcomeKind::Hit)
    }

    /// Sample one outcome with a single uniform draw.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> AttackOutcome {
        self.resolve(rng.gen::<f64>())
    }

    fn outcome(&self, kind: OutcomeKind) -> AttackOutcome {
        let damage_multiplier = match kind {
            OutcomeKind::Miss | OutcomeKind::Dodge | OutcomeKind::NoWeapon => 0.0,
            OutcomeKind::Glancing => self.glancing_multiplier,
            OutcomeKind::Hit => 1.0,
            OutcomeKind::Crit => self.crit_multiplier,
        };
        AttackOutcome {
            kind,
            damage_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attacker(skill: u32) -> AttackerProfile {
        AttackerProfile {
            level: 60,
            weapon_skill: skill,
            hit: 0.0,
            crit: 0.0,
        }
    }

    fn boss() -> TargetStats {
        TargetStats {
            level: 63,
            armor: 0.0,
        }
    }

    #[test]
    fn test_skill_300_vs_boss() {
        let table = AttackTable::new(&attacker(300), &boss(), SwingKind::White, false);
        assert!((table.miss - 0.08).abs() < 1e-9);
        assert!((table.glancing - 0.40).abs() < 1e-9);
        assert!((table.glancing_multiplier - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_skill_308_vs_boss() {
        let table = AttackTable::new(&attacker(308), &boss(), SwingKind::White, false);
        assert!((table.miss - 0.057).abs() < 1e-9);
        assert!((table.glancing - 0.40).abs() < 1e-9);
        assert!((table.glancing_multiplier - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_special_never_glances() {
        let table = AttackTable::new(&attacker(300), &boss(), SwingKind::Special, true);
        assert_eq!(table.glancing, 0.0);
        // Specials ignore the dual-wield penalty
        assert!((table.miss - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_dual_wield_penalty_applies_to_white() {
        let table = AttackTable::new(&attacker(300), &boss(), SwingKind::White, true);
        assert!((table.miss - (0.08 * 0.8 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_hit_floors_miss_at_zero() {
        let mut profile = attacker(300);
        profile.hit = 0.5;
        let table = AttackTable::new(&profile, &boss(), SwingKind::Special, false);
        assert_eq!(table.miss, 0.0);
    }

    #[test]
    fn test_boss_dodge_baseline() {
        assert!((dodge_chance(60, 300, &boss()) - BOSS_DODGE).abs() < 1e-12);
        let normal = TargetStats {
            level: 60,
            armor: 0.0,
        };
        assert!((dodge_chance(60, 300, &normal) - BASE_DODGE).abs() < 1e-12);
        // 400 points over cap removes 1%
        assert!((dodge_chance(60, 700, &normal) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_glancing_zero_vs_lower_level() {
        let low = TargetStats {
            level: 59,
            armor: 0.0,
        };
        assert_eq!(glancing_chance(60, 300, &low), 0.0);
    }

    #[test]
    fn test_glancing_multiplier_penalty_region() {
        // gap 20 -> 1.3 - 1.0 = 0.3
        assert!((glancing_multiplier(295, 315) - 0.3).abs() < 1e-9);
        // huge gap clamps to 1%
        assert!((glancing_multiplier(100, 315) - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_crit_squeezed_by_avoidance() {
        let table = AttackTable::from_chances(0.3, 0.3, 0.3, 0.5);
        assert!((table.crit - 0.1).abs() < 1e-9);
        assert_eq!(table.hit, 0.0);
        assert!((table.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_chances_clamped() {
        let table = AttackTable::from_chances(-0.1, -0.2, 0.0, 0.1);
        assert_eq!(table.miss, 0.0);
        assert_eq!(table.dodge, 0.0);
        assert!((table.hit - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_order() {
        let table = AttackTable::from_chances(0.1, 0.1, 0.1, 0.1);
        assert_eq!(table.resolve(0.05).kind, OutcomeKind::Miss);
        assert_eq!(table.resolve(0.15).kind, OutcomeKind::Dodge);
        assert_eq!(table.resolve(0.25).kind, OutcomeKind::Glancing);
        assert_eq!(table.resolve(0.35).kind, OutcomeKind::Crit);
        assert_eq!(table.resolve(0.45).kind, OutcomeKind::Hit);
        assert_eq!(table.resolve(0.35).damage_multiplier, MELEE_CRIT_MULTIPLIER);
    }
}
