//! Attack table properties and the weapon-skill scenarios.
//!
//! These tests drive the table through its public constructors only.

use proptest::prelude::*;
use sim_core::attack_table::{
    dual_wield_miss, glancing_chance, glancing_multiplier, single_wield_miss, AttackTable,
    AttackerProfile, OutcomeKind, SwingKind,
};
use sim_core::stats::TargetStats;
use sim_test_utils::determinism::strategies::{arb_attacker, arb_target};

const EPS: f64 = 1e-9;

fn attacker(weapon_skill: u32) -> AttackerProfile {
    AttackerProfile {
        level: 60,
        weapon_skill,
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

// =============================================================================
// Skill Scenarios
// =============================================================================

#[test]
fn test_skill_300_against_boss() {
    let table = AttackTable::new(&attacker(300), &boss(), SwingKind::White, false);
    assert!((table.miss - 0.080).abs() < EPS);
    assert!((table.glancing - 0.40).abs() < EPS);
    assert!((table.glancing_multiplier - 0.65).abs() < EPS);
}

#[test]
fn test_skill_308_against_boss() {
    let table = AttackTable::new(&attacker(308), &boss(), SwingKind::White, false);
    assert!((table.miss - 0.057).abs() < EPS);
    assert!((table.glancing - 0.40).abs() < EPS);
    assert!((table.glancing_multiplier - 0.95).abs() < EPS);
}

#[test]
fn test_special_attacks_ignore_dual_wield_and_glancing() {
    let white = AttackTable::new(&attacker(300), &boss(), SwingKind::White, true);
    let special = AttackTable::new(&attacker(300), &boss(), SwingKind::Special, true);
    assert!((white.miss - (0.08 * 0.8 + 0.20)).abs() < EPS);
    assert!((special.miss - 0.08).abs() < EPS);
    assert_eq!(special.glancing, 0.0);
}

#[test]
fn test_boss_dodge() {
    let table = AttackTable::new(&attacker(300), &boss(), SwingKind::Special, false);
    assert!((table.dodge - 0.065).abs() < EPS);
    let same_level = TargetStats {
        level: 60,
        armor: 0.0,
    };
    let table = AttackTable::new(&attacker(300), &same_level, SwingKind::Special, false);
    assert!((table.dodge - 0.05).abs() < EPS);
}

// =============================================================================
// Formulas
// =============================================================================

#[test]
fn test_dual_wield_formula() {
    for single in [0.0, 0.05, 0.08, 0.5, 1.0] {
        let expected = (single * 0.8 + 0.20_f64).min(1.0);
        assert!((dual_wield_miss(single) - expected).abs() < EPS);
    }
}

#[test]
fn test_glancing_zero_below_attacker_level() {
    let low = TargetStats {
        level: 58,
        armor: 0.0,
    };
    assert_eq!(glancing_chance(60, 300, &low), 0.0);
    let table = AttackTable::new(&attacker(300), &low, SwingKind::White, false);
    assert_eq!(table.glancing, 0.0);
}

#[test]
fn test_crit_squeezed_by_avoidance() {
    let profile = AttackerProfile {
        crit: 0.9,
        ..attacker(300)
    };
    let table = AttackTable::new(&profile, &boss(), SwingKind::White, true);
    assert!(table.hit.abs() < EPS);
    assert!((table.total() - 1.0).abs() < EPS);
    assert_eq!(table.resolve(0.999_999).kind, OutcomeKind::Crit);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_table_sums_to_one(
        profile in arb_attacker(),
        target in arb_target(),
        special in any::<bool>(),
        dual_wield in any::<bool>(),
    ) {
        let kind = if special { SwingKind::Special } else { SwingKind::White };
        let table = AttackTable::new(&profile, &target, kind, dual_wield);
        prop_assert!((table.total() - 1.0).abs() < EPS);
        for chance in [table.miss, table.dodge, table.glancing, table.crit, table.hit] {
            prop_assert!(chance >= 0.0);
        }
    }

    #[test]
    fn prop_raw_chances_always_normalized(
        miss in -1.0f64..2.0,
        dodge in -1.0f64..2.0,
        glancing in -1.0f64..2.0,
        crit in -1.0f64..2.0,
    ) {
        let table = AttackTable::from_chances(miss, dodge, glancing, crit);
        prop_assert!((table.total() - 1.0).abs() < EPS);
    }

    #[test]
    fn prop_glancing_multiplier_non_decreasing(skill in 250u32..330, defense in 290u32..330) {
        prop_assert!(glancing_multiplier(skill + 1, defense) >= glancing_multiplier(skill, defense));
    }

    #[test]
    fn prop_dual_wield_never_below_single(
        skill in 0u32..400,
        defense in 0u32..400,
        hit in 0.0f64..1.0,
    ) {
        let single = single_wield_miss(skill, defense, hit);
        let dual = dual_wield_miss(single);
        prop_assert!(dual >= single - 1e-12);
        prop_assert!(dual <= 1.0);
    }

    #[test]
    fn prop_more_hit_never_raises_miss(skill in 280u32..320, hit in 0.0f64..0.2) {
        prop_assert!(single_wield_miss(skill, 315, hit + 0.01) <= single_wield_miss(skill, 315, hit));
    }

    #[test]
    fn prop_resolve_matches_thresholds(profile in arb_attacker(), draw in 0.0f64..1.0) {
        let table = AttackTable::new(&profile, &boss(), SwingKind::White, false);
        let kind = table.resolve(draw).kind;
        let expected = if draw < table.miss {
            OutcomeKind::Miss
        } else if draw < table.miss + table.dodge {
            OutcomeKind::Dodge
        } else if draw < table.miss + table.dodge + table.glancing {
            OutcomeKind::Glancing
        } else if draw < table.miss + table.dodge + table.glancing + table.crit {
            OutcomeKind::Crit
        } else {
            OutcomeKind::Hit
        };
        prop_assert_eq!(kind, expected);
    }
}
