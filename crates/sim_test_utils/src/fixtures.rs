//! Test fixtures and helpers.
//!
//! Pre-built stat snapshots and character specs for consistent testing.

use sim_core::archetypes::shaman::HealTarget;
use sim_core::character::{CharacterSpec, Class};
use sim_core::stats::{CombatantStats, TargetStats, Weapon, WeaponEnchant, WeaponType};

/// A 100-150 damage, 2.0 speed sword.
#[must_use]
pub fn training_sword() -> Weapon {
    Weapon::new(100.0, 150.0, 2.0, WeaponType::Sword)
}

/// Stats for the auto-attack-only scenario: 1000 AP, one 2.0 speed weapon,
/// no hit or crit.
#[must_use]
pub fn auto_attack_stats() -> CombatantStats {
    CombatantStats {
        attack_power: 1000.0,
        main_hand: Some(training_sword()),
        ..CombatantStats::default()
    }
}

/// A level 60 target with no armor.
#[must_use]
pub fn unarmored_target() -> TargetStats {
    TargetStats {
        level: 60,
        armor: 0.0,
    }
}

/// Dual-wielding combat rogue stats.
#[must_use]
pub fn combat_rogue_stats() -> CombatantStats {
    CombatantStats {
        attack_power: 1250.0,
        hit: 0.06,
        crit: 0.28,
        main_hand: Some(
            Weapon::new(89.0, 166.0, 2.7, WeaponType::Sword).with_enchant(WeaponEnchant::Crusader),
        ),
        off_hand: Some(
            Weapon::new(54.0, 101.0, 1.8, WeaponType::Dagger).with_enchant(WeaponEnchant::Crusader),
        ),
        ..CombatantStats::default()
    }
}

/// Combat swords rogue with the usual talents.
#[must_use]
pub fn combat_rogue() -> CharacterSpec {
    CharacterSpec::new("Combat Rogue", Class::Rogue)
        .with_stats(combat_rogue_stats())
        .with_talent("malice", 5)
        .with_talent("precision", 5)
        .with_talent("lethality", 5)
        .with_talent("improved_sinister_strike", 2)
        .with_talent("improved_slice_and_dice", 3)
        .with_talent("relentless_strikes", 1)
        .with_talent("ruthlessness", 3)
        .with_talent("dual_wield_specialization", 5)
        .with_talent("sword_specialization", 5)
        .with_talent("weapon_expertise", 2)
        .with_talent("aggression", 3)
        .with_talent("blade_flurry", 1)
        .with_talent("adrenaline_rush", 1)
}

/// Caster stats with a large mana pool.
#[must_use]
pub fn caster_stats() -> CombatantStats {
    CombatantStats {
        spell_power: 600.0,
        healing_power: 900.0,
        spell_hit: 0.08,
        spell_crit: 0.12,
        max_resource: 8_000.0,
        mana_per_5: 40.0,
        spirit_regen: 45.0,
        ..CombatantStats::default()
    }
}

/// Frost mage.
#[must_use]
pub fn frost_mage() -> CharacterSpec {
    CharacterSpec::new("Frost Mage", Class::Mage)
        .with_stats(caster_stats())
        .with_talent("improved_frostbolt", 5)
        .with_talent("ice_shards", 5)
        .with_talent("piercing_ice", 3)
        .with_talent("elemental_precision", 3)
        .with_talent("arcane_concentration", 5)
}

/// Fire mage with Arcane Power.
#[must_use]
pub fn fire_mage() -> CharacterSpec {
    CharacterSpec::new("Fire Mage", Class::Mage)
        .with_stats(caster_stats())
        .with_talent("improved_fireball", 5)
        .with_talent("ignite", 5)
        .with_talent("improved_scorch", 3)
        .with_talent("fire_power", 5)
        .with_talent("critical_mass", 3)
        .with_talent("arcane_power", 1)
}

/// Restoration shaman healing a tank under steady damage.
#[must_use]
pub fn resto_shaman() -> CharacterSpec {
    let mut spec = CharacterSpec::new("Resto Shaman", Class::Shaman)
        .with_stats(caster_stats())
        .with_talent("purification", 5)
        .with_talent("tidal_mastery", 5)
        .with_talent("improved_healing_wave", 5)
        .with_talent("tidal_focus", 5)
        .with_talent("healing_way", 3);
    spec.heal_target = HealTarget {
        max_health: 9_000.0,
        incoming_dps: 500.0,
        jump_target_deficit: 1_500.0,
    };
    spec
}

/// Every class fixture.
#[must_use]
pub fn all_characters() -> Vec<CharacterSpec> {
    vec![combat_rogue(), frost_mage(), fire_mage(), resto_shaman()]
}

/// Parse a RON character definition.
///
/// # Panics
///
/// Panics if the text is not a valid character.
#[must_use]
pub fn character_from_ron(text: &str) -> CharacterSpec {
    match ron::from_str(text) {
        Ok(spec) => spec,
        Err(e) => panic!("invalid character fixture: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::character::Simulator;

    #[test]
    fn test_all_fixtures_configure() {
        for spec in all_characters() {
            let sim = Simulator::from_spec(&spec);
            assert!(sim.is_ok(), "{} failed: {:?}", spec.name, sim.err());
        }
    }

    #[test]
    fn test_character_from_ron() {
        let spec = character_from_ron(
            r#"(
                name: "Ron Mage",
                class: mage,
                talents: { "ice_shards": 5 },
                fight_duration_secs: 30.0,
            )"#,
        );
        assert_eq!(spec.class, Class::Mage);
        assert_eq!(spec.talents.get("ice_shards"), Some(&5));
        assert_eq!(spec.iterations, 1_000);
    }
}
