//! Property tests over random builds: resource bounds, combo point caps and
//! the end-of-fight boundary.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::archetypes::mage::Mage;
use sim_core::archetypes::rogue::{Rogue, MAX_COMBO_POINTS};
use sim_core::archetypes::shaman::{HealTarget, Shaman};
use sim_core::engine::{Archetype, Engine};
use sim_core::stats::TargetStats;
use sim_core::talents::{MageTalent, RogueTalent, TalentSet};
use sim_test_utils::determinism::strategies::{arb_caster_stats, arb_melee_stats, arb_target};

fn rogue_talents(seal_fate: u8, vigor: u8) -> TalentSet<RogueTalent> {
    TalentSet::new()
        .with(RogueTalent::SealFate, seal_fate)
        .with(RogueTalent::Vigor, vigor)
        .with(RogueTalent::CombatPotency, 5)
        .with(RogueTalent::RelentlessStrikes, 1)
        .with(RogueTalent::Ruthlessness, 3)
        .with(RogueTalent::AdrenalineRush, 1)
}

/// Step an engine to completion, checking resource and combo bounds after
/// every step.
fn assert_bounds<A: Archetype>(engine: &Engine<A>, seed: u64) -> Result<(), TestCaseError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = engine.new_state();
    let archetype = engine.archetype();
    while !engine.is_finished(&state) {
        engine.advance_step(&mut state, &mut rng);
        let resource = archetype.resource(&state.payload);
        prop_assert!(resource >= 0.0, "resource {} below zero at {}ms", resource, state.now);
        prop_assert!(
            resource <= archetype.max_resource() + 1e-9,
            "resource {} above {} at {}ms",
            resource,
            archetype.max_resource(),
            state.now
        );
        prop_assert!(archetype.combo_points(&state.payload) <= archetype.combo_cap());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_rogue_energy_and_combo_bounds(
        stats in arb_melee_stats(),
        target in arb_target(),
        seal_fate in 0u8..=5,
        vigor in 0u8..=1,
        seed in any::<u64>(),
    ) {
        let rogue = Rogue::new(stats, target, rogue_talents(seal_fate, vigor)).unwrap();
        prop_assert_eq!(rogue.combo_cap(), MAX_COMBO_POINTS);
        assert_bounds(&Engine::new(rogue, 30_000), seed)?;
    }

    #[test]
    fn prop_mage_mana_bounds(stats in arb_caster_stats(), seed in any::<u64>()) {
        let talents = TalentSet::new()
            .with(MageTalent::ArcaneConcentration, 5)
            .with(MageTalent::ArcanePower, 1);
        let mage = Mage::new(stats, TargetStats::default(), talents).unwrap();
        assert_bounds(&Engine::new(mage, 30_000), seed)?;
    }

    #[test]
    fn prop_shaman_deficit_bounds(
        stats in arb_caster_stats(),
        incoming_dps in 0.0f64..2_000.0,
        seed in any::<u64>(),
    ) {
        let target = HealTarget { incoming_dps, ..HealTarget::default() };
        let shaman = Shaman::new(stats, target, TalentSet::new()).unwrap();
        let engine = Engine::new(shaman, 30_000);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = engine.new_state();
        while !engine.is_finished(&state) {
            engine.advance_step(&mut state, &mut rng);
            let deficit = engine.archetype().target_deficit(&state.payload);
            prop_assert!((0.0..=target.max_health).contains(&deficit));
        }
        assert_bounds(&engine, seed)?;
    }

    #[test]
    fn prop_no_event_at_or_after_fight_end(
        stats in arb_melee_stats(),
        duration_ms in 0u64..20_000,
        seed in any::<u64>(),
    ) {
        let rogue = Rogue::new(stats, TargetStats::default(), rogue_talents(5, 0)).unwrap();
        let engine = Engine::new(rogue, duration_ms);
        let result = engine.simulate(&mut ChaCha8Rng::seed_from_u64(seed));
        prop_assert!(result.events.iter().all(|e| e.time_ms < duration_ms));
        if duration_ms == 0 {
            prop_assert!(result.events.is_empty());
        }
    }

    #[test]
    fn prop_seeded_iterations_identical(stats in arb_melee_stats(), seed in any::<u64>()) {
        let rogue = Rogue::new(stats, TargetStats::default(), rogue_talents(3, 1)).unwrap();
        let engine = Engine::new(rogue, 20_000);
        let a = engine.simulate(&mut ChaCha8Rng::seed_from_u64(seed));
        let b = engine.simulate(&mut ChaCha8Rng::seed_from_u64(seed));
        prop_assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }
}
