//! Shipped character files and the headless pipeline end to end.

use std::path::PathBuf;

use sim_core::abilities::Ability;
use sim_core::character::Class;
use sim_headless::batch::{run_batch, BatchConfig, BatchResults};
use sim_headless::character_loader::{load_character, load_characters_from_dir};
use sim_headless::playback::{play_back, PlaybackConfig};

fn characters_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../characters")
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_every_shipped_character_loads() {
    let specs = load_characters_from_dir(&characters_dir()).unwrap();
    assert_eq!(specs.len(), 4);

    let classes: Vec<Class> = specs.iter().map(|s| s.class).collect();
    assert!(classes.contains(&Class::Rogue));
    assert!(classes.contains(&Class::Mage));
    assert!(classes.contains(&Class::Shaman));
}

#[test]
fn test_rogue_file_contents() {
    let spec = load_character(&characters_dir().join("combat_rogue.ron")).unwrap();
    assert_eq!(spec.name, "Combat Rogue");
    assert_eq!(spec.rotation.len(), 5);
    assert_eq!(spec.seed, Some(1));
    assert!(spec.stats.off_hand.is_some());
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn test_batch_over_shipped_characters() {
    for spec in load_characters_from_dir(&characters_dir()).unwrap() {
        let spec = spec.with_duration(30.0);
        let results = run_batch(&spec, BatchConfig::new(4).with_seed(11)).unwrap();
        assert_eq!(results.iterations.len(), 4, "{}", spec.name);
        assert!(results.summary.mean_output_per_second() > 0.0, "{}", spec.name);

        let share: f64 = results.summary.abilities.iter().map(|a| a.average_share_pct).sum();
        assert!((share - 100.0).abs() < 1e-6, "{} shares sum to {share}", spec.name);
    }
}

#[test]
fn test_fire_mage_summary_has_ignite() {
    let spec = load_character(&characters_dir().join("fire_mage.ron"))
        .unwrap()
        .with_duration(60.0);
    let results = run_batch(&spec, BatchConfig::new(20)).unwrap();
    assert!(results.summary.ability(Ability::Fireball).is_some());
    assert!(results.summary.ability(Ability::Scorch).is_some());
    assert!(results.summary.ability(Ability::Ignite).is_some());
}

#[test]
fn test_batch_is_reproducible_across_runs() {
    let spec = load_character(&characters_dir().join("frost_mage.ron"))
        .unwrap()
        .with_duration(30.0);
    let a = run_batch(&spec, BatchConfig::new(6).with_seed(5).with_workers(2)).unwrap();
    let b = run_batch(&spec, BatchConfig::new(6).with_seed(5)).unwrap();
    assert_eq!(a.iterations, b.iterations);
    assert_eq!(a.summary.output_per_second, b.summary.output_per_second);
}

#[test]
fn test_saved_batch_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let spec = load_character(&characters_dir().join("resto_shaman.ron"))
        .unwrap()
        .with_duration(30.0);
    let config = BatchConfig::new(3).with_output(dir.path().join("out"));
    let results = run_batch(&spec, config).unwrap();

    let path = results.default_path();
    results.save(&path).unwrap();
    let loaded = BatchResults::load(&path).unwrap();
    assert_eq!(loaded.character.class, Class::Shaman);
    assert_eq!(loaded.summary.iterations, 3);
}

// ============================================================================
// Playback
// ============================================================================

#[test]
fn test_playback_of_shipped_rogue() {
    use rand::SeedableRng;
    use sim_core::character::Simulator;

    let spec = load_character(&characters_dir().join("combat_rogue.ron"))
        .unwrap()
        .with_duration(10.0);
    let sim = Simulator::from_spec(&spec).unwrap();
    let result = sim.simulate(&mut rand_chacha::ChaCha8Rng::seed_from_u64(1));

    let mut out = Vec::new();
    let written = play_back(&result, &PlaybackConfig::instant(), &mut out).unwrap();
    assert_eq!(written, result.events.len());
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("main_hand_swing"));
}
