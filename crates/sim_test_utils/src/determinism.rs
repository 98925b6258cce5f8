//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical inputs and seeds.
//!
//! # Testing Strategy
//!
//! A seeded iteration must be bit-for-bit reproducible. Sources of
//! non-determinism include:
//!
//! - **System randomness**: the generator is always injected. Tests use
//!   `ChaCha8Rng`, whose stream is the same on every platform.
//!
//! - **HashMap iteration order**: cooldowns and breakdowns live in
//!   `BTreeMap`s, so iteration is ordered by ability.
//!
//! - **Wall-clock time**: simulated time is integer milliseconds and never
//!   reads the system clock.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual archetypes replay identically
//! 2. **Property tests**: random builds still replay identically
//! 3. **Parallel tests**: the same seed on N threads yields one fingerprint

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::engine::{Archetype, Engine};
use sim_core::result::SimulationResult;
use sim_core::runner::Simulate;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Fingerprints from each run.
    pub fingerprints: Vec<u64>,
    /// Seed every run used.
    pub seed: u64,
}

impl DeterminismResult {
    /// Get all unique fingerprints (should be 1 for a deterministic simulation).
    #[must_use]
    pub fn unique_fingerprints(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.fingerprints.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different fingerprints.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_fingerprints();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Seed: {}\n\
                 Unique fingerprints: {} (expected 1)\n\
                 All fingerprints: {:?}",
                self.fingerprints.len(),
                self.seed,
                unique.len(),
                self.fingerprints
            );
        }
    }
}

/// Run one seeded iteration.
pub fn run_seeded<S: Simulate + ?Sized>(sim: &S, seed: u64) -> SimulationResult {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    sim.simulate_once(&mut rng)
}

/// Fingerprint of one seeded iteration.
///
/// # Panics
///
/// Panics if the result cannot be encoded.
pub fn fingerprint<S: Simulate + ?Sized>(sim: &S, seed: u64) -> u64 {
    match run_seeded(sim, seed).fingerprint() {
        Ok(hash) => hash,
        Err(e) => panic!("result encoding failed: {e}"),
    }
}

/// Run a simulation several times with the same seed and compare fingerprints.
///
/// # Example
///
/// ```ignore
/// use sim_test_utils::determinism::verify_determinism;
///
/// let sim = Simulator::from_spec(&fixtures::combat_rogue()).unwrap();
/// verify_determinism(&sim, 5, 42).assert_deterministic();
/// ```
pub fn verify_determinism<S: Simulate + ?Sized>(sim: &S, runs: usize, seed: u64) -> DeterminismResult {
    let fingerprints: Vec<u64> = (0..runs).map(|_| fingerprint(sim, seed)).collect();
    let is_deterministic = fingerprints.windows(2).all(|w| w[0] == w[1]);
    tracing::debug!(runs, seed, is_deterministic, "Determinism check");
    DeterminismResult {
        is_deterministic,
        fingerprints,
        seed,
    }
}

/// Run the same seed on `threads` scoped threads and collect fingerprints.
///
/// Catches non-determinism that only shows up under thread scheduling.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel<S: Simulate + Sync + ?Sized>(sim: &S, threads: usize, seed: u64) -> DeterminismResult {
    let fingerprints: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| s.spawn(move || fingerprint(sim, seed)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });
    let is_deterministic = fingerprints.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        fingerprints,
        seed,
    }
}

/// Step two copies of an engine side by side and report the first step at
/// which their states differ.
///
/// Returns `None` if the runs never diverge.
pub fn find_first_divergence<A>(engine: &Engine<A>, seed: u64) -> Option<u64>
where
    A: Archetype,
    A::Payload: PartialEq,
{
    let mut rng_a = ChaCha8Rng::seed_from_u64(seed);
    let mut rng_b = ChaCha8Rng::seed_from_u64(seed);
    let mut a = engine.new_state();
    let mut b = engine.new_state();

    let mut step = 0;
    while !engine.is_finished(&a) {
        engine.advance_step(&mut a, &mut rng_a);
        engine.advance_step(&mut b, &mut rng_b);
        step += 1;
        if a != b {
            return Some(step);
        }
    }
    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation inputs.
///
/// These generate random but valid stat snapshots, targets and attacker
/// profiles for property-based tests.
pub mod strategies {
    use proptest::prelude::*;
    use sim_core::attack_table::AttackerProfile;
    use sim_core::stats::{CombatantStats, TargetStats, Weapon, WeaponType};

    /// Any weapon type.
    pub fn arb_weapon_type() -> impl Strategy<Value = WeaponType> {
        prop_oneof![
            Just(WeaponType::Dagger),
            Just(WeaponType::Sword),
            Just(WeaponType::Mace),
            Just(WeaponType::Fist),
            Just(WeaponType::Axe),
        ]
    }

    /// A valid weapon: positive speed, `min <= max`.
    pub fn arb_weapon() -> impl Strategy<Value = Weapon> {
        (1.0f64..200.0, 0.0f64..150.0, 1.3f64..3.8, arb_weapon_type())
            .prop_map(|(min, spread, speed, kind)| Weapon::new(min, min + spread, speed, kind))
    }

    /// Target at or above the attacker's level.
    pub fn arb_target() -> impl Strategy<Value = TargetStats> {
        (60u32..=63, 0.0f64..5_000.0).prop_map(|(level, armor)| TargetStats { level, armor })
    }

    /// Attacker with skill, hit and crit in realistic ranges.
    pub fn arb_attacker() -> impl Strategy<Value = AttackerProfile> {
        (280u32..=320, 0.0f64..0.15, 0.0f64..0.5).prop_map(|(weapon_skill, hit, crit)| {
            AttackerProfile {
                level: 60,
                weapon_skill,
                hit,
                crit,
            }
        })
    }

    /// Melee stats, optionally dual-wielding.
    pub fn arb_melee_stats() -> impl Strategy<Value = CombatantStats> {
        (
            0.0f64..2_000.0,
            0.0f64..0.1,
            0.0f64..0.4,
            0.0f64..0.3,
            arb_weapon(),
            proptest::option::of(arb_weapon()),
            80.0f64..120.0,
        )
            .prop_map(|(attack_power, hit, crit, haste, main, off, energy)| CombatantStats {
                attack_power,
                hit,
                crit,
                haste,
                max_resource: energy,
                main_hand: Some(main),
                off_hand: off,
                ..CombatantStats::default()
            })
    }

    /// Caster stats with a small to large mana pool.
    pub fn arb_caster_stats() -> impl Strategy<Value = CombatantStats> {
        (
            0.0f64..1_000.0,
            0.0f64..0.2,
            0.0f64..0.4,
            500.0f64..10_000.0,
            0.0f64..100.0,
            0.0f64..80.0,
        )
            .prop_map(|(power, spell_hit, spell_crit, mana, mana_per_5, spirit_regen)| CombatantStats {
                spell_power: power,
                healing_power: power,
                spell_hit,
                spell_crit,
                max_resource: mana,
                mana_per_5,
                spirit_regen,
                ..CombatantStats::default()
            })
    }
}
