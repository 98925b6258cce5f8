//! Sequential iteration runner and aggregate statistics.
//!
//! Each iteration gets a fresh [`crate::state::SimulationState`]; only the
//! immutable stats, talents and rotation carry over. The parallel batch runner
//! in the headless crate builds on the same [`Simulate`] trait.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::character::Simulator;
use crate::clock::Millis;
use crate::engine::{Archetype, Engine};
use crate::result::SimulationResult;

/// Anything that can run one iteration with an injected generator.
pub trait Simulate {
    /// Run one iteration.
    fn simulate_once<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulationResult;

    /// Fight length of each iteration.
    fn fight_length_ms(&self) -> Millis;
}

impl<A: Archetype> Simulate for Engine<A> {
    fn simulate_once<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulationResult {
        self.simulate(rng)
    }

    fn fight_length_ms(&self) -> Millis {
        self.duration_ms()
    }
}

impl Simulate for Simulator {
    fn simulate_once<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulationResult {
        self.simulate(rng)
    }

    fn fight_length_ms(&self) -> Millis {
        self.duration_ms()
    }
}

/// Run `iterations` independent iterations sharing one generator.
pub fn run_many<S, R>(sim: &S, iterations: u32, rng: &mut R) -> Vec<SimulationResult>
where
    S: Simulate + ?Sized,
    R: Rng + ?Sized,
{
    tracing::info!(
        iterations,
        duration_ms = sim.fight_length_ms(),
        "Starting sequential run"
    );
    let results: Vec<SimulationResult> = (0..iterations).map(|_| sim.simulate_once(rng)).collect();
    if let Some(stats) = Aggregate::over(&results, |r| r.output_per_second) {
        tracing::info!(
            iterations,
            mean = stats.mean,
            min = stats.min,
            max = stats.max,
            "Sequential run complete"
        );
    }
    results
}

/// Mean, min, max and standard deviation of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Arithmetic mean.
    pub mean: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl Aggregate {
    /// Aggregate a metric over results. `None` for an empty collection.
    #[must_use]
    pub fn over<F>(results: &[SimulationResult], metric: F) -> Option<Self>
    where
        F: Fn(&SimulationResult) -> f64,
    {
        Self::from_values(results.iter().map(metric))
    }

    /// Aggregate raw values. `None` for an empty input.
    #[must_use]
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(Self {
            mean,
            min,
            max,
            std_dev: variance.sqrt(),
        })
    }
}

/// Aggregate output per second over results.
#[must_use]
pub fn output_per_second(results: &[SimulationResult]) -> Option<Aggregate> {
    Aggregate::over(results, |r| r.output_per_second)
}

/// Aggregate total output over results.
#[must_use]
pub fn total_output(results: &[SimulationResult]) -> Option<Aggregate> {
    Aggregate::over(results, |r| r.total_output as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::rogue::Rogue;
    use crate::stats::{CombatantStats, TargetStats, Weapon, WeaponType};
    use crate::talents::TalentSet;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine() -> Engine<Rogue> {
        let stats = CombatantStats {
            attack_power: 900.0,
            main_hand: Some(Weapon::new(90.0, 160.0, 2.4, WeaponType::Mace)),
            ..CombatantStats::default()
        };
        Engine::new(Rogue::new(stats, TargetStats::default(), TalentSet::new()).unwrap(), 30_000)
    }

    #[test]
    fn test_aggregate_values() {
        let agg = Aggregate::from_values([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((agg.mean - 5.0).abs() < 1e-12);
        assert!((agg.std_dev - 2.0).abs() < 1e-12);
        assert_eq!(agg.min, 2.0);
        assert_eq!(agg.max, 9.0);
        assert!(Aggregate::from_values(Vec::new()).is_none());
    }

    #[test]
    fn test_run_many_fresh_state_each_iteration() {
        let engine = engine();
        let results = run_many(&engine, 5, &mut StdRng::seed_from_u64(8));
        assert_eq!(results.len(), 5);
        for result in &results {
            assert!(result.events.iter().all(|e| e.time_ms < 30_000));
            // Swings restart at zero for every iteration
            assert_eq!(result.events.first().map(|e| e.time_ms), Some(0));
        }
        let agg = output_per_second(&results).unwrap();
        assert!(agg.min <= agg.mean && agg.mean <= agg.max);
        assert!(total_output(&results).unwrap().min > 0.0);
    }

    #[test]
    fn test_same_seed_same_results() {
        let engine = engine();
        let a = run_many(&engine, 3, &mut StdRng::seed_from_u64(1));
        let b = run_many(&engine, 3, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }
}
