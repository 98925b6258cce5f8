//! Batch metrics for build comparison.
//!
//! Reduces many [`SimulationResult`]s into one [`BatchSummary`]: the output
//! distribution, per-ability shares and the outcome rates across every
//! rolled attack or spell.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sim_core::abilities::Ability;
use sim_core::character::Class;
use sim_core::result::{OutcomeCounts, OutcomeRates, SimulationResult};
use sim_core::runner::Aggregate;

/// Per-ability averages across a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilitySummary {
    /// Ability.
    pub ability: Ability,
    /// Mean share of total output, in percent.
    pub average_share_pct: f64,
    /// Mean events per iteration.
    pub average_count: f64,
    /// Mean output per iteration.
    pub average_total: f64,
    /// Crits over events, across the batch.
    pub crit_rate: f64,
}

/// Aggregate summary over a batch of iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Character name.
    pub character: String,
    /// Class simulated.
    pub class: Class,
    /// Iterations summarised.
    pub iterations: usize,
    /// Fight length of each iteration.
    pub fight_duration_secs: f64,
    /// Output per second distribution. `None` for an empty batch.
    pub output_per_second: Option<Aggregate>,
    /// Mean overheal per iteration.
    pub mean_overheal: f64,
    /// Per-ability averages, ordered by share, largest first.
    pub abilities: Vec<AbilitySummary>,
    /// Outcome counts summed over the batch.
    pub outcome_counts: OutcomeCounts,
    /// Outcome rates over the batch.
    pub outcome_rates: OutcomeRates,
    /// Wall-clock time spent simulating.
    pub execution_secs: f64,
}

#[derive(Default)]
struct AbilityTotals {
    share_pct: f64,
    count: u64,
    total: u64,
    crits: u64,
}

impl BatchSummary {
    /// Summarise a batch.
    #[must_use]
    pub fn from_results(
        character: impl Into<String>,
        class: Class,
        results: &[SimulationResult],
        execution_secs: f64,
    ) -> Self {
        let iterations = results.len();
        let n = iterations.max(1) as f64;

        let mut outcome_counts = OutcomeCounts::default();
        let mut per_ability: BTreeMap<Ability, AbilityTotals> = BTreeMap::new();
        let mut overheal = 0u64;

        for result in results {
            outcome_counts.merge(&result.outcome_counts);
            overheal += result.total_overheal;
            for entry in &result.breakdown {
                let totals = per_ability.entry(entry.ability).or_default();
                totals.share_pct += entry.share_pct;
                totals.count += u64::from(entry.count);
                totals.total += entry.total;
                totals.crits += u64::from(entry.crits);
            }
        }

        // Iterations where an ability never fired count as a zero share
        let mut abilities: Vec<AbilitySummary> = per_ability
            .into_iter()
            .map(|(ability, totals)| AbilitySummary {
                ability,
                average_share_pct: totals.share_pct / n,
                average_count: totals.count as f64 / n,
                average_total: totals.total as f64 / n,
                crit_rate: if totals.count == 0 {
                    0.0
                } else {
                    totals.crits as f64 / totals.count as f64
                },
            })
            .collect();
        abilities.sort_by(|a, b| b.average_share_pct.total_cmp(&a.average_share_pct));

        Self {
            character: character.into(),
            class,
            iterations,
            fight_duration_secs: results.first().map_or(0.0, |r| r.duration_secs),
            output_per_second: Aggregate::over(results, |r| r.output_per_second),
            mean_overheal: overheal as f64 / n,
            abilities,
            outcome_rates: outcome_counts.rates(),
            outcome_counts,
            execution_secs,
        }
    }

    /// Mean output per second, zero for an empty batch.
    #[must_use]
    pub fn mean_output_per_second(&self) -> f64 {
        self.output_per_second.map_or(0.0, |a| a.mean)
    }

    /// Summary entry for one ability.
    #[must_use]
    pub fn ability(&self, ability: Ability) -> Option<&AbilitySummary> {
        self.abilities.iter().find(|a| a.ability == ability)
    }

    /// Iterations per wall-clock second.
    #[must_use]
    pub fn throughput(&self) -> f64 {
        self.iterations as f64 / self.execution_secs.max(0.001)
    }

    /// Human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let unit = if self.class.is_healer() { "HPS" } else { "DPS" };
        let mut out = String::new();
        out.push_str(&format!("{} ({})\n", self.character, self.class));
        out.push_str(&format!(
            "Iterations: {} x {:.0}s in {:.2}s ({:.0}/s)\n",
            self.iterations,
            self.fight_duration_secs,
            self.execution_secs,
            self.throughput()
        ));
        if let Some(stats) = self.output_per_second {
            out.push_str(&format!(
                "{unit}: {:.1} (min {:.1}, max {:.1}, sd {:.1})\n",
                stats.mean, stats.min, stats.max, stats.std_dev
            ));
        }
        if self.class.is_healer() {
            out.push_str(&format!("Overheal per fight: {:.0}\n", self.mean_overheal));
        }

        out.push_str("\nAbility                 Share   Count    Crit\n");
        for a in &self.abilities {
            out.push_str(&format!(
                "{:<22} {:>5.1}% {:>7.1} {:>6.1}%\n",
                a.ability.name(),
                a.average_share_pct,
                a.average_count,
                a.crit_rate * 100.0
            ));
        }

        let r = &self.outcome_rates;
        out.push_str(&format!(
            "\nMiss {:.2}%  Dodge {:.2}%  Glancing {:.2}%  Hit {:.2}%  Crit {:.2}%\n",
            r.miss * 100.0,
            r.dodge * 100.0,
            r.glancing * 100.0,
            r.hit * 100.0,
            r.crit * 100.0
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::attack_table::OutcomeKind;
    use sim_core::state::CombatEvent;

    fn result(events: Vec<CombatEvent>) -> SimulationResult {
        SimulationResult::from_events(events, 10_000)
    }

    #[test]
    fn test_empty_batch() {
        let summary = BatchSummary::from_results("Nobody", Class::Rogue, &[], 0.0);
        assert_eq!(summary.iterations, 0);
        assert!(summary.output_per_second.is_none());
        assert_eq!(summary.mean_output_per_second(), 0.0);
        assert!(summary.abilities.is_empty());
    }

    #[test]
    fn test_shares_average_over_all_iterations() {
        let a = result(vec![
            CombatEvent::new(0, Ability::SinisterStrike, 300, OutcomeKind::Hit),
            CombatEvent::new(0, Ability::MainHandSwing, 100, OutcomeKind::Crit),
        ]);
        let b = result(vec![CombatEvent::new(0, Ability::MainHandSwing, 200, OutcomeKind::Hit)]);

        let summary = BatchSummary::from_results("Rogue", Class::Rogue, &[a, b], 1.0);
        assert_eq!(summary.iterations, 2);

        // 75% in one iteration, absent in the other
        let ss = summary.ability(Ability::SinisterStrike).unwrap();
        assert!((ss.average_share_pct - 37.5).abs() < 1e-9);
        assert!((ss.average_count - 0.5).abs() < 1e-9);

        let swing = summary.ability(Ability::MainHandSwing).unwrap();
        assert!((swing.average_share_pct - 62.5).abs() < 1e-9);
        assert!((swing.crit_rate - 0.5).abs() < 1e-9);

        // Largest share first
        assert_eq!(summary.abilities[0].ability, Ability::MainHandSwing);

        let dps = summary.output_per_second.unwrap();
        assert!((dps.mean - 30.0).abs() < 1e-9);
        assert!((dps.min - 20.0).abs() < 1e-9);
        assert!((dps.max - 40.0).abs() < 1e-9);
        assert_eq!(summary.outcome_counts.rolled(), 3);
    }

    #[test]
    fn test_mean_overheal() {
        let a = result(vec![
            CombatEvent::new(0, Ability::HealingWave, 1000, OutcomeKind::Hit).with_overheal(400)
        ]);
        let b = result(vec![CombatEvent::new(0, Ability::HealingWave, 1400, OutcomeKind::Hit)]);
        let summary = BatchSummary::from_results("Shaman", Class::Shaman, &[a, b], 1.0);
        assert!((summary.mean_overheal - 200.0).abs() < 1e-9);
        assert!(summary.report().contains("HPS"));
        assert!(summary.report().contains("Overheal"));
    }

    #[test]
    fn test_report_lists_abilities() {
        let a = result(vec![CombatEvent::new(0, Ability::Frostbolt, 700, OutcomeKind::Hit)]);
        let summary = BatchSummary::from_results("Mage", Class::Mage, &[a], 0.5);
        let report = summary.report();
        assert!(report.contains("DPS"));
        assert!(report.contains("frostbolt"));
        assert!((summary.throughput() - 2.0).abs() < 1e-9);
    }
}
