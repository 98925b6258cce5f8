//! Per-iteration results, reduced from the event log at the end of a run.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::abilities::Ability;
use crate::attack_table::OutcomeKind;
use crate::clock::{ms_to_secs, Millis};
use crate::error::{Result, SimError};
use crate::state::CombatEvent;

/// Totals for one ability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityBreakdown {
    /// The ability.
    pub ability: Ability,
    /// Damage or effective healing.
    pub total: u64,
    /// Overheal (zero for damage).
    pub overheal: u64,
    /// Uses of the ability. Bounces of a jump heal are not counted.
    pub count: u32,
    /// Uses that were crits.
    pub crits: u32,
    /// Percentage of the iteration's total output.
    pub share_pct: f64,
}

/// Number of events per outcome kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    /// Misses.
    pub miss: u32,
    /// Dodges.
    pub dodge: u32,
    /// Glancing blows.
    pub glancing: u32,
    /// Normal hits.
    pub hit: u32,
    /// Critical strikes.
    pub crit: u32,
    /// Weapon abilities used with an empty slot.
    pub no_weapon: u32,
}

impl OutcomeCounts {
    /// Count one outcome.
    pub fn record(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Miss => self.miss += 1,
            OutcomeKind::Dodge => self.dodge += 1,
            OutcomeKind::Glancing => self.glancing += 1,
            OutcomeKind::Hit => self.hit += 1,
            OutcomeKind::Crit => self.crit += 1,
            OutcomeKind::NoWeapon => self.no_weapon += 1,
        }
    }

    /// Add another set of counts.
    pub fn merge(&mut self, other: &Self) {
        self.miss += other.miss;
        self.dodge += other.dodge;
        self.glancing += other.glancing;
        self.hit += other.hit;
        self.crit += other.crit;
        self.no_weapon += other.no_weapon;
    }

    /// Number of table outcomes (excludes `no_weapon`).
    #[must_use]
    pub const fn rolled(&self) -> u32 {
        self.miss + self.dodge + self.glancing + self.hit + self.crit
    }

    /// Outcome rates as fractions of [`Self::rolled`].
    #[must_use]
    pub fn rates(&self) -> OutcomeRates {
        let total = f64::from(self.rolled());
        if total == 0.0 {
            return OutcomeRates::default();
        }
        OutcomeRates {
            miss: f64::from(self.miss) / total,
            dodge: f64::from(self.dodge) / total,
            glancing: f64::from(self.glancing) / total,
            hit: f64::from(self.hit) / total,
            crit: f64::from(self.crit) / total,
        }
    }
}

/// Outcome rates as fractions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRates {
    /// Miss rate.
    pub miss: f64,
    /// Dodge rate.
    pub dodge: f64,
    /// Glancing rate.
    pub glancing: f64,
    /// Hit rate.
    pub hit: f64,
    /// Crit rate.
    pub crit: f64,
}

/// Outcome of one simulated encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Fight length in seconds.
    pub duration_secs: f64,
    /// Total damage or effective healing.
    pub total_output: u64,
    /// Damage or healing per second (zero for a zero-length fight).
    pub output_per_second: f64,
    /// Total overheal.
    pub total_overheal: u64,
    /// Full event log.
    pub events: Vec<CombatEvent>,
    /// Per-ability totals, ordered by ability.
    pub breakdown: Vec<AbilityBreakdown>,
    /// Outcome counts over damage and healing events.
    pub outcome_counts: OutcomeCounts,
}

impl SimulationResult {
    /// Reduce an event log into a result.
    #[must_use]
    pub fn from_events(events: Vec<CombatEvent>, duration_ms: Millis) -> Self {
        let mut per_ability: BTreeMap<Ability, AbilityBreakdown> = BTreeMap::new();
        let mut outcome_counts = OutcomeCounts::default();
        let mut total_output = 0u64;
        let mut total_overheal = 0u64;

        for event in &events {
            total_output += event.amount;
            total_overheal += event.overheal;
            if event.ability.deals_output() {
                outcome_counts.record(event.outcome);
            }

            let entry = per_ability
                .entry(event.ability)
                .or_insert_with(|| AbilityBreakdown {
                    ability: event.ability,
                    total: 0,
                    overheal: 0,
                    count: 0,
                    crits: 0,
                    share_pct: 0.0,
                });
            entry.total += event.amount;
            entry.overheal += event.overheal;
            if event.is_cast() {
                entry.count += 1;
                if event.is_crit() {
                    entry.crits += 1;
                }
            }
        }

        let breakdown = per_ability
            .into_values()
            .map(|mut entry| {
                entry.share_pct = if total_output == 0 {
                    0.0
                } else {
                    entry.total as f64 / total_output as f64 * 100.0
                };
                entry
            })
            .collect();

        let duration_secs = ms_to_secs(duration_ms);
        let output_per_second = if duration_ms == 0 {
            0.0
        } else {
            total_output as f64 / duration_secs
        };

        Self {
            duration_secs,
            total_output,
            output_per_second,
            total_overheal,
            events,
            breakdown,
            outcome_counts,
        }
    }

    /// Breakdown entry for one ability.
    #[must_use]
    pub fn ability(&self, ability: Ability) -> Option<&AbilityBreakdown> {
        self.breakdown.iter().find(|b| b.ability == ability)
    }

    /// Number of uses of one ability.
    #[must_use]
    pub fn count_of(&self, ability: Ability) -> u32 {
        self.ability(ability).map_or(0, |b| b.count)
    }

    /// Canonical binary encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| SimError::Encode(e.to_string()))
    }

    /// Hash of the canonical encoding.
    ///
    /// Two runs with the same inputs and seed produce the same fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn fingerprint(&self) -> Result<u64> {
        let bytes = self.encode()?;
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Ok(hasher.finish())
    }
}
