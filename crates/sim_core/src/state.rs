//! Per-iteration mutable state.
//!
//! A [`SimulationState`] is created fresh for every iteration and dropped at
//! the end of it. The shared part (time, global cooldown, buffs, cooldowns,
//! event log) lives here; everything archetype-specific (resources, swing
//! timers, cast bar, heal target) is the payload `P`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::abilities::Ability;
use crate::attack_table::OutcomeKind;
use crate::buffs::BuffList;
use crate::clock::Millis;

/// A logged damage or heal event. The log is append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Simulated time of the event.
    pub time_ms: Millis,
    /// Source ability.
    pub ability: Ability,
    /// Damage dealt or effective healing done.
    pub amount: u64,
    /// Healing wasted on a full target (zero for damage).
    pub overheal: u64,
    /// Table outcome.
    pub outcome: OutcomeKind,
    /// Combo points or charges generated.
    pub resource_generated: u32,
    /// Target position for bouncing effects; 0 is the cast's own target.
    #[serde(default)]
    pub jump: u8,
}

impl CombatEvent {
    /// Damage or effective-heal event.
    #[must_use]
    pub const fn new(time_ms: Millis, ability: Ability, amount: u64, outcome: OutcomeKind) -> Self {
        Self {
            time_ms,
            ability,
            amount,
            overheal: 0,
            outcome,
            resource_generated: 0,
            jump: 0,
        }
    }

    /// Builder method for overheal.
    #[must_use]
    pub const fn with_overheal(mut self, overheal: u64) -> Self {
        self.overheal = overheal;
        self
    }

    /// Builder method for generated combo points.
    #[must_use]
    pub const fn with_resource_generated(mut self, generated: u32) -> Self {
        self.resource_generated = generated;
        self
    }

    /// Builder method for the jump index of a bouncing effect.
    #[must_use]
    pub const fn with_jump(mut self, jump: u8) -> Self {
        self.jump = jump;
        self
    }

    /// Whether this event is the use of the ability itself rather than a
    /// bounce of it.
    #[must_use]
    pub const fn is_cast(&self) -> bool {
        self.jump == 0
    }

    /// Whether the event was a critical strike.
    #[must_use]
    pub fn is_crit(&self) -> bool {
        self.outcome == OutcomeKind::Crit
    }
}

/// Mutable state of one encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState<P> {
    /// Current simulated time.
    pub now: Millis,
    /// Time at which the global cooldown ends.
    pub gcd_until: Millis,
    /// Active buffs and debuffs.
    pub buffs: BuffList,
    /// Time at which each ability comes off cooldown.
    pub cooldowns: BTreeMap<Ability, Millis>,
    /// Event log.
    pub events: Vec<CombatEvent>,
    /// Archetype-specific state.
    pub payload: P,
}

impl<P> SimulationState<P> {
    /// Fresh state at time zero.
    #[must_use]
    pub fn new(payload: P) -> Self {
        Self {
            now: 0,
            gcd_until: 0,
            buffs: BuffList::new(),
            cooldowns: BTreeMap::new(),
            events: Vec::new(),
            payload,
        }
    }

    /// Whether the global cooldown has elapsed.
    #[must_use]
    pub const fn gcd_ready(&self) -> bool {
        self.now >= self.gcd_until
    }

    /// Start the global cooldown from `from`.
    pub fn trigger_gcd(&mut self, from: Millis, duration: Millis) {
        self.gcd_until = self.gcd_until.max(from + duration);
    }

    /// Whether the ability's own cooldown has elapsed.
    ///
    /// Independent of the global cooldown.
    #[must_use]
    pub fn cooldown_ready(&self, ability: Ability) -> bool {
        self.cooldowns
            .get(&ability)
            .map_or(true, |&ready_at| ready_at <= self.now)
    }

    /// Put an ability on cooldown from now. A zero duration is ignored.
    pub fn start_cooldown(&mut self, ability: Ability, duration: Millis) {
        if duration > 0 {
            self.cooldowns.insert(ability, self.now + duration);
        }
    }

    /// Append an event to the log.
    pub fn log(&mut self, event: CombatEvent) {
        tracing::trace!(
            time_ms = event.time_ms,
            ability = %event.ability,
            amount = event.amount,
            outcome = ?event.outcome,
            "combat event"
        );
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcd_and_cooldown_independent() {
        let mut state = SimulationState::new(());
        state.trigger_gcd(0, 1_000);
        state.start_cooldown(Ability::AdrenalineRush, 300_000);

        state.now = 1_000;
        assert!(state.gcd_ready());
        assert!(!state.cooldown_ready(Ability::AdrenalineRush));
        assert!(state.cooldown_ready(Ability::BladeFlurry));

        state.now = 300_000;
        assert!(state.cooldown_ready(Ability::AdrenalineRush));
    }

    #[test]
    fn test_gcd_never_shortened() {
        let mut state = SimulationState::new(());
        state.trigger_gcd(0, 1_500);
        state.trigger_gcd(0, 1_000);
        assert_eq!(state.gcd_until, 1_500);
    }

    #[test]
    fn test_event_builders() {
        let event = CombatEvent::new(100, Ability::ChainHeal, 500, OutcomeKind::Crit)
            .with_overheal(20)
            .with_resource_generated(0);
        assert!(event.is_crit());
        assert!(event.is_cast());
        assert_eq!(event.overheal, 20);
        assert!(!event.with_jump(2).is_cast());
    }
}
