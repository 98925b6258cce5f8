//! Archetype implementations of [`crate::engine::Archetype`].
//!
//! - [`rogue`] - energy, combo points, dual-wield auto-attacks
//! - [`mage`] - mana and a cast bar
//! - [`shaman`] - mana, a cast bar and a heal target's missing health
//!
//! The two casters share [`ManaPool`] and [`CastBar`].

pub mod mage;
pub mod rogue;
pub mod shaman;

use serde::{Deserialize, Serialize};

use crate::abilities::Ability;
use crate::clock::{Millis, REGEN_TICK_MS};

/// Caster global cooldown, started when a cast completes.
pub const CASTER_GCD_MS: Millis = 1_500;

/// Window after spending mana during which spirit regeneration stops.
pub const FIVE_SECOND_RULE_MS: Millis = 5_000;

/// Mana with tick-aligned regeneration and the five-second rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManaPool {
    /// Current mana.
    pub current: f64,
    /// Pool size.
    pub max: f64,
    /// Time of the next regeneration tick.
    pub next_tick: Millis,
    /// When mana was last spent.
    pub last_spend: Option<Millis>,
}

impl ManaPool {
    /// Full pool with the first tick one interval away.
    #[must_use]
    pub fn full(max: f64) -> Self {
        let max = max.max(0.0);
        Self {
            current: max,
            max,
            next_tick: REGEN_TICK_MS,
            last_spend: None,
        }
    }

    /// Whether `cost` can be paid.
    #[must_use]
    pub fn can_afford(&self, cost: f64) -> bool {
        self.current >= cost
    }

    /// Pay `cost` if possible. Nothing is spent on failure.
    pub fn spend(&mut self, cost: f64, now: Millis) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        if cost > 0.0 {
            self.current -= cost;
            self.last_spend = Some(now);
        }
        true
    }

    /// Whether spirit regeneration is currently suppressed.
    #[must_use]
    pub fn in_five_second_rule(&self, now: Millis) -> bool {
        self.last_spend
            .is_some_and(|spent| now < spent + FIVE_SECOND_RULE_MS)
    }

    /// Grant every tick whose boundary has been crossed.
    ///
    /// `mana_per_5` always applies (scaled to the tick length); `spirit_per_tick`
    /// only outside the five-second rule. Returns the mana granted.
    pub fn regen(&mut self, now: Millis, mana_per_5: f64, spirit_per_tick: f64) -> f64 {
        let mut granted = 0.0;
        while now >= self.next_tick {
            let mut amount = mana_per_5.max(0.0) * (REGEN_TICK_MS as f64 / 5_000.0);
            if !self.in_five_second_rule(now) {
                amount += spirit_per_tick.max(0.0);
            }
            let before = self.current;
            self.current = (self.current + amount).min(self.max);
            granted += self.current - before;
            self.next_tick += REGEN_TICK_MS;
        }
        granted
    }
}

/// A spell being cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastBar {
    /// Spell being cast.
    pub ability: Ability,
    /// When the cast started.
    pub started_at: Millis,
    /// When the cast completes.
    pub ends_at: Millis,
}

impl CastBar {
    /// Whether the cast has finished at `now`.
    #[must_use]
    pub const fn is_complete(&self, now: Millis) -> bool {
        now >= self.ends_at
    }
}

/// Scale a base cast time by spell haste.
#[must_use]
pub fn hasted_cast_ms(base_secs: f64, spell_haste: f64) -> Millis {
    crate::clock::secs_to_ms(base_secs / (1.0 + spell_haste.max(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_is_check_then_apply() {
        let mut pool = ManaPool::full(300.0);
        assert!(!pool.spend(400.0, 0));
        assert!((pool.current - 300.0).abs() < f64::EPSILON);
        assert!(pool.last_spend.is_none());
        assert!(pool.spend(260.0, 0));
        assert!((pool.current - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_five_second_rule() {
        let mut pool = ManaPool::full(1_000.0);
        pool.spend(500.0, 1_000);
        // Tick at 2s is inside the rule: only mp5 (50 * 0.4 = 20)
        let granted = pool.regen(2_000, 50.0, 30.0);
        assert!((granted - 20.0).abs() < 1e-9);
        // Tick at 6s is outside the rule
        pool.regen(4_000, 50.0, 30.0);
        let granted = pool.regen(6_000, 50.0, 30.0);
        assert!((granted - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_regen_capped_at_max() {
        let mut pool = ManaPool::full(100.0);
        pool.regen(10_000, 500.0, 500.0);
        assert!((pool.current - 100.0).abs() < f64::EPSILON);
        assert_eq!(pool.next_tick, 12_000);
    }

    #[test]
    fn test_hasted_cast() {
        assert_eq!(hasted_cast_ms(3.0, 0.0), 3_000);
        assert_eq!(hasted_cast_ms(3.0, 0.5), 2_000);
        assert_eq!(hasted_cast_ms(3.0, -1.0), 3_000);
    }
}
