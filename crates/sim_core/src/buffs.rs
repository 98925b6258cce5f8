//! Timed buffs and debuffs.
//!
//! A buff is active while `now < expires_at`. A buff whose remaining
//! duration is zero is never active, even before the expiry sweep removes it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::error::SimError;
use crate::talents::normalize_key;

/// Every timed effect the engine tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Buff {
    /// Rogue melee haste finisher.
    SliceAndDice,
    /// Rogue doubled energy regeneration.
    AdrenalineRush,
    /// Rogue melee haste cooldown.
    BladeFlurry,
    /// Crusader proc from the main hand.
    CrusaderMainHand,
    /// Crusader proc from the off hand.
    CrusaderOffHand,
    /// Mage damage and mana cost increase.
    ArcanePower,
    /// Mage free next spell.
    Clearcasting,
    /// Stacking fire damage taken debuff on the target.
    FireVulnerability,
    /// Stacking Healing Wave bonus on the heal target.
    HealingWay,
}

impl Buff {
    /// Every buff.
    pub const ALL: &'static [Self] = &[
        Self::SliceAndDice,
        Self::AdrenalineRush,
        Self::BladeFlurry,
        Self::CrusaderMainHand,
        Self::CrusaderOffHand,
        Self::ArcanePower,
        Self::Clearcasting,
        Self::FireVulnerability,
        Self::HealingWay,
    ];

    /// Configuration name in `snake_case`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SliceAndDice => "slice_and_dice",
            Self::AdrenalineRush => "adrenaline_rush",
            Self::BladeFlurry => "blade_flurry",
            Self::CrusaderMainHand => "crusader_main_hand",
            Self::CrusaderOffHand => "crusader_off_hand",
            Self::ArcanePower => "arcane_power",
            Self::Clearcasting => "clearcasting",
            Self::FireVulnerability => "fire_vulnerability",
            Self::HealingWay => "healing_way",
        }
    }

    /// Stack cap (1 for non-stacking buffs).
    #[must_use]
    pub const fn max_stacks(self) -> u8 {
        match self {
            Self::FireVulnerability => 5,
            Self::HealingWay => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for Buff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Buff {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_key(s);
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.name() == normalized)
            .ok_or_else(|| SimError::UnknownBuff(s.trim().to_string()))
    }
}

/// A buff currently applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBuff {
    /// Which buff.
    pub buff: Buff,
    /// Time at which the buff stops being active.
    pub expires_at: Millis,
    /// Current stack count (at least 1).
    pub stacks: u8,
}

/// The set of active buffs, at most one entry per [`Buff`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffList {
    active: Vec<ActiveBuff>,
}

impl BuffList {
    /// Empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply or refresh a buff for `duration` from `now`.
    ///
    /// Refreshing a live buff resets the timer and keeps the stack count; an
    /// entry that has lapsed but not been swept starts over at one stack. A
    /// zero duration is ignored.
    pub fn apply(&mut self, buff: Buff, now: Millis, duration: Millis) {
        if duration == 0 {
            return;
        }
        let expires_at = now + duration;
        match self.active.iter_mut().find(|b| b.buff == buff) {
            Some(existing) => {
                if existing.expires_at <= now {
                    existing.stacks = 1;
                }
                existing.expires_at = expires_at;
            }
            None => self.active.push(ActiveBuff {
                buff,
                expires_at,
                stacks: 1,
            }),
        }
    }

    /// Apply a buff and add one stack (up to the cap), refreshing the timer.
    pub fn add_stack(&mut self, buff: Buff, now: Millis, duration: Millis) {
        if duration == 0 {
            return;
        }
        let expires_at = now + duration;
        match self.active.iter_mut().find(|b| b.buff == buff) {
            Some(existing) if existing.expires_at > now => {
                existing.expires_at = expires_at;
                existing.stacks = (existing.stacks + 1).min(buff.max_stacks());
            }
            Some(existing) => {
                existing.expires_at = expires_at;
                existing.stacks = 1;
            }
            None => self.active.push(ActiveBuff {
                buff,
                expires_at,
                stacks: 1,
            }),
        }
    }

    /// Remove a buff immediately (e.g. a consumed proc).
    pub fn consume(&mut self, buff: Buff) -> bool {
        let before = self.active.len();
        self.active.retain(|b| b.buff != buff);
        self.active.len() != before
    }

    /// Whether `buff` has remaining duration at `now`.
    #[must_use]
    pub fn is_active(&self, buff: Buff, now: Millis) -> bool {
        self.get(buff, now).is_some()
    }

    /// Active entry for `buff` at `now`.
    #[must_use]
    pub fn get(&self, buff: Buff, now: Millis) -> Option<&ActiveBuff> {
        self.active
            .iter()
            .find(|b| b.buff == buff && b.expires_at > now)
    }

    /// Stack count of `buff` at `now` (zero when inactive).
    #[must_use]
    pub fn stacks(&self, buff: Buff, now: Millis) -> u8 {
        self.get(buff, now).map_or(0, |b| b.stacks)
    }

    /// Drop every buff with `expires_at <= now`, returning what expired.
    pub fn sweep(&mut self, now: Millis) -> Vec<ActiveBuff> {
        let mut expired = Vec::new();
        self.active.retain(|b| {
            if b.expires_at <= now {
                expired.push(*b);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Number of entries, including any not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Iterate over held entries.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveBuff> {
        self.active.iter()
    }
}
