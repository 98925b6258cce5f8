//! Ability identifiers shared by the event log, rotations and cooldowns.
//!
//! Auto-attacks and proc effects are abilities too so that they show up in the
//! per-ability breakdown, but only [`Ability::castable_by`] abilities can be
//! placed in a rotation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::armor::School;
use crate::character::Class;
use crate::error::SimError;
use crate::talents::normalize_key;

/// Every loggable source of damage or healing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    /// Main-hand auto-attack.
    MainHandSwing,
    /// Off-hand auto-attack.
    OffHandSwing,
    /// Fiery weapon enchant proc.
    FieryWeapon,
    /// Rogue combo builder.
    SinisterStrike,
    /// Rogue dagger combo builder.
    Backstab,
    /// Rogue damage finisher.
    Eviscerate,
    /// Rogue haste finisher.
    SliceAndDice,
    /// Rogue energy regeneration cooldown.
    AdrenalineRush,
    /// Rogue haste cooldown.
    BladeFlurry,
    /// Mage frost nuke.
    Frostbolt,
    /// Mage fire nuke.
    Fireball,
    /// Mage short fire nuke.
    Scorch,
    /// Mage instant fire nuke.
    FireBlast,
    /// Mage damage cooldown.
    ArcanePower,
    /// Mage fire crit burn.
    Ignite,
    /// Shaman large heal.
    HealingWave,
    /// Shaman fast heal.
    LesserHealingWave,
    /// Shaman bouncing heal.
    ChainHeal,
}

impl Ability {
    /// Every ability.
    pub const ALL: &'static [Self] = &[
        Self::MainHandSwing,
        Self::OffHandSwing,
        Self::FieryWeapon,
        Self::SinisterStrike,
        Self::Backstab,
        Self::Eviscerate,
        Self::SliceAndDice,
        Self::AdrenalineRush,
        Self::BladeFlurry,
        Self::Frostbolt,
        Self::Fireball,
        Self::Scorch,
        Self::FireBlast,
        Self::ArcanePower,
        Self::Ignite,
        Self::HealingWave,
        Self::LesserHealingWave,
        Self::ChainHeal,
    ];

    /// Configuration name in `snake_case`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MainHandSwing => "main_hand_swing",
            Self::OffHandSwing => "off_hand_swing",
            Self::FieryWeapon => "fiery_weapon",
            Self::SinisterStrike => "sinister_strike",
            Self::Backstab => "backstab",
            Self::Eviscerate => "eviscerate",
            Self::SliceAndDice => "slice_and_dice",
            Self::AdrenalineRush => "adrenaline_rush",
            Self::BladeFlurry => "blade_flurry",
            Self::Frostbolt => "frostbolt",
            Self::Fireball => "fireball",
            Self::Scorch => "scorch",
            Self::FireBlast => "fire_blast",
            Self::ArcanePower => "arcane_power",
            Self::Ignite => "ignite",
            Self::HealingWave => "healing_wave",
            Self::LesserHealingWave => "lesser_healing_wave",
            Self::ChainHeal => "chain_heal",
        }
    }

    /// Class that may put this ability in a rotation, if any.
    ///
    /// Auto-attacks and procs return `None`.
    #[must_use]
    pub const fn rotation_class(self) -> Option<Class> {
        match self {
            Self::SinisterStrike
            | Self::Backstab
            | Self::Eviscerate
            | Self::SliceAndDice
            | Self::AdrenalineRush
            | Self::BladeFlurry => Some(Class::Rogue),
            Self::Frostbolt
            | Self::Fireball
            | Self::Scorch
            | Self::FireBlast
            | Self::ArcanePower => Some(Class::Mage),
            Self::HealingWave | Self::LesserHealingWave | Self::ChainHeal => Some(Class::Shaman),
            Self::MainHandSwing | Self::OffHandSwing | Self::FieryWeapon | Self::Ignite => None,
        }
    }

    /// Whether `class` may use this ability in a rotation.
    #[must_use]
    pub fn castable_by(self, class: Class) -> bool {
        self.rotation_class() == Some(class)
    }

    /// Damage school.
    #[must_use]
    pub const fn school(self) -> School {
        match self {
            Self::MainHandSwing
            | Self::OffHandSwing
            | Self::SinisterStrike
            | Self::Backstab
            | Self::Eviscerate
            | Self::SliceAndDice
            | Self::AdrenalineRush
            | Self::BladeFlurry => School::Physical,
            Self::FieryWeapon | Self::Fireball | Self::Scorch | Self::FireBlast | Self::Ignite => {
                School::Fire
            }
            Self::Frostbolt => School::Frost,
            Self::ArcanePower => School::Arcane,
            Self::HealingWave | Self::LesserHealingWave | Self::ChainHeal => School::Nature,
        }
    }

    /// Whether the ability heals rather than damages.
    #[must_use]
    pub const fn is_heal(self) -> bool {
        matches!(self, Self::HealingWave | Self::LesserHealingWave | Self::ChainHeal)
    }

    /// Whether the ability deals damage or healing.
    ///
    /// Pure buff abilities are logged but do not count towards outcome rates.
    #[must_use]
    pub const fn deals_output(self) -> bool {
        !matches!(
            self,
            Self::SliceAndDice | Self::AdrenalineRush | Self::BladeFlurry | Self::ArcanePower
        )
    }

    /// Parse a rotation ability for a class.
    pub fn parse_for(raw: &str, class: Class) -> Result<Self, SimError> {
        let ability: Self = raw.parse()?;
        if ability.castable_by(class) {
            Ok(ability)
        } else {
            Err(SimError::AbilityNotAvailable {
                ability: ability.name().to_string(),
                class,
            })
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Ability {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_key(s);
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| SimError::UnknownAbility(s.trim().to_string()))
    }
}
