//! Character definitions and class dispatch.
//!
//! A [`CharacterSpec`] is the serde-facing description of a build. It is
//! validated once by [`Simulator::from_spec`], which resolves talent names,
//! parses the rotation and picks the archetype engine for the class.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::archetypes::mage::Mage;
use crate::archetypes::rogue::Rogue;
use crate::archetypes::shaman::{HealTarget, Shaman};
use crate::clock::{secs_to_ms, Millis};
use crate::engine::Engine;
use crate::error::{Result, SimError};
use crate::result::SimulationResult;
use crate::rotation::Rotation;
use crate::stats::{CombatantStats, TargetStats};
use crate::talents::{MageTalent, RogueTalent, ShamanTalent, Talent, TalentSet};

/// Playable class, one per archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Class {
    /// Melee, energy and combo points.
    Rogue,
    /// Caster, mana and a cast bar.
    Mage,
    /// Healer, mana and a heal target.
    Shaman,
}

impl Class {
    /// All classes.
    pub const ALL: [Self; 3] = [Self::Rogue, Self::Mage, Self::Shaman];

    /// Lowercase class name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rogue => "rogue",
            Self::Mage => "mage",
            Self::Shaman => "shaman",
        }
    }

    /// Whether the class's output is healing rather than damage.
    #[must_use]
    pub const fn is_healer(self) -> bool {
        matches!(self, Self::Shaman)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn default_duration() -> f64 {
    60.0
}

fn default_iterations() -> u32 {
    1_000
}

/// A character build to simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSpec {
    /// Display name.
    pub name: String,
    /// Class.
    pub class: Class,
    /// Talent ranks by name.
    #[serde(default)]
    pub talents: BTreeMap<String, u8>,
    /// Stat snapshot.
    #[serde(default)]
    pub stats: CombatantStats,
    /// Enemy being attacked.
    #[serde(default)]
    pub target: TargetStats,
    /// Tank being healed (healers only).
    #[serde(default)]
    pub heal_target: HealTarget,
    /// Fight length in seconds.
    #[serde(default = "default_duration")]
    pub fight_duration_secs: f64,
    /// Iterations per batch.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Rotation commands; empty selects the class default.
    #[serde(default)]
    pub rotation: Vec<String>,
    /// First seed for batch runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl CharacterSpec {
    /// Spec with default stats for a class.
    #[must_use]
    pub fn new(name: impl Into<String>, class: Class) -> Self {
        Self {
            name: name.into(),
            class,
            talents: BTreeMap::new(),
            stats: CombatantStats::default(),
            target: TargetStats::default(),
            heal_target: HealTarget::default(),
            fight_duration_secs: default_duration(),
            iterations: default_iterations(),
            rotation: Vec::new(),
            seed: None,
        }
    }

    /// Builder method to set a talent rank.
    #[must_use]
    pub fn with_talent(mut self, name: impl Into<String>, rank: u8) -> Self {
        self.talents.insert(name.into(), rank);
        self
    }

    /// Builder method to set the stats.
    #[must_use]
    pub fn with_stats(mut self, stats: CombatantStats) -> Self {
        self.stats = stats;
        self
    }

    /// Builder method to set the fight length.
    #[must_use]
    pub const fn with_duration(mut self, secs: f64) -> Self {
        self.fight_duration_secs = secs;
        self
    }

    /// Fight length in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the duration is negative or not finite.
    pub fn duration_ms(&self) -> Result<Millis> {
        if !(self.fight_duration_secs.is_finite() && self.fight_duration_secs >= 0.0) {
            return Err(SimError::InvalidStats(format!(
                "fight duration must be non-negative, got {}",
                self.fight_duration_secs
            )));
        }
        Ok(secs_to_ms(self.fight_duration_secs))
    }

    fn talent_set<T: Talent>(&self) -> Result<TalentSet<T>> {
        TalentSet::from_names(&self.talents)
    }
}

/// An engine for one class, selected at configuration time.
#[derive(Debug, Clone)]
pub enum Simulator {
    /// Rogue engine.
    Rogue(Engine<Rogue>),
    /// Mage engine.
    Mage(Engine<Mage>),
    /// Shaman engine.
    Shaman(Engine<Shaman>),
}

impl Simulator {
    /// Validate a spec and build its engine.
    ///
    /// Every configuration problem (unknown talent, bad rank, malformed
    /// rotation, ability from another class, invalid stats) is reported here.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn from_spec(spec: &CharacterSpec) -> Result<Self> {
        let duration_ms = spec.duration_ms()?;
        let rotation = if spec.rotation.is_empty() {
            None
        } else {
            Some(Rotation::parse(&spec.rotation, spec.class)?)
        };

        let simulator = match spec.class {
            Class::Rogue => {
                let talents = spec.talent_set::<RogueTalent>()?;
                Self::Rogue(Engine::new(Rogue::new(spec.stats.clone(), spec.target, talents)?, duration_ms))
            }
            Class::Mage => {
                let talents = spec.talent_set::<MageTalent>()?;
                Self::Mage(Engine::new(Mage::new(spec.stats.clone(), spec.target, talents)?, duration_ms))
            }
            Class::Shaman => {
                let talents = spec.talent_set::<ShamanTalent>()?;
                Self::Shaman(Engine::new(
                    Shaman::new(spec.stats.clone(), spec.heal_target, talents)?,
                    duration_ms,
                ))
            }
        };

        tracing::debug!(
            character = %spec.name,
            class = %spec.class,
            talent_points = spec.talents.values().map(|&r| u32::from(r)).sum::<u32>(),
            custom_rotation = rotation.is_some(),
            "Simulator configured"
        );

        Ok(match rotation {
            Some(rotation) => simulator.with_rotation(rotation),
            None => simulator,
        })
    }

    /// Builder method to replace the rotation.
    #[must_use]
    pub fn with_rotation(self, rotation: Rotation) -> Self {
        match self {
            Self::Rogue(engine) => Self::Rogue(engine.with_rotation(rotation)),
            Self::Mage(engine) => Self::Mage(engine.with_rotation(rotation)),
            Self::Shaman(engine) => Self::Shaman(engine.with_rotation(rotation)),
        }
    }

    /// Class being simulated.
    #[must_use]
    pub const fn class(&self) -> Class {
        match self {
            Self::Rogue(_) => Class::Rogue,
            Self::Mage(_) => Class::Mage,
            Self::Shaman(_) => Class::Shaman,
        }
    }

    /// Fight length.
    #[must_use]
    pub const fn duration_ms(&self) -> Millis {
        match self {
            Self::Rogue(engine) => engine.duration_ms(),
            Self::Mage(engine) => engine.duration_ms(),
            Self::Shaman(engine) => engine.duration_ms(),
        }
    }

    /// Active rotation.
    #[must_use]
    pub const fn rotation(&self) -> &Rotation {
        match self {
            Self::Rogue(engine) => engine.rotation(),
            Self::Mage(engine) => engine.rotation(),
            Self::Shaman(engine) => engine.rotation(),
        }
    }

    /// Run one iteration with a fresh state.
    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulationResult {
        match self {
            Self::Rogue(engine) => engine.simulate(rng),
            Self::Mage(engine) => engine.simulate(rng),
            Self::Shaman(engine) => engine.simulate(rng),
        }
    }
}
