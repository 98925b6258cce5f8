//! Per-archetype talent trees.
//!
//! Each class has a closed enum of talents, so a typo in code is a compile
//! error and a typo in configuration is a [`SimError::UnknownTalent`] raised
//! before the simulation starts. Boolean talents are simply rank-1 talents.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::character::Class;
use crate::error::{Result, SimError};

/// A talent key belonging to one class.
pub trait Talent: Copy + Ord + Debug + Send + Sync + 'static {
    /// Class owning this tree.
    const CLASS: Class;

    /// Every talent in the tree.
    const ALL: &'static [Self];

    /// Configuration name in `snake_case`.
    fn name(self) -> &'static str;

    /// Highest legal rank.
    fn max_rank(self) -> u8;

    /// Look a talent up by configuration name.
    ///
    /// Matching ignores case and treats spaces and dashes as underscores.
    fn from_name(name: &str) -> Option<Self> {
        let normalized = normalize_key(name);
        Self::ALL.iter().copied().find(|t| t.name() == normalized)
    }
}

/// Normalize a configuration key to `snake_case`.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Read-only talent ranks for one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalentSet<T: Talent> {
    ranks: BTreeMap<T, u8>,
}

impl<T: Talent> Default for TalentSet<T> {
    fn default() -> Self {
        Self {
            ranks: BTreeMap::new(),
        }
    }
}

impl<T: Talent> TalentSet<T> {
    /// Empty talent set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method that sets a rank, clamped to the talent's maximum.
    #[must_use]
    pub fn with(mut self, talent: T, rank: u8) -> Self {
        self.ranks.insert(talent, rank.min(talent.max_rank()));
        self
    }

    /// Parse ranks keyed by configuration name.
    ///
    /// Unknown names and out-of-range ranks are errors.
    pub fn from_names<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a u8)>,
    {
        let mut set = Self::new();
        for (name, &rank) in entries {
            let talent = T::from_name(name).ok_or_else(|| SimError::UnknownTalent {
                class: T::CLASS,
                name: name.clone(),
            })?;
            if rank > talent.max_rank() {
                return Err(SimError::TalentRankOutOfRange {
                    name: talent.name().to_string(),
                    rank,
                    max: talent.max_rank(),
                });
            }
            set.ranks.insert(talent, rank);
        }
        Ok(set)
    }

    /// Rank of a talent (zero when not taken).
    #[must_use]
    pub fn rank(&self, talent: T) -> u8 {
        self.ranks.get(&talent).copied().unwrap_or(0)
    }

    /// Rank as a float, for multiplying into formulas.
    #[must_use]
    pub fn rank_f(&self, talent: T) -> f64 {
        f64::from(self.rank(talent))
    }

    /// Whether at least one point is spent in the talent.
    #[must_use]
    pub fn has(&self, talent: T) -> bool {
        self.rank(talent) > 0
    }

    /// Total points spent.
    #[must_use]
    pub fn points_spent(&self) -> u32 {
        self.ranks.values().map(|&r| u32::from(r)).sum()
    }
}

macro_rules! talent_tree {
    (
        $(#[$meta:meta])*
        $name:ident for $class:expr => {
            $( $(#[$vmeta:meta])* $variant:ident = ($key:literal, $max:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl Talent for $name {
            const CLASS: Class = $class;
            const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

            fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $key ),+
                }
            }

            fn max_rank(self) -> u8 {
                match self {
                    $( Self::$variant => $max ),+
                }
            }
        }
    };
}

talent_tree! {
    /// Rogue talents.
    RogueTalent for Class::Rogue => {
        /// +1% crit per rank.
        Malice = ("malice", 5),
        /// +1% melee hit per rank.
        Precision = ("precision", 5),
        /// +6% crit damage bonus on combo builders per rank.
        Lethality = ("lethality", 5),
        /// +2% Sinister Strike and Eviscerate damage per rank.
        Aggression = ("aggression", 3),
        /// +5% Eviscerate damage per rank.
        ImprovedEviscerate = ("improved_eviscerate", 3),
        /// Sinister Strike costs 3/5 less energy.
        ImprovedSinisterStrike = ("improved_sinister_strike", 2),
        /// +15% Slice and Dice duration per rank.
        ImprovedSliceAndDice = ("improved_slice_and_dice", 3),
        /// 20% chance per combo point spent to restore 25 energy.
        RelentlessStrikes = ("relentless_strikes", 1),
        /// 20% chance per rank for a finisher to award a combo point.
        Ruthlessness = ("ruthlessness", 3),
        /// 20% chance per rank for a builder crit to award an extra combo point.
        SealFate = ("seal_fate", 5),
        /// +5% off-hand damage factor per rank.
        DualWieldSpecialization = ("dual_wield_specialization", 5),
        /// +1% crit per rank with daggers.
        DaggerSpecialization = ("dagger_specialization", 5),
        /// 1% chance per rank on a sword hit to gain an extra attack.
        SwordSpecialization = ("sword_specialization", 5),
        /// +3/+5 weapon skill with swords, fists and daggers.
        WeaponExpertise = ("weapon_expertise", 2),
        /// +4% Backstab damage per rank.
        Opportunity = ("opportunity", 5),
        /// 20% chance on off-hand hits to gain 3 energy per rank.
        CombatPotency = ("combat_potency", 5),
        /// +10 maximum energy.
        Vigor = ("vigor", 1),
        /// Grants Adrenaline Rush.
        AdrenalineRush = ("adrenaline_rush", 1),
        /// Grants Blade Flurry.
        BladeFlurry = ("blade_flurry", 1),
    }
}

talent_tree! {
    /// Mage talents.
    MageTalent for Class::Mage => {
        /// -0.1s Frostbolt cast time per rank.
        ImprovedFrostbolt = ("improved_frostbolt", 5),
        /// -0.1s Fireball cast time per rank.
        ImprovedFireball = ("improved_fireball", 5),
        /// +0.1 frost crit multiplier per rank.
        IceShards = ("ice_shards", 5),
        /// +2% frost damage per rank.
        PiercingIce = ("piercing_ice", 3),
        /// +2% fire damage per rank.
        FirePower = ("fire_power", 5),
        /// +2% fire crit per rank.
        CriticalMass = ("critical_mass", 3),
        /// +2% fire and frost spell hit per rank.
        ElementalPrecision = ("elemental_precision", 3),
        /// +1% spell damage and crit per rank.
        ArcaneInstability = ("arcane_instability", 3),
        /// 2% chance per rank for a cast to make the next spell free.
        ArcaneConcentration = ("arcane_concentration", 5),
        /// 33% chance per rank for Scorch to apply Fire Vulnerability.
        ImprovedScorch = ("improved_scorch", 3),
        /// Fire crits burn for an extra 8% per rank of the crit.
        Ignite = ("ignite", 5),
        /// Grants Arcane Power.
        ArcanePower = ("arcane_power", 1),
    }
}

talent_tree! {
    /// Shaman (restoration) talents.
    ShamanTalent for Class::Shaman => {
        /// +2% healing per rank.
        Purification = ("purification", 5),
        /// +1% heal crit per rank.
        TidalMastery = ("tidal_mastery", 5),
        /// -0.1s Healing Wave cast time per rank.
        ImprovedHealingWave = ("improved_healing_wave", 5),
        /// -1% heal mana cost per rank.
        TidalFocus = ("tidal_focus", 5),
        /// +10% Chain Heal healing per rank.
        ImprovedChainHeal = ("improved_chain_heal", 2),
        /// 33% chance per rank for Healing Wave to apply Healing Way.
        HealingWay = ("healing_way", 3),
    }
}
