//! Rotations: ordered ability lists with guard predicates.
//!
//! Guards are a small typed AST. The text form used in character files is
//! parsed once, before the simulation starts:
//!
//! ```text
//! eviscerate if cp>=5 & buff:slice_and_dice
//! slice_and_dice if !buff:slice_and_dice & cp>=2
//! fire_blast if cd:fire_blast & mana>340
//! healing_wave if deficit>1500
//! ```
//!
//! | Guard          | Meaning                                   |
//! |----------------|-------------------------------------------|
//! | `buff:x`       | buff `x` is active                        |
//! | `!buff:x`      | buff `x` is not active                    |
//! | `cd:x`         | ability `x` is off cooldown               |
//! | `<res>>N`      | primary resource above `N`                |
//! | `<res><N`      | primary resource below `N`                |
//! | `cp>=N`        | at least `N` combo points                 |
//! | `deficit>N`    | heal target missing more than `N` health  |
//!
//! `<res>` is any of `resource`, `energy` or `mana`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::abilities::Ability;
use crate::buffs::{Buff, BuffList};
use crate::character::Class;
use crate::clock::Millis;
use crate::error::{Result, SimError};

/// Values a guard can inspect at the moment it is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    /// Current simulated time.
    pub now: Millis,
    /// Active buffs.
    pub buffs: &'a BuffList,
    /// Per-ability cooldown expiries.
    pub cooldowns: &'a BTreeMap<Ability, Millis>,
    /// Primary resource level.
    pub resource: f64,
    /// Combo points held.
    pub combo_points: u8,
    /// Heal target health deficit.
    pub deficit: f64,
}

/// A guard predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Buff is active.
    BuffActive(Buff),
    /// Buff is not active.
    BuffMissing(Buff),
    /// Ability cooldown has elapsed.
    CooldownReady(Ability),
    /// Resource strictly above the threshold.
    ResourceAbove(f64),
    /// Resource strictly below the threshold.
    ResourceBelow(f64),
    /// Combo points at or above the threshold.
    ComboPointsAtLeast(u8),
    /// Heal target deficit strictly above the threshold.
    DeficitAbove(f64),
    /// Every inner condition holds. An empty list always holds.
    All(Vec<Condition>),
}

impl Condition {
    /// Evaluate the guard.
    #[must_use]
    pub fn holds(&self, ctx: &GuardContext<'_>) -> bool {
        match self {
            Self::BuffActive(buff) => ctx.buffs.is_active(*buff, ctx.now),
            Self::BuffMissing(buff) => !ctx.buffs.is_active(*buff, ctx.now),
            Self::CooldownReady(ability) => ctx
                .cooldowns
                .get(ability)
                .map_or(true, |&ready_at| ready_at <= ctx.now),
            Self::ResourceAbove(threshold) => ctx.resource > *threshold,
            Self::ResourceBelow(threshold) => ctx.resource < *threshold,
            Self::ComboPointsAtLeast(points) => ctx.combo_points >= *points,
            Self::DeficitAbove(threshold) => ctx.deficit > *threshold,
            Self::All(conditions) => conditions.iter().all(|c| c.holds(ctx)),
        }
    }

    /// Parse a single guard term.
    pub fn parse(term: &str) -> Result<Self> {
        let term = term.trim();
        let malformed = |reason: &str| SimError::MalformedRotation {
            command: term.to_string(),
            reason: reason.to_string(),
        };

        if let Some(name) = term.strip_prefix("!buff:") {
            return Ok(Self::BuffMissing(name.parse()?));
        }
        if let Some(name) = term.strip_prefix("buff:") {
            return Ok(Self::BuffActive(name.parse()?));
        }
        if let Some(name) = term.strip_prefix("cd:") {
            return Ok(Self::CooldownReady(name.parse()?));
        }
        if let Some(value) = term.strip_prefix("cp>=") {
            let points = value
                .trim()
                .parse::<u8>()
                .map_err(|_| malformed("combo point threshold must be a small integer"))?;
            return Ok(Self::ComboPointsAtLeast(points));
        }
        if let Some(value) = term.strip_prefix("deficit>") {
            return Ok(Self::DeficitAbove(parse_threshold(value).ok_or_else(|| {
                malformed("deficit threshold must be a number")
            })?));
        }
        for resource in ["resource", "energy", "mana"] {
            let Some(rest) = term.strip_prefix(resource) else {
                continue;
            };
            if let Some(value) = rest.strip_prefix('>') {
                return parse_threshold(value)
                    .map(Self::ResourceAbove)
                    .ok_or_else(|| malformed("resource threshold must be a number"));
            }
            if let Some(value) = rest.strip_prefix('<') {
                return parse_threshold(value)
                    .map(Self::ResourceBelow)
                    .ok_or_else(|| malformed("resource threshold must be a number"));
            }
        }
        Err(malformed("unrecognised guard"))
    }
}

fn parse_threshold(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuffActive(buff) => write!(f, "buff:{buff}"),
            Self::BuffMissing(buff) => write!(f, "!buff:{buff}"),
            Self::CooldownReady(ability) => write!(f, "cd:{ability}"),
            Self::ResourceAbove(v) => write!(f, "resource>{v}"),
            Self::ResourceBelow(v) => write!(f, "resource<{v}"),
            Self::ComboPointsAtLeast(v) => write!(f, "cp>={v}"),
            Self::DeficitAbove(v) => write!(f, "deficit>{v}"),
            Self::All(conditions) => {
                for (i, c) in conditions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
        }
    }
}

/// One rotation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationCommand {
    /// Ability to attempt.
    pub ability: Ability,
    /// Guard that must hold for the attempt to be made.
    pub guard: Option<Condition>,
}

impl RotationCommand {
    /// Unguarded command.
    #[must_use]
    pub const fn new(ability: Ability) -> Self {
        Self {
            ability,
            guard: None,
        }
    }

    /// Builder method to attach a guard.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.guard = Some(condition);
        self
    }

    /// Whether the guard (if any) holds.
    #[must_use]
    pub fn is_eligible(&self, ctx: &GuardContext<'_>) -> bool {
        self.guard.as_ref().map_or(true, |g| g.holds(ctx))
    }

    /// Parse `"<ability> [if <guard> [& <guard>...]]"` for a class.
    pub fn parse(line: &str, class: Class) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(SimError::MalformedRotation {
                command: line.to_string(),
                reason: "empty command".into(),
            });
        }
        let (ability_part, guard_part) = match line.split_once(" if ") {
            Some((ability, guard)) => (ability, Some(guard)),
            None => (line, None),
        };
        let ability = Ability::parse_for(ability_part, class)?;
        let guard = match guard_part {
            None => None,
            Some(raw) => {
                let mut terms = raw
                    .split('&')
                    .map(|term| {
                        if term.trim().is_empty() {
                            Err(SimError::MalformedRotation {
                                command: line.to_string(),
                                reason: "empty guard term".into(),
                            })
                        } else {
                            Condition::parse(term)
                        }
                    })
                    .collect::<Result<Vec<_>>>()?;
                if terms.len() == 1 {
                    terms.pop()
                } else {
                    Some(Condition::All(terms))
                }
            }
        };
        Ok(Self { ability, guard })
    }
}

impl fmt::Display for RotationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.guard {
            Some(guard) => write!(f, "{} if {guard}", self.ability),
            None => write!(f, "{}", self.ability),
        }
    }
}

/// An ordered priority list of commands.
///
/// An empty rotation never acts, which leaves only auto-attacks running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    commands: Vec<RotationCommand>,
}

impl Rotation {
    /// Rotation that never uses an ability.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from already-typed commands.
    #[must_use]
    pub fn from_commands(commands: Vec<RotationCommand>) -> Self {
        Self { commands }
    }

    /// Rotation that always tries a single ability.
    #[must_use]
    pub fn single(ability: Ability) -> Self {
        Self::from_commands(vec![RotationCommand::new(ability)])
    }

    /// Parse text commands for a class.
    pub fn parse<S: AsRef<str>>(lines: &[S], class: Class) -> Result<Self> {
        let commands = lines
            .iter()
            .map(|line| RotationCommand::parse(line.as_ref(), class))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { commands })
    }

    /// Commands in priority order.
    #[must_use]
    pub fn commands(&self) -> &[RotationCommand] {
        &self.commands
    }

    /// Whether there are no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        buffs: &'a BuffList,
        cooldowns: &'a BTreeMap<Ability, Millis>,
        resource: f64,
        combo_points: u8,
    ) -> GuardContext<'a> {
        GuardContext {
            now: 5_000,
            buffs,
            cooldowns,
            resource,
            combo_points,
            deficit: 0.0,
        }
    }

    #[test]
    fn test_parse_compound_guard() {
        let cmd =
            RotationCommand::parse("eviscerate if cp>=5 & buff:slice_and_dice", Class::Rogue)
                .unwrap();
        assert_eq!(cmd.ability, Ability::Eviscerate);
        assert_eq!(
            cmd.guard,
            Some(Condition::All(vec![
                Condition::ComboPointsAtLeast(5),
                Condition::BuffActive(Buff::SliceAndDice),
            ]))
        );
    }

    #[test]
    fn test_parse_single_guards() {
        assert_eq!(
            Condition::parse("!buff:slice_and_dice").unwrap(),
            Condition::BuffMissing(Buff::SliceAndDice)
        );
        assert_eq!(
            Condition::parse("cd:fire_blast").unwrap(),
            Condition::CooldownReady(Ability::FireBlast)
        );
        assert_eq!(Condition::parse("mana>500").unwrap(), Condition::ResourceAbove(500.0));
        assert_eq!(Condition::parse("energy<40").unwrap(), Condition::ResourceBelow(40.0));
        assert_eq!(Condition::parse("deficit>1500").unwrap(), Condition::DeficitAbove(1500.0));
    }

    #[test]
    fn test_malformed_commands() {
        assert!(matches!(
            RotationCommand::parse("eviscerate if cp>=five", Class::Rogue),
            Err(SimError::MalformedRotation { .. })
        ));
        assert!(matches!(
            RotationCommand::parse("eviscerate if health>5", Class::Rogue),
            Err(SimError::MalformedRotation { .. })
        ));
        assert!(matches!(
            RotationCommand::parse("eviscerate if cp>=5 &", Class::Rogue),
            Err(SimError::MalformedRotation { .. })
        ));
        assert!(matches!(
            RotationCommand::parse("eviscerate if buff:bloodlust", Class::Rogue),
            Err(SimError::UnknownBuff(_))
        ));
        assert!(matches!(
            RotationCommand::parse("fireball", Class::Rogue),
            Err(SimError::AbilityNotAvailable { .. })
        ));
        assert!(RotationCommand::parse("   ", Class::Rogue).is_err());
    }

    #[test]
    fn test_guard_evaluation() {
        let mut buffs = BuffList::new();
        buffs.apply(Buff::SliceAndDice, 0, 10_000);
        let mut cooldowns = BTreeMap::new();
        cooldowns.insert(Ability::AdrenalineRush, 6_000);
        let c = ctx(&buffs, &cooldowns, 50.0, 3);

        assert!(Condition::BuffActive(Buff::SliceAndDice).holds(&c));
        assert!(!Condition::BuffMissing(Buff::SliceAndDice).holds(&c));
        assert!(!Condition::CooldownReady(Ability::AdrenalineRush).holds(&c));
        assert!(Condition::CooldownReady(Ability::BladeFlurry).holds(&c));
        assert!(Condition::ResourceAbove(40.0).holds(&c));
        assert!(!Condition::ResourceAbove(50.0).holds(&c));
        assert!(Condition::ComboPointsAtLeast(3).holds(&c));
        assert!(!Condition::ComboPointsAtLeast(4).holds(&c));
        assert!(Condition::All(vec![]).holds(&c));
    }

    #[test]
    fn test_display_round_trips() {
        let line = "slice_and_dice if !buff:slice_and_dice & cp>=2";
        let cmd = RotationCommand::parse(line, Class::Rogue).unwrap();
        assert_eq!(cmd.to_string(), line);
        assert_eq!(RotationCommand::parse(&cmd.to_string(), Class::Rogue).unwrap(), cmd);
    }

    #[test]
    fn test_parse_rotation() {
        let rotation = Rotation::parse(&["scorch if !buff:fire_vulnerability", "fireball"], Class::Mage)
            .unwrap();
        assert_eq!(rotation.commands().len(), 2);
        assert!(Rotation::empty().is_empty());
    }
}
