//! Mage: mana, a cast bar and fire/frost damage spells.
//!
//! Mana is paid when a cast starts. The spell resolves when the bar
//! completes, and the global cooldown runs from that moment, so a caster
//! repeating one spell finishes at most one cast per `cast + GCD`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{hasted_cast_ms, CastBar, ManaPool, CASTER_GCD_MS};
use crate::abilities::Ability;
use crate::armor::School;
use crate::attack_table::OutcomeKind;
use crate::buffs::{ActiveBuff, Buff};
use crate::calc::spell::{SpellDamage, SpellTable, SPELL_CRIT_MULTIPLIER};
use crate::calc::{
    compute_ability_damage, floor_amount, stack_multipliers, AbilityOutcome, CalcContext,
};
use crate::character::Class;
use crate::clock::Millis;
use crate::engine::Archetype;
use crate::error::Result;
use crate::rotation::{Condition, Rotation, RotationCommand};
use crate::state::{CombatEvent, SimulationState};
use crate::stats::{CombatantStats, TargetStats};
use crate::talents::{MageTalent, TalentSet};

const ARCANE_POWER_DAMAGE: f64 = 1.3;
const ARCANE_POWER_COST: f64 = 1.3;
const ARCANE_POWER_DURATION_MS: Millis = 15_000;
const ARCANE_POWER_COOLDOWN_MS: Millis = 180_000;
const CLEARCASTING_DURATION_MS: Millis = 15_000;
const FIRE_VULNERABILITY_DURATION_MS: Millis = 30_000;
const FIRE_VULNERABILITY_PER_STACK: f64 = 0.03;

/// One castable rank of a damage spell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpellRank {
    /// Damage range and coefficient.
    pub damage: SpellDamage,
    /// Unhasted cast time in seconds (zero for instants).
    pub cast_secs: f64,
    /// Base mana cost.
    pub mana: f64,
    /// Cooldown after use.
    pub cooldown_ms: Millis,
}

/// Spell data for the mage's damage spells.
#[must_use]
pub const fn spell_rank(ability: Ability) -> Option<SpellRank> {
    let rank = match ability {
        Ability::Frostbolt => SpellRank {
            damage: SpellDamage::new(515.0, 555.0, 0.814),
            cast_secs: 3.0,
            mana: 260.0,
            cooldown_ms: 0,
        },
        Ability::Fireball => SpellRank {
            damage: SpellDamage::new(596.0, 760.0, 1.0),
            cast_secs: 3.5,
            mana: 410.0,
            cooldown_ms: 0,
        },
        Ability::Scorch => SpellRank {
            damage: SpellDamage::new(237.0, 280.0, 0.428),
            cast_secs: 1.5,
            mana: 150.0,
            cooldown_ms: 0,
        },
        Ability::FireBlast => SpellRank {
            damage: SpellDamage::new(446.0, 524.0, 0.428),
            cast_secs: 0.0,
            mana: 340.0,
            cooldown_ms: 8_000,
        },
        _ => return None,
    };
    Some(rank)
}

/// Mage-specific state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagePayload {
    /// Mana pool.
    pub mana: ManaPool,
    /// Spell being cast, if any.
    pub cast: Option<CastBar>,
}

/// Mage archetype.
#[derive(Debug, Clone)]
pub struct Mage {
    stats: CombatantStats,
    talents: TalentSet<MageTalent>,
    frost_table: SpellTable,
    fire_table: SpellTable,
}

impl Mage {
    /// Build the archetype, precomputing the fire and frost spell tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the stats snapshot is invalid.
    pub fn new(
        stats: CombatantStats,
        target: TargetStats,
        talents: TalentSet<MageTalent>,
    ) -> Result<Self> {
        stats.validate()?;
        let hit = stats.spell_hit + 0.02 * talents.rank_f(MageTalent::ElementalPrecision);
        let crit = stats.spell_crit + 0.01 * talents.rank_f(MageTalent::ArcaneInstability);

        let frost_table = SpellTable::new(stats.level, target.level, hit, crit)
            .with_crit_multiplier(SPELL_CRIT_MULTIPLIER + 0.1 * talents.rank_f(MageTalent::IceShards));
        let fire_table = SpellTable::new(
            stats.level,
            target.level,
            hit,
            crit + 0.02 * talents.rank_f(MageTalent::CriticalMass),
        );

        Ok(Self {
            stats,
            talents,
            frost_table,
            fire_table,
        })
    }

    /// Talent ranks.
    #[must_use]
    pub const fn talents(&self) -> &TalentSet<MageTalent> {
        &self.talents
    }

    /// Spell table for a school.
    #[must_use]
    pub const fn table(&self, school: School) -> &SpellTable {
        match school {
            School::Frost => &self.frost_table,
            _ => &self.fire_table,
        }
    }

    /// Cast time after talents and spell haste.
    #[must_use]
    pub fn cast_time_ms(&self, ability: Ability) -> Millis {
        let Some(rank) = spell_rank(ability) else {
            return 0;
        };
        let reduction = match ability {
            Ability::Frostbolt => 0.1 * self.talents.rank_f(MageTalent::ImprovedFrostbolt),
            Ability::Fireball => 0.1 * self.talents.rank_f(MageTalent::ImprovedFireball),
            _ => 0.0,
        };
        hasted_cast_ms((rank.cast_secs - reduction).max(0.0), self.stats.spell_haste)
    }

    /// Mana the ability would cost right now.
    ///
    /// Clearcasting makes the next spell free; Arcane Power raises costs.
    #[must_use]
    pub fn mana_cost(&self, ability: Ability, state: &SimulationState<MagePayload>) -> f64 {
        let Some(rank) = spell_rank(ability) else {
            return 0.0;
        };
        if state.buffs.is_active(Buff::Clearcasting, state.now) {
            return 0.0;
        }
        if state.buffs.is_active(Buff::ArcanePower, state.now) {
            rank.mana * ARCANE_POWER_COST
        } else {
            rank.mana
        }
    }

    /// Combined damage multiplier for a spell landing now.
    #[must_use]
    pub fn damage_multiplier(&self, ability: Ability, state: &SimulationState<MagePayload>) -> f64 {
        let school = match ability.school() {
            School::Frost => 1.0 + 0.02 * self.talents.rank_f(MageTalent::PiercingIce),
            School::Fire => {
                let stacks = state.buffs.stacks(Buff::FireVulnerability, state.now);
                (1.0 + 0.02 * self.talents.rank_f(MageTalent::FirePower))
                    * (1.0 + FIRE_VULNERABILITY_PER_STACK * f64::from(stacks))
            }
            _ => 1.0,
        };
        let arcane_power = if state.buffs.is_active(Buff::ArcanePower, state.now) {
            ARCANE_POWER_DAMAGE
        } else {
            1.0
        };
        stack_multipliers(&[
            school,
            1.0 + 0.01 * self.talents.rank_f(MageTalent::ArcaneInstability),
            arcane_power,
        ])
    }

    /// Resolve a damage spell and its procs.
    fn land_spell<R: Rng + ?Sized>(
        &self,
        ability: Ability,
        state: &mut SimulationState<MagePayload>,
        rng: &mut R,
    ) {
        let Some(rank) = spell_rank(ability) else {
            return;
        };
        let school = ability.school();
        let context = CalcContext::Spell {
            spell: rank.damage,
            spell_power: self.stats.spell_power,
            multiplier: self.damage_multiplier(ability, state),
            table: self.table(school),
        };
        let outcome = compute_ability_damage(ability, &context, rng);
        state.log(CombatEvent::new(state.now, ability, outcome.final_amount, outcome.kind));
        self.on_spell_landed(ability, &outcome, state, rng);
    }

    fn on_spell_landed<R: Rng + ?Sized>(
        &self,
        ability: Ability,
        outcome: &AbilityOutcome,
        state: &mut SimulationState<MagePayload>,
        rng: &mut R,
    ) {
        if rng.gen::<f64>() < 0.02 * self.talents.rank_f(MageTalent::ArcaneConcentration) {
            tracing::debug!(time_ms = state.now, "Clearcasting proc");
            state.buffs.apply(Buff::Clearcasting, state.now, CLEARCASTING_DURATION_MS);
        }
        if !outcome.is_landed() {
            return;
        }

        if ability == Ability::Scorch
            && rng.gen::<f64>() < 0.33 * self.talents.rank_f(MageTalent::ImprovedScorch)
        {
            state
                .buffs
                .add_stack(Buff::FireVulnerability, state.now, FIRE_VULNERABILITY_DURATION_MS);
        }

        if ability.school() == School::Fire && outcome.is_crit() && self.talents.has(MageTalent::Ignite) {
            let share = 0.08 * self.talents.rank_f(MageTalent::Ignite);
            let burn = floor_amount(outcome.final_amount as f64 * share);
            state.log(CombatEvent::new(state.now, Ability::Ignite, burn, OutcomeKind::Hit));
        }
    }

    /// Pay for a spell, consuming Clearcasting when it made the spell free.
    fn pay(&self, ability: Ability, state: &mut SimulationState<MagePayload>) -> bool {
        let cost = self.mana_cost(ability, state);
        if !state.payload.mana.spend(cost, state.now) {
            return false;
        }
        if state.buffs.is_active(Buff::Clearcasting, state.now) && spell_rank(ability).is_some() {
            state.buffs.consume(Buff::Clearcasting);
        }
        true
    }

    fn is_fire_specced(&self) -> bool {
        let fire = [
            MageTalent::ImprovedFireball,
            MageTalent::FirePower,
            MageTalent::CriticalMass,
            MageTalent::ImprovedScorch,
            MageTalent::Ignite,
        ];
        let frost = [
            MageTalent::ImprovedFrostbolt,
            MageTalent::IceShards,
            MageTalent::PiercingIce,
        ];
        let points = |talents: &[MageTalent]| -> u32 {
            talents.iter().map(|&t| u32::from(self.talents.rank(t))).sum()
        };
        points(&fire) > points(&frost)
    }
}

impl Archetype for Mage {
    type Payload = MagePayload;

    fn class(&self) -> Class {
        Class::Mage
    }

    fn initial_payload(&self) -> MagePayload {
        MagePayload {
            mana: ManaPool::full(self.stats.max_resource),
            cast: None,
        }
    }

    fn resource(&self, payload: &MagePayload) -> f64 {
        payload.mana.current
    }

    fn max_resource(&self) -> f64 {
        self.stats.max_resource.max(0.0)
    }

    fn is_casting(&self, payload: &MagePayload) -> bool {
        payload.cast.is_some()
    }

    fn regen(&self, state: &mut SimulationState<MagePayload>) {
        let now = state.now;
        state
            .payload
            .mana
            .regen(now, self.stats.mana_per_5, self.stats.spirit_regen);
    }

    fn resolve_scheduled<R: Rng + ?Sized>(
        &self,
        state: &mut SimulationState<MagePayload>,
        rng: &mut R,
    ) {
        let Some(cast) = state.payload.cast else {
            return;
        };
        if !cast.is_complete(state.now) {
            return;
        }
        state.payload.cast = None;
        tracing::debug!(time_ms = state.now, spell = %cast.ability, "Cast complete");
        self.land_spell(cast.ability, state, rng);
        state.trigger_gcd(cast.ends_at, CASTER_GCD_MS);
    }

    fn on_buff_expired(&self, expired: &ActiveBuff, state: &mut SimulationState<MagePayload>) {
        if expired.buff == Buff::FireVulnerability {
            tracing::debug!(time_ms = state.now, stacks = expired.stacks, "Fire Vulnerability dropped");
        }
    }

    fn is_ability_ready(&self, ability: Ability, state: &SimulationState<MagePayload>) -> bool {
        if !ability.castable_by(Class::Mage)
            || !state.gcd_ready()
            || state.payload.cast.is_some()
            || !state.cooldown_ready(ability)
            || !state.payload.mana.can_afford(self.mana_cost(ability, state))
        {
            return false;
        }
        match ability {
            Ability::ArcanePower => self.talents.has(MageTalent::ArcanePower),
            _ => true,
        }
    }

    fn try_ability<R: Rng + ?Sized>(
        &self,
        ability: Ability,
        state: &mut SimulationState<MagePayload>,
        rng: &mut R,
    ) -> bool {
        if !self.is_ability_ready(ability, state) {
            return false;
        }

        if ability == Ability::ArcanePower {
            state
                .buffs
                .apply(Buff::ArcanePower, state.now, ARCANE_POWER_DURATION_MS);
            state.start_cooldown(ability, ARCANE_POWER_COOLDOWN_MS);
            state.log(CombatEvent::new(state.now, ability, 0, OutcomeKind::Hit));
            state.trigger_gcd(state.now, CASTER_GCD_MS);
            return true;
        }

        let Some(rank) = spell_rank(ability) else {
            return false;
        };
        if !self.pay(ability, state) {
            return false;
        }
        state.start_cooldown(ability, rank.cooldown_ms);

        let cast_ms = self.cast_time_ms(ability);
        if cast_ms == 0 {
            self.land_spell(ability, state, rng);
            state.trigger_gcd(state.now, CASTER_GCD_MS);
        } else {
            state.payload.cast = Some(CastBar {
                ability,
                started_at: state.now,
                ends_at: state.now + cast_ms,
            });
        }
        true
    }

    fn default_rotation(&self) -> Rotation {
        let mut commands = vec![RotationCommand::new(Ability::ArcanePower)];
        if self.is_fire_specced() {
            if self.talents.has(MageTalent::ImprovedScorch) {
                commands.push(
                    RotationCommand::new(Ability::Scorch)
                        .when(Condition::BuffMissing(Buff::FireVulnerability)),
                );
            }
            commands.push(RotationCommand::new(Ability::Fireball));
        } else {
            commands.push(RotationCommand::new(Ability::Frostbolt));
        }
        Rotation::from_commands(commands)
    }
}
