//! Shaman healer: mana, a cast bar and one tanked heal target.
//!
//! The tank loses `incoming_dps` health per second, accumulated every step
//! and capped at its maximum health. Heals are clamped to the missing health;
//! the rest is overheal. Chain Heal's jump targets are modelled as a fixed
//! deficit each, since there is no party to track.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{hasted_cast_ms, CastBar, ManaPool, CASTER_GCD_MS};
use crate::abilities::Ability;
use crate::buffs::{ActiveBuff, Buff};
use crate::calc::heal::jump_factors;
use crate::calc::spell::{SpellDamage, SpellTable};
use crate::calc::{compute_ability_damage, stack_multipliers, AbilityOutcome, CalcContext};
use crate::character::Class;
use crate::clock::{ms_to_secs, Millis};
use crate::engine::Archetype;
use crate::error::{Result, SimError};
use crate::rotation::{Condition, Rotation, RotationCommand};
use crate::state::{CombatEvent, SimulationState};
use crate::stats::CombatantStats;
use crate::talents::{ShamanTalent, TalentSet};

/// Chain Heal jumps after the primary target.
pub const CHAIN_HEAL_JUMPS: usize = 2;

/// Fraction of healing lost per Chain Heal jump.
pub const CHAIN_HEAL_JUMP_REDUCTION: f64 = 0.5;

const HEALING_WAY_DURATION_MS: Millis = 15_000;
const HEALING_WAY_PER_STACK: f64 = 0.06;

/// The tanked target being healed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealTarget {
    /// Maximum health; the deficit never exceeds it.
    pub max_health: f64,
    /// Damage taken per second.
    pub incoming_dps: f64,
    /// Missing health of each Chain Heal jump target.
    pub jump_target_deficit: f64,
}

impl Default for HealTarget {
    fn default() -> Self {
        Self {
            max_health: 8_000.0,
            incoming_dps: 400.0,
            jump_target_deficit: 2_000.0,
        }
    }
}

impl HealTarget {
    fn validate(&self) -> Result<()> {
        if !(self.max_health.is_finite() && self.max_health > 0.0) {
            return Err(SimError::InvalidStats(format!(
                "heal target health must be positive, got {}",
                self.max_health
            )));
        }
        if !(self.incoming_dps.is_finite() && self.incoming_dps >= 0.0) {
            return Err(SimError::InvalidStats(format!(
                "incoming damage must be non-negative, got {}",
                self.incoming_dps
            )));
        }
        if !(self.jump_target_deficit.is_finite() && self.jump_target_deficit >= 0.0) {
            return Err(SimError::InvalidStats(format!(
                "jump target deficit must be non-negative, got {}",
                self.jump_target_deficit
            )));
        }
        Ok(())
    }
}

/// One castable rank of a heal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealRank {
    /// Heal range and coefficient.
    pub heal: SpellDamage,
    /// Unhasted cast time in seconds.
    pub cast_secs: f64,
    /// Base mana cost.
    pub mana: f64,
}

/// Spell data for the shaman's heals.
#[must_use]
pub const fn heal_rank(ability: Ability) -> Option<HealRank> {
    let rank = match ability {
        Ability::HealingWave => HealRank {
            heal: SpellDamage::new(1620.0, 1850.0, 0.857),
            cast_secs: 3.0,
            mana: 560.0,
        },
        Ability::LesserHealingWave => HealRank {
            heal: SpellDamage::new(832.0, 959.0, 0.429),
            cast_secs: 1.5,
            mana: 380.0,
        },
        Ability::ChainHeal => HealRank {
            heal: SpellDamage::new(567.0, 646.0, 0.714),
            cast_secs: 2.5,
            mana: 405.0,
        },
        _ => return None,
    };
    Some(rank)
}

/// Shaman-specific state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShamanPayload {
    /// Mana pool.
    pub mana: ManaPool,
    /// Heal being cast, if any.
    pub cast: Option<CastBar>,
    /// Missing health of the tank.
    pub deficit: f64,
    /// Time up to which incoming damage has been applied.
    pub damage_applied_until: Millis,
}

/// Shaman healer archetype.
#[derive(Debug, Clone)]
pub struct Shaman {
    stats: CombatantStats,
    heal_target: HealTarget,
    talents: TalentSet<ShamanTalent>,
    table: SpellTable,
    chain_factors: Vec<f64>,
}

impl Shaman {
    /// Build the archetype.
    ///
    /// # Errors
    ///
    /// Returns an error if the stats snapshot or the heal target is invalid.
    pub fn new(
        stats: CombatantStats,
        heal_target: HealTarget,
        talents: TalentSet<ShamanTalent>,
    ) -> Result<Self> {
        stats.validate()?;
        heal_target.validate()?;
        let crit = stats.spell_crit + 0.01 * talents.rank_f(ShamanTalent::TidalMastery);
        Ok(Self {
            table: SpellTable::unmissable(crit),
            chain_factors: jump_factors(CHAIN_HEAL_JUMPS, CHAIN_HEAL_JUMP_REDUCTION),
            stats,
            heal_target,
            talents,
        })
    }

    /// Talent ranks.
    #[must_use]
    pub const fn talents(&self) -> &TalentSet<ShamanTalent> {
        &self.talents
    }

    /// The heal target.
    #[must_use]
    pub const fn heal_target(&self) -> &HealTarget {
        &self.heal_target
    }

    /// Heal outcome table.
    #[must_use]
    pub const fn table(&self) -> &SpellTable {
        &self.table
    }

    /// Cast time after talents and spell haste.
    #[must_use]
    pub fn cast_time_ms(&self, ability: Ability) -> Millis {
        let Some(rank) = heal_rank(ability) else {
            return 0;
        };
        let reduction = if ability == Ability::HealingWave {
            0.1 * self.talents.rank_f(ShamanTalent::ImprovedHealingWave)
        } else {
            0.0
        };
        hasted_cast_ms((rank.cast_secs - reduction).max(0.0), self.stats.spell_haste)
    }

    /// Mana cost after Tidal Focus.
    #[must_use]
    pub fn mana_cost(&self, ability: Ability) -> f64 {
        heal_rank(ability).map_or(0.0, |rank| {
            rank.mana * (1.0 - 0.01 * self.talents.rank_f(ShamanTalent::TidalFocus))
        })
    }

    /// Combined healing multiplier for a heal landing now.
    #[must_use]
    pub fn heal_multiplier(&self, ability: Ability, state: &SimulationState<ShamanPayload>) -> f64 {
        let spell = match ability {
            Ability::ChainHeal => 1.0 + 0.1 * self.talents.rank_f(ShamanTalent::ImprovedChainHeal),
            Ability::HealingWave => {
                let stacks = state.buffs.stacks(Buff::HealingWay, state.now);
                1.0 + HEALING_WAY_PER_STACK * f64::from(stacks)
            }
            _ => 1.0,
        };
        stack_multipliers(&[
            1.0 + 0.02 * self.talents.rank_f(ShamanTalent::Purification),
            spell,
        ])
    }

    fn apply_incoming_damage(&self, payload: &mut ShamanPayload, now: Millis) {
        if now <= payload.damage_applied_until {
            return;
        }
        let elapsed = ms_to_secs(now - payload.damage_applied_until);
        payload.deficit = (payload.deficit + self.heal_target.incoming_dps * elapsed)
            .min(self.heal_target.max_health);
        payload.damage_applied_until = now;
    }

    fn heal_context(&self, rank: &HealRank, multiplier: f64, deficit: f64) -> CalcContext<'_> {
        CalcContext::Heal {
            spell: rank.heal,
            healing_power: self.stats.healing_power,
            multiplier,
            table: &self.table,
            deficit,
        }
    }

    fn log_heal(
        state: &mut SimulationState<ShamanPayload>,
        ability: Ability,
        jump: u8,
        outcome: &AbilityOutcome,
    ) {
        state.log(
            CombatEvent::new(state.now, ability, outcome.final_amount, outcome.kind)
                .with_overheal(outcome.overheal)
                .with_jump(jump),
        );
    }

    /// Resolve a completed heal on the tank (and jump targets for Chain Heal).
    fn land_heal<R: Rng + ?Sized>(
        &self,
        ability: Ability,
        state: &mut SimulationState<ShamanPayload>,
        rng: &mut R,
    ) {
        let Some(rank) = heal_rank(ability) else {
            return;
        };
        let multiplier = self.heal_multiplier(ability, state);

        let context = self.heal_context(&rank, multiplier, state.payload.deficit);
        let primary = compute_ability_damage(ability, &context, rng);
        state.payload.deficit = (state.payload.deficit - primary.final_amount as f64).max(0.0);
        Self::log_heal(state, ability, 0, &primary);

        if ability == Ability::ChainHeal {
            for (jump, factor) in (1u8..).zip(self.chain_factors.iter().skip(1)) {
                let context = self.heal_context(
                    &rank,
                    multiplier * factor,
                    self.heal_target.jump_target_deficit,
                );
                let outcome = compute_ability_damage(ability, &context, rng);
                Self::log_heal(state, ability, jump, &outcome);
            }
        }

        if ability == Ability::HealingWave
            && rng.gen::<f64>() < 0.33 * self.talents.rank_f(ShamanTalent::HealingWay)
        {
            state
                .buffs
                .add_stack(Buff::HealingWay, state.now, HEALING_WAY_DURATION_MS);
        }
    }
}

impl Archetype for Shaman {
    type Payload = ShamanPayload;

    fn class(&self) -> Class {
        Class::Shaman
    }

    fn initial_payload(&self) -> ShamanPayload {
        ShamanPayload {
            mana: ManaPool::full(self.stats.max_resource),
            cast: None,
            deficit: 0.0,
            damage_applied_until: 0,
        }
    }

    fn resource(&self, payload: &ShamanPayload) -> f64 {
        payload.mana.current
    }

    fn max_resource(&self) -> f64 {
        self.stats.max_resource.max(0.0)
    }

    fn target_deficit(&self, payload: &ShamanPayload) -> f64 {
        payload.deficit
    }

    fn is_casting(&self, payload: &ShamanPayload) -> bool {
        payload.cast.is_some()
    }

    fn regen(&self, state: &mut SimulationState<ShamanPayload>) {
        let now = state.now;
        state
            .payload
            .mana
            .regen(now, self.stats.mana_per_5, self.stats.spirit_regen);
        self.apply_incoming_damage(&mut state.payload, now);
    }

    fn resolve_scheduled<R: Rng + ?Sized>(
        &self,
        state: &mut SimulationState<ShamanPayload>,
        rng: &mut R,
    ) {
        let Some(cast) = state.payload.cast else {
            return;
        };
        if !cast.is_complete(state.now) {
            return;
        }
        state.payload.cast = None;
        tracing::debug!(
            time_ms = state.now,
            spell = %cast.ability,
            deficit = state.payload.deficit,
            "Cast complete"
        );
        self.land_heal(cast.ability, state, rng);
        state.trigger_gcd(cast.ends_at, CASTER_GCD_MS);
    }

    fn on_buff_expired(&self, expired: &ActiveBuff, state: &mut SimulationState<ShamanPayload>) {
        if expired.buff == Buff::HealingWay {
            tracing::debug!(time_ms = state.now, stacks = expired.stacks, "Healing Way reset");
        }
    }

    fn is_ability_ready(&self, ability: Ability, state: &SimulationState<ShamanPayload>) -> bool {
        ability.castable_by(Class::Shaman)
            && state.gcd_ready()
            && state.payload.cast.is_none()
            && state.cooldown_ready(ability)
            && state.payload.mana.can_afford(self.mana_cost(ability))
    }

    fn try_ability<R: Rng + ?Sized>(
        &self,
        ability: Ability,
        state: &mut SimulationState<ShamanPayload>,
        _rng: &mut R,
    ) -> bool {
        if !self.is_ability_ready(ability, state) {
            return false;
        }
        let now = state.now;
        if !state.payload.mana.spend(self.mana_cost(ability), now) {
            return false;
        }
        state.payload.cast = Some(CastBar {
            ability,
            started_at: now,
            ends_at: now + self.cast_time_ms(ability),
        });
        true
    }

    fn default_rotation(&self) -> Rotation {
        Rotation::from_commands(vec![
            RotationCommand::new(Ability::HealingWave).when(Condition::DeficitAbove(1_500.0)),
            RotationCommand::new(Ability::LesserHealingWave).when(Condition::DeficitAbove(500.0)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack_table::OutcomeKind;
    use crate::engine::Engine;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn healer() -> CombatantStats {
        CombatantStats {
            healing_power: 600.0,
            spell_crit: 0.05,
            max_resource: 7_000.0,
            mana_per_5: 60.0,
            spirit_regen: 30.0,
            ..CombatantStats::default()
        }
    }

    fn shaman(talents: TalentSet<ShamanTalent>) -> Shaman {
        Shaman::new(healer(), HealTarget::default(), talents).unwrap()
    }

    #[test]
    fn test_invalid_heal_target() {
        let target = HealTarget {
            max_health: 0.0,
            ..HealTarget::default()
        };
        let err = Shaman::new(healer(), target, TalentSet::new()).unwrap_err();
        assert!(matches!(err, SimError::InvalidStats(_)));
    }

    #[test]
    fn test_deficit_grows_and_caps() {
        let s = shaman(TalentSet::new());
        let mut state = SimulationState::new(s.initial_payload());
        state.now = 1_000;
        s.regen(&mut state);
        assert!((state.payload.deficit - 400.0).abs() < 1e-9);

        state.now = 100_000;
        s.regen(&mut state);
        assert!((state.payload.deficit - 8_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_talent_costs_and_cast_times() {
        let s = shaman(
            TalentSet::new()
                .with(ShamanTalent::TidalFocus, 5)
                .with(ShamanTalent::ImprovedHealingWave, 5),
        );
        assert!((s.mana_cost(Ability::HealingWave) - 532.0).abs() < 1e-9);
        assert_eq!(s.cast_time_ms(Ability::HealingWave), 2_500);
        assert_eq!(s.cast_time_ms(Ability::ChainHeal), 2_500);
    }

    #[test]
    fn test_heal_clamped_to_deficit() {
        let s = shaman(TalentSet::new());
        let mut state = SimulationState::new(s.initial_payload());
        state.payload.deficit = 300.0;
        let mut rng = StepRng::new(0, 1);
        assert!(s.try_ability(Ability::LesserHealingWave, &mut state, &mut rng));
        assert!(state.events.is_empty());

        state.now = 1_500;
        s.resolve_scheduled(&mut state, &mut rng);
        let event = state.events[0];
        assert_eq!(event.amount, 300);
        assert!(event.overheal > 0);
        assert_eq!(state.payload.deficit, 0.0);
        assert_eq!(state.gcd_until, 3_000);
    }

    #[test]
    fn test_chain_heal_logs_every_target() {
        let s = shaman(TalentSet::new());
        let mut state = SimulationState::new(s.initial_payload());
        state.payload.deficit = 5_000.0;
        let mut rng = StepRng::new(0, 1);
        s.land_heal(Ability::ChainHeal, &mut state, &mut rng);

        assert_eq!(state.events.len(), 3);
        let raw: Vec<u64> = state.events.iter().map(|e| e.amount + e.overheal).collect();
        assert!(raw[0] > raw[1] && raw[1] > raw[2]);
        assert!(state.events.iter().all(|e| e.outcome != OutcomeKind::Miss));
        let jumps: Vec<u8> = state.events.iter().map(|e| e.jump).collect();
        assert_eq!(jumps, vec![0, 1, 2]);
    }

    #[test]
    fn test_chain_heal_cast_count_bounded() {
        let stats = CombatantStats {
            max_resource: 100_000.0,
            ..healer()
        };
        let s = Shaman::new(stats, HealTarget::default(), TalentSet::new()).unwrap();
        let cast_ms = s.cast_time_ms(Ability::ChainHeal);
        let engine = Engine::new(s, 60_000).with_rotation(Rotation::single(Ability::ChainHeal));
        let result = engine.simulate(&mut StdRng::seed_from_u64(1));

        let bound = 60_000 / (cast_ms + CASTER_GCD_MS);
        let casts = result.count_of(Ability::ChainHeal);
        assert!(casts > 0);
        assert!(u64::from(casts) <= bound, "{casts} casts exceeds bound {bound}");
        let logged = result.events.iter().filter(|e| e.ability == Ability::ChainHeal).count();
        assert_eq!(logged, casts as usize * (CHAIN_HEAL_JUMPS + 1));
    }

    #[test]
    fn test_healing_way_boosts_healing_wave_only() {
        let s = shaman(TalentSet::new().with(ShamanTalent::Purification, 5));
        let mut state = SimulationState::new(s.initial_payload());
        state.buffs.add_stack(Buff::HealingWay, 0, HEALING_WAY_DURATION_MS);
        state.buffs.add_stack(Buff::HealingWay, 0, HEALING_WAY_DURATION_MS);
        assert!((s.heal_multiplier(Ability::HealingWave, &state) - 1.1 * 1.12).abs() < 1e-12);
        assert!((s.heal_multiplier(Ability::LesserHealingWave, &state) - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_idle_without_damage() {
        let target = HealTarget {
            incoming_dps: 0.0,
            ..HealTarget::default()
        };
        let engine = Engine::new(Shaman::new(healer(), target, TalentSet::new()).unwrap(), 60_000);
        let result = engine.simulate(&mut StdRng::seed_from_u64(1));
        assert!(result.events.is_empty());
        assert_eq!(result.output_per_second, 0.0);
    }

    #[test]
    fn test_effective_healing_bounded_by_damage_taken() {
        let engine = Engine::new(shaman(TalentSet::new()), 60_000);
        let result = engine.simulate(&mut StdRng::seed_from_u64(2));
        assert!(result.count_of(Ability::HealingWave) + result.count_of(Ability::LesserHealingWave) > 0);
        // The default rotation only heals the tank
        assert!(result.total_output as f64 <= 400.0 * 60.0);
    }
}
