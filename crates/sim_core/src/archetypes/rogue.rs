//! Rogue: energy, combo points and dual-wield auto-attacks.
//!
//! Energy ticks every two seconds for 20 (40 under Adrenaline Rush). Builders
//! award combo points on a landed hit; finishers consume them. Each hand's
//! swing timer runs independently of the global cooldown and is rescheduled
//! from the time it fired, so hasted swings never drift onto the step grid.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::abilities::Ability;
use crate::attack_table::{AttackTable, AttackerProfile, OutcomeKind, SwingKind, MELEE_CRIT_MULTIPLIER};
use crate::buffs::Buff;
use crate::calc::melee::WeaponStrike;
use crate::calc::{compute_ability_damage, AbilityOutcome, CalcContext};
use crate::character::Class;
use crate::clock::{Millis, REGEN_TICK_MS};
use crate::engine::Archetype;
use crate::error::Result;
use crate::rotation::{Condition, Rotation, RotationCommand};
use crate::state::{CombatEvent, SimulationState};
use crate::stats::{ppm_chance, CombatantStats, Hand, TargetStats, Weapon, WeaponEnchant, WeaponType};
use crate::talents::{RogueTalent, TalentSet};

/// Combo point cap.
pub const MAX_COMBO_POINTS: u8 = 5;

/// Energy per regeneration tick.
pub const ENERGY_PER_TICK: f64 = 20.0;

/// Rogue global cooldown.
pub const ROGUE_GCD_MS: Millis = 1_000;

/// Eviscerate damage range by combo points spent (index 0 = one point).
pub const EVISCERATE_RANGES: [(f64, f64); 5] = [
    (223.0, 327.0),
    (394.0, 498.0),
    (565.0, 669.0),
    (736.0, 840.0),
    (907.0, 1011.0),
];

const SINISTER_STRIKE_BONUS: f64 = 68.0;
const BACKSTAB_WEAPON_MULTIPLIER: f64 = 1.5;
const BACKSTAB_BONUS: f64 = 210.0;
const EVISCERATE_AP_PER_POINT: f64 = 0.03;
const CRUSADER_ATTACK_POWER: f64 = 100.0;
const CRUSADER_DURATION_MS: Millis = 15_000;
const FIERY_DAMAGE: u64 = 40;
const SLICE_AND_DICE_HASTE: f64 = 1.2;
const BLADE_FLURRY_HASTE: f64 = 1.2;
const COOLDOWN_BUFF_MS: Millis = 15_000;
const ADRENALINE_RUSH_COOLDOWN_MS: Millis = 300_000;
const BLADE_FLURRY_COOLDOWN_MS: Millis = 120_000;
const RELENTLESS_STRIKES_ENERGY: f64 = 25.0;

/// Rogue-specific state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoguePayload {
    /// Current energy.
    pub energy: f64,
    /// Combo points on the target.
    pub combo_points: u8,
    /// Time of the next energy tick.
    pub next_energy_tick: Millis,
    /// Next main-hand swing (`None` without a weapon).
    pub next_main_swing: Option<Millis>,
    /// Next off-hand swing (`None` without a weapon).
    pub next_off_swing: Option<Millis>,
}

impl RoguePayload {
    fn gain_energy(&mut self, amount: f64, max: f64) {
        self.energy = (self.energy + amount).clamp(0.0, max);
    }

    fn add_combo_points(&mut self, points: u8) -> u8 {
        let before = self.combo_points;
        self.combo_points = (self.combo_points + points).min(MAX_COMBO_POINTS);
        self.combo_points - before
    }
}

/// Rogue archetype.
#[derive(Debug, Clone)]
pub struct Rogue {
    stats: CombatantStats,
    target: TargetStats,
    talents: TalentSet<RogueTalent>,
    max_energy: f64,
    white_main: AttackTable,
    white_off: AttackTable,
    builder_table: AttackTable,
    finisher_table: AttackTable,
}

impl Rogue {
    /// Build the archetype, precomputing every attack table.
    ///
    /// # Errors
    ///
    /// Returns an error if the stats snapshot is invalid.
    pub fn new(
        stats: CombatantStats,
        target: TargetStats,
        talents: TalentSet<RogueTalent>,
    ) -> Result<Self> {
        stats.validate()?;
        let dual_wield = stats.is_dual_wielding();
        let main = attacker_profile(&stats, &talents, Hand::Main);
        let off = attacker_profile(&stats, &talents, Hand::Off);
        let lethality = 0.06 * talents.rank_f(RogueTalent::Lethality);
        let max_energy = stats.max_resource + 10.0 * talents.rank_f(RogueTalent::Vigor);

        Ok(Self {
            white_main: AttackTable::new(&main, &target, SwingKind::White, dual_wield),
            white_off: AttackTable::new(&off, &target, SwingKind::White, dual_wield),
            builder_table: AttackTable::new(&main, &target, SwingKind::Special, dual_wield)
                .with_crit_multiplier(MELEE_CRIT_MULTIPLIER + lethality),
            finisher_table: AttackTable::new(&main, &target, SwingKind::Special, dual_wield),
            max_energy,
            stats,
            target,
            talents,
        })
    }

    /// Talent ranks.
    #[must_use]
    pub const fn talents(&self) -> &TalentSet<RogueTalent> {
        &self.talents
    }

    /// Auto-attack table for a hand.
    #[must_use]
    pub const fn white_table(&self, hand: Hand) -> &AttackTable {
        match hand {
            Hand::Main => &self.white_main,
            Hand::Off => &self.white_off,
        }
    }

    /// Attack power including active Crusader procs.
    #[must_use]
    pub fn attack_power(&self, state: &SimulationState<RoguePayload>) -> f64 {
        let crusaders = [Buff::CrusaderMainHand, Buff::CrusaderOffHand]
            .iter()
            .filter(|b| state.buffs.is_active(**b, state.now))
            .count();
        self.stats.attack_power + CRUSADER_ATTACK_POWER * crusaders as f64
    }

    /// Combined swing speed multiplier.
    #[must_use]
    pub fn haste_factor(&self, state: &SimulationState<RoguePayload>) -> f64 {
        let mut factor = 1.0 + self.stats.haste.max(0.0);
        if state.buffs.is_active(Buff::SliceAndDice, state.now) {
            factor *= SLICE_AND_DICE_HASTE;
        }
        if state.buffs.is_active(Buff::BladeFlurry, state.now) {
            factor *= BLADE_FLURRY_HASTE;
        }
        factor
    }

    /// Energy cost of an ability.
    #[must_use]
    pub fn energy_cost(&self, ability: Ability) -> f64 {
        match ability {
            Ability::SinisterStrike => {
                45.0 - match self.talents.rank(RogueTalent::ImprovedSinisterStrike) {
                    0 => 0.0,
                    1 => 3.0,
                    _ => 5.0,
                }
            }
            Ability::Backstab => 60.0,
            Ability::Eviscerate => 35.0,
            Ability::SliceAndDice | Ability::BladeFlurry => 25.0,
            _ => 0.0,
        }
    }

    /// Slice and Dice duration for a number of combo points.
    #[must_use]
    pub fn slice_and_dice_ms(&self, combo_points: u8) -> Millis {
        let base = 9.0 + 3.0 * f64::from(combo_points);
        let bonus = 1.0 + 0.15 * self.talents.rank_f(RogueTalent::ImprovedSliceAndDice);
        crate::clock::secs_to_ms(base * bonus)
    }

    fn swing_interval(&self, weapon: &Weapon, state: &SimulationState<RoguePayload>) -> Millis {
        let interval = weapon.speed_ms() as f64 / self.haste_factor(state);
        (interval.round() as Millis).max(1)
    }

    fn dual_wield_bonus(&self) -> f64 {
        0.05 * self.talents.rank_f(RogueTalent::DualWieldSpecialization)
    }

    fn auto_attack<R: Rng + ?Sized>(
        &self,
        hand: Hand,
        allow_extra: bool,
        state: &mut SimulationState<RoguePayload>,
        rng: &mut R,
    ) {
        let ability = match hand {
            Hand::Main => Ability::MainHandSwing,
            Hand::Off => Ability::OffHandSwing,
        };
        let context = CalcContext::Weapon {
            strike: WeaponStrike::swing(self.stats.weapon(hand), hand, self.attack_power(state))
                .with_dual_wield_bonus(self.dual_wield_bonus()),
            table: self.white_table(hand),
            target: &self.target,
            attacker_level: self.stats.level,
        };
        let outcome = compute_ability_damage(ability, &context, rng);
        state.log(CombatEvent::new(state.now, ability, outcome.final_amount, outcome.kind));
        if outcome.is_landed() {
            self.on_weapon_hit(hand, allow_extra, state, rng);
        }
    }

    /// Procs from a landed weapon strike.
    fn on_weapon_hit<R: Rng + ?Sized>(
        &self,
        hand: Hand,
        allow_extra: bool,
        state: &mut SimulationState<RoguePayload>,
        rng: &mut R,
    ) {
        let Some(weapon) = self.stats.weapon(hand).copied() else {
            return;
        };

        if let Some(enchant) = weapon.enchant {
            if rng.gen::<f64>() < ppm_chance(weapon.speed, enchant.ppm()) {
                match enchant {
                    WeaponEnchant::Crusader => {
                        let buff = match hand {
                            Hand::Main => Buff::CrusaderMainHand,
                            Hand::Off => Buff::CrusaderOffHand,
                        };
                        tracing::debug!(time_ms = state.now, ?hand, "Crusader proc");
                        state.buffs.apply(buff, state.now, CRUSADER_DURATION_MS);
                    }
                    WeaponEnchant::Fiery => {
                        state.log(CombatEvent::new(
                            state.now,
                            Ability::FieryWeapon,
                            FIERY_DAMAGE,
                            OutcomeKind::Hit,
                        ));
                    }
                }
            }
        }

        if hand == Hand::Off && self.talents.has(RogueTalent::CombatPotency) && rng.gen::<f64>() < 0.2 {
            let gain = 3.0 * self.talents.rank_f(RogueTalent::CombatPotency);
            state.payload.gain_energy(gain, self.max_energy);
        }

        if allow_extra
            && weapon.weapon_type == WeaponType::Sword
            && rng.gen::<f64>() < 0.01 * self.talents.rank_f(RogueTalent::SwordSpecialization)
        {
            tracing::debug!(time_ms = state.now, "Sword Specialization extra attack");
            self.auto_attack(Hand::Main, false, state, rng);
        }
    }

    /// Award combo points for a landed builder, including Seal Fate.
    fn award_builder_points<R: Rng + ?Sized>(
        &self,
        outcome: &AbilityOutcome,
        state: &mut SimulationState<RoguePayload>,
        rng: &mut R,
    ) -> u8 {
        if !outcome.is_landed() {
            return 0;
        }
        let mut points = 1;
        if outcome.is_crit() && rng.gen::<f64>() < 0.2 * self.talents.rank_f(RogueTalent::SealFate) {
            points += 1;
        }
        state.payload.add_combo_points(points)
    }

    /// Consume combo points and roll Relentless Strikes and Ruthlessness.
    fn finish<R: Rng + ?Sized>(&self, spent: u8, state: &mut SimulationState<RoguePayload>, rng: &mut R) {
        state.payload.combo_points = 0;
        if self.talents.has(RogueTalent::RelentlessStrikes) && rng.gen::<f64>() < 0.2 * f64::from(spent) {
            state
                .payload
                .gain_energy(RELENTLESS_STRIKES_ENERGY, self.max_energy);
        }
        if rng.gen::<f64>() < 0.2 * self.talents.rank_f(RogueTalent::Ruthlessness) {
            state.payload.add_combo_points(1);
        }
    }

    fn builder<R: Rng + ?Sized>(
        &self,
        ability: Ability,
        state: &mut SimulationState<RoguePayload>,
        rng: &mut R,
    ) {
        let strike = WeaponStrike::swing(self.stats.main_hand.as_ref(), Hand::Main, self.attack_power(state));
        let strike = match ability {
            Ability::Backstab => strike
                .with_special(BACKSTAB_WEAPON_MULTIPLIER, BACKSTAB_BONUS)
                .with_talent_multiplier(1.0 + 0.04 * self.talents.rank_f(RogueTalent::Opportunity)),
            _ => strike
                .with_special(1.0, SINISTER_STRIKE_BONUS)
                .with_talent_multiplier(1.0 + 0.02 * self.talents.rank_f(RogueTalent::Aggression)),
        };
        let context = CalcContext::Weapon {
            strike,
            table: &self.builder_table,
            target: &self.target,
            attacker_level: self.stats.level,
        };
        let outcome = compute_ability_damage(ability, &context, rng);
        let generated = self.award_builder_points(&outcome, state, rng);
        state.log(
            CombatEvent::new(state.now, ability, outcome.final_amount, outcome.kind)
                .with_resource_generated(u32::from(generated)),
        );
        if outcome.is_landed() {
            self.on_weapon_hit(Hand::Main, true, state, rng);
        }
    }

    fn eviscerate<R: Rng + ?Sized>(&self, state: &mut SimulationState<RoguePayload>, rng: &mut R) {
        let points = state.payload.combo_points.clamp(1, MAX_COMBO_POINTS);
        let (min, max) = EVISCERATE_RANGES[usize::from(points - 1)];
        let multiplier = (1.0 + 0.05 * self.talents.rank_f(RogueTalent::ImprovedEviscerate))
            * (1.0 + 0.02 * self.talents.rank_f(RogueTalent::Aggression));
        let context = CalcContext::Finisher {
            min,
            max,
            attack_power: self.attack_power(state),
            coefficient: EVISCERATE_AP_PER_POINT * f64::from(points),
            talent_multiplier: multiplier,
            table: &self.finisher_table,
            target: &self.target,
            attacker_level: self.stats.level,
        };
        let outcome = compute_ability_damage(Ability::Eviscerate, &context, rng);
        state.log(CombatEvent::new(
            state.now,
            Ability::Eviscerate,
            outcome.final_amount,
            outcome.kind,
        ));
        if outcome.is_landed() {
            self.finish(points, state, rng);
        }
    }

    fn slice_and_dice<R: Rng + ?Sized>(&self, state: &mut SimulationState<RoguePayload>, rng: &mut R) {
        let points = state.payload.combo_points;
        state
            .buffs
            .apply(Buff::SliceAndDice, state.now, self.slice_and_dice_ms(points));
        state.log(CombatEvent::new(state.now, Ability::SliceAndDice, 0, OutcomeKind::Hit));
        self.finish(points, state, rng);
    }
}

fn attacker_profile(stats: &CombatantStats, talents: &TalentSet<RogueTalent>, hand: Hand) -> AttackerProfile {
    let weapon_type = stats.weapon(hand).map(|w| w.weapon_type);
    let expertise = match (weapon_type, talents.rank(RogueTalent::WeaponExpertise)) {
        (Some(WeaponType::Sword | WeaponType::Fist | WeaponType::Dagger), 1) => 3,
        (Some(WeaponType::Sword | WeaponType::Fist | WeaponType::Dagger), r) if r >= 2 => 5,
        _ => 0,
    };
    let dagger_crit = if weapon_type == Some(WeaponType::Dagger) {
        0.01 * talents.rank_f(RogueTalent::DaggerSpecialization)
    } else {
        0.0
    };
    AttackerProfile {
        level: stats.level,
        weapon_skill: stats.weapon_skill + expertise,
        hit: stats.hit + 0.01 * talents.rank_f(RogueTalent::Precision),
        crit: stats.crit + 0.01 * talents.rank_f(RogueTalent::Malice) + dagger_crit,
    }
}

impl Archetype for Rogue {
    type Payload = RoguePayload;

    fn class(&self) -> Class {
        Class::Rogue
    }

    fn initial_payload(&self) -> RoguePayload {
        RoguePayload {
            energy: self.max_energy,
            combo_points: 0,
            next_energy_tick: REGEN_TICK_MS,
            next_main_swing: self.stats.main_hand.map(|_| 0),
            next_off_swing: self.stats.off_hand.map(|_| 0),
        }
    }

    fn resource(&self, payload: &RoguePayload) -> f64 {
        payload.energy
    }

    fn max_resource(&self) -> f64 {
        self.max_energy
    }

    fn combo_points(&self, payload: &RoguePayload) -> u8 {
        payload.combo_points
    }

    fn combo_cap(&self) -> u8 {
        MAX_COMBO_POINTS
    }

    fn regen(&self, state: &mut SimulationState<RoguePayload>) {
        while state.now >= state.payload.next_energy_tick {
            let mut gain = ENERGY_PER_TICK;
            if state.buffs.is_active(Buff::AdrenalineRush, state.now) {
                gain *= 2.0;
            }
            state.payload.gain_energy(gain, self.max_energy);
            state.payload.next_energy_tick += REGEN_TICK_MS;
        }
    }

    fn resolve_scheduled<R: Rng + ?Sized>(&self, state: &mut SimulationState<RoguePayload>, rng: &mut R) {
        for hand in [Hand::Main, Hand::Off] {
            let next = match hand {
                Hand::Main => state.payload.next_main_swing,
                Hand::Off => state.payload.next_off_swing,
            };
            let (Some(at), Some(weapon)) = (next, self.stats.weapon(hand)) else {
                continue;
            };
            if state.now < at {
                continue;
            }
            self.auto_attack(hand, true, state, rng);
            let rescheduled = Some(state.now + self.swing_interval(weapon, state));
            match hand {
                Hand::Main => state.payload.next_main_swing = rescheduled,
                Hand::Off => state.payload.next_off_swing = rescheduled,
            }
        }
    }

    fn is_ability_ready(&self, ability: Ability, state: &SimulationState<RoguePayload>) -> bool {
        if !ability.castable_by(Class::Rogue)
            || !state.gcd_ready()
            || !state.cooldown_ready(ability)
            || state.payload.energy < self.energy_cost(ability)
        {
            return false;
        }
        match ability {
            Ability::Backstab => self
                .stats
                .main_hand
                .map_or(true, |w| w.weapon_type == WeaponType::Dagger),
            Ability::Eviscerate | Ability::SliceAndDice => state.payload.combo_points > 0,
            Ability::AdrenalineRush => self.talents.has(RogueTalent::AdrenalineRush),
            Ability::BladeFlurry => self.talents.has(RogueTalent::BladeFlurry),
            _ => true,
        }
    }

    fn try_ability<R: Rng + ?Sized>(
        &self,
        ability: Ability,
        state: &mut SimulationState<RoguePayload>,
        rng: &mut R,
    ) -> bool {
        if !self.is_ability_ready(ability, state) {
            return false;
        }
        state.payload.energy -= self.energy_cost(ability);

        match ability {
            Ability::SinisterStrike | Ability::Backstab => self.builder(ability, state, rng),
            Ability::Eviscerate => self.eviscerate(state, rng),
            Ability::SliceAndDice => self.slice_and_dice(state, rng),
            Ability::AdrenalineRush => {
                state.buffs.apply(Buff::AdrenalineRush, state.now, COOLDOWN_BUFF_MS);
                state.start_cooldown(ability, ADRENALINE_RUSH_COOLDOWN_MS);
                state.log(CombatEvent::new(state.now, ability, 0, OutcomeKind::Hit));
            }
            Ability::BladeFlurry => {
                state.buffs.apply(Buff::BladeFlurry, state.now, COOLDOWN_BUFF_MS);
                state.start_cooldown(ability, BLADE_FLURRY_COOLDOWN_MS);
                state.log(CombatEvent::new(state.now, ability, 0, OutcomeKind::Hit));
            }
            _ => return false,
        }

        state.trigger_gcd(state.now, ROGUE_GCD_MS);
        true
    }

    fn default_rotation(&self) -> Rotation {
        let builder = match self.stats.main_hand {
            Some(Weapon {
                weapon_type: WeaponType::Dagger,
                ..
            }) => Ability::Backstab,
            _ => Ability::SinisterStrike,
        };
        Rotation::from_commands(vec![
            RotationCommand::new(Ability::SliceAndDice).when(Condition::All(vec![
                Condition::BuffMissing(Buff::SliceAndDice),
                Condition::ComboPointsAtLeast(2),
            ])),
            RotationCommand::new(Ability::AdrenalineRush),
            RotationCommand::new(Ability::BladeFlurry),
            RotationCommand::new(Ability::Eviscerate).when(Condition::ComboPointsAtLeast(MAX_COMBO_POINTS)),
            RotationCommand::new(builder),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn combat_rogue() -> CombatantStats {
        CombatantStats {
            attack_power: 1200.0,
            hit: 0.06,
            crit: 0.25,
            main_hand: Some(Weapon::new(80.0, 150.0, 2.6, WeaponType::Sword)),
            off_hand: Some(Weapon::new(60.0, 110.0, 1.8, WeaponType::Dagger)),
            ..CombatantStats::default()
        }
    }

    fn rogue(talents: TalentSet<RogueTalent>) -> Rogue {
        Rogue::new(combat_rogue(), TargetStats::default(), talents).unwrap()
    }

    #[test]
    fn test_weapon_expertise_raises_skill() {
        let talents = TalentSet::new().with(RogueTalent::WeaponExpertise, 2);
        let profile = attacker_profile(&combat_rogue(), &talents, Hand::Main);
        assert_eq!(profile.weapon_skill, 305);
    }

    #[test]
    fn test_energy_costs() {
        let base = rogue(TalentSet::new());
        assert!((base.energy_cost(Ability::SinisterStrike) - 45.0).abs() < f64::EPSILON);
        let improved = rogue(TalentSet::new().with(RogueTalent::ImprovedSinisterStrike, 2));
        assert!((improved.energy_cost(Ability::SinisterStrike) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_slice_and_dice_duration() {
        let r = rogue(TalentSet::new().with(RogueTalent::ImprovedSliceAndDice, 3));
        // (9 + 6) * 1.45 = 21.75s
        assert_eq!(r.slice_and_dice_ms(2), 21_750);
    }

    #[test]
    fn test_energy_regen_doubled_by_adrenaline_rush() {
        let r = rogue(TalentSet::new());
        let mut state = SimulationState::new(r.initial_payload());
        state.payload.energy = 0.0;
        state.now = 2_000;
        r.regen(&mut state);
        assert!((state.payload.energy - 20.0).abs() < f64::EPSILON);

        state.buffs.apply(Buff::AdrenalineRush, 2_000, 15_000);
        state.now = 4_000;
        r.regen(&mut state);
        assert!((state.payload.energy - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_not_ready_without_talent_or_points() {
        let r = rogue(TalentSet::new());
        let state = SimulationState::new(r.initial_payload());
        assert!(!r.is_ability_ready(Ability::AdrenalineRush, &state));
        assert!(!r.is_ability_ready(Ability::Eviscerate, &state));
        assert!(!r.is_ability_ready(Ability::Backstab, &state));
        assert!(!r.is_ability_ready(Ability::Frostbolt, &state));
        assert!(r.is_ability_ready(Ability::SinisterStrike, &state));
    }

    #[test]
    fn test_failed_attempt_spends_nothing() {
        let r = rogue(TalentSet::new());
        let mut state = SimulationState::new(r.initial_payload());
        state.payload.energy = 30.0;
        let mut rng = StepRng::new(0, 1);
        assert!(!r.try_ability(Ability::SinisterStrike, &mut state, &mut rng));
        assert!((state.payload.energy - 30.0).abs() < f64::EPSILON);
        assert!(state.events.is_empty());
        assert!(state.gcd_ready());
    }

    #[test]
    fn test_combo_points_capped() {
        let r = rogue(TalentSet::new().with(RogueTalent::SealFate, 5));
        let engine = Engine::new(r, 120_000).with_rotation(Rotation::single(Ability::SinisterStrike));
        let mut state = engine.new_state();
        let mut rng = StdRng::seed_from_u64(7);
        while !engine.is_finished(&state) {
            engine.advance_step(&mut state, &mut rng);
            assert!(state.payload.combo_points <= MAX_COMBO_POINTS);
        }
        assert_eq!(state.payload.combo_points, MAX_COMBO_POINTS);
    }

    #[test]
    fn test_default_rotation_uses_finishers() {
        let talents = TalentSet::new()
            .with(RogueTalent::AdrenalineRush, 1)
            .with(RogueTalent::BladeFlurry, 1)
            .with(RogueTalent::RelentlessStrikes, 1);
        let engine = Engine::new(rogue(talents), 120_000);
        let result = engine.simulate(&mut StdRng::seed_from_u64(11));
        assert!(result.count_of(Ability::SinisterStrike) > 0);
        assert!(result.count_of(Ability::SliceAndDice) > 0);
        assert!(result.count_of(Ability::Eviscerate) > 0);
        assert_eq!(result.count_of(Ability::AdrenalineRush), 1);
        assert!(result.count_of(Ability::OffHandSwing) > 0);
    }

    #[test]
    fn test_dagger_main_hand_prefers_backstab() {
        let stats = CombatantStats {
            main_hand: Some(Weapon::new(60.0, 110.0, 1.8, WeaponType::Dagger)),
            ..combat_rogue()
        };
        let r = Rogue::new(stats, TargetStats::default(), TalentSet::new()).unwrap();
        let rotation = r.default_rotation();
        assert_eq!(
            rotation.commands().last().map(|c| c.ability),
            Some(Ability::Backstab)
        );
    }

    #[test]
    fn test_crusader_raises_attack_power() {
        let r = rogue(TalentSet::new());
        let mut state = SimulationState::new(r.initial_payload());
        assert!((r.attack_power(&state) - 1200.0).abs() < f64::EPSILON);
        state.buffs.apply(Buff::CrusaderMainHand, 0, CRUSADER_DURATION_MS);
        state.buffs.apply(Buff::CrusaderOffHand, 0, CRUSADER_DURATION_MS);
        assert!((r.attack_power(&state) - 1400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vigor_raises_energy_cap() {
        let r = rogue(TalentSet::new().with(RogueTalent::Vigor, 1));
        assert!((r.max_resource() - 110.0).abs() < f64::EPSILON);
        assert!((r.initial_payload().energy - 110.0).abs() < f64::EPSILON);
    }
}
