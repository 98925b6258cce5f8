//! The time-stepped encounter loop.
//!
//! [`Engine`] owns the phase order; an [`Archetype`] supplies what happens in
//! each phase. There is no per-archetype copy of the loop.
//!
//! # Step Order
//!
//! Every step of `Δt` runs these phases, in this order:
//! 1. **Regen** - grant resource ticks whose boundary was crossed
//! 2. **Scheduled actions** - swing timers and cast completions
//! 3. **Buff sweep** - drop expired buffs and fire expiry hooks
//! 4. **Rotation** - if the global cooldown elapsed and nothing is being
//!    cast, attempt the first eligible command
//! 5. **Advance** - `now += Δt`
//!
//! The loop runs while `now < duration`, so nothing is ever logged at or
//! after the end of the fight.

use std::fmt::Debug;

use rand::Rng;

use crate::abilities::Ability;
use crate::buffs::ActiveBuff;
use crate::character::Class;
use crate::clock::{Millis, DEFAULT_STEP_MS};
use crate::result::SimulationResult;
use crate::rotation::{GuardContext, Rotation};
use crate::state::SimulationState;

/// Per-archetype behaviour plugged into the shared loop.
pub trait Archetype {
    /// Archetype-specific state carried in [`SimulationState::payload`].
    type Payload: Clone + Debug;

    /// Class this archetype simulates.
    fn class(&self) -> Class;

    /// Payload at the start of an iteration.
    fn initial_payload(&self) -> Self::Payload;

    /// Step length.
    fn step_ms(&self) -> Millis {
        DEFAULT_STEP_MS
    }

    /// Current primary resource (energy or mana).
    fn resource(&self, payload: &Self::Payload) -> f64;

    /// Size of the primary resource pool.
    fn max_resource(&self) -> f64;

    /// Combo points held.
    fn combo_points(&self, _payload: &Self::Payload) -> u8 {
        0
    }

    /// Combo point cap (zero when the archetype has none).
    fn combo_cap(&self) -> u8 {
        0
    }

    /// Missing health of the heal target.
    fn target_deficit(&self, _payload: &Self::Payload) -> f64 {
        0.0
    }

    /// Whether a cast bar is running.
    fn is_casting(&self, _payload: &Self::Payload) -> bool {
        false
    }

    /// Phase 1: resource regeneration.
    fn regen(&self, state: &mut SimulationState<Self::Payload>);

    /// Phase 2: swing timers and cast completion.
    fn resolve_scheduled<R: Rng + ?Sized>(
        &self,
        state: &mut SimulationState<Self::Payload>,
        rng: &mut R,
    );

    /// Phase 3 hook, called once per buff removed by the sweep.
    fn on_buff_expired(&self, _expired: &ActiveBuff, _state: &mut SimulationState<Self::Payload>) {
    }

    /// Whether `ability` could be used right now.
    ///
    /// Checks the global cooldown, the ability's cooldown, cost and any
    /// talent or weapon requirement.
    fn is_ability_ready(&self, ability: Ability, state: &SimulationState<Self::Payload>) -> bool;

    /// Attempt `ability`. Returns whether it was used.
    ///
    /// Preconditions are re-checked here; nothing is spent on failure.
    fn try_ability<R: Rng + ?Sized>(
        &self,
        ability: Ability,
        state: &mut SimulationState<Self::Payload>,
        rng: &mut R,
    ) -> bool;

    /// Priority list used when the character has no configured rotation.
    fn default_rotation(&self) -> Rotation;
}

/// Runs encounters for one archetype.
#[derive(Debug, Clone)]
pub struct Engine<A: Archetype> {
    archetype: A,
    rotation: Rotation,
    duration_ms: Millis,
    step_ms: Millis,
}

impl<A: Archetype> Engine<A> {
    /// Engine using the archetype's default rotation.
    #[must_use]
    pub fn new(archetype: A, duration_ms: Millis) -> Self {
        let rotation = archetype.default_rotation();
        let step_ms = archetype.step_ms().max(1);
        Self {
            archetype,
            rotation,
            duration_ms,
            step_ms,
        }
    }

    /// Builder method to replace the rotation.
    ///
    /// An empty rotation leaves only auto-attacks running.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder method to change the step length (minimum 1 ms).
    #[must_use]
    pub fn with_step_ms(mut self, step_ms: Millis) -> Self {
        self.step_ms = step_ms.max(1);
        self
    }

    /// The archetype.
    #[must_use]
    pub const fn archetype(&self) -> &A {
        &self.archetype
    }

    /// The active rotation.
    #[must_use]
    pub const fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    /// Fight length.
    #[must_use]
    pub const fn duration_ms(&self) -> Millis {
        self.duration_ms
    }

    /// Step length.
    #[must_use]
    pub const fn step_ms(&self) -> Millis {
        self.step_ms
    }

    /// Fresh state for a new iteration.
    #[must_use]
    pub fn new_state(&self) -> SimulationState<A::Payload> {
        SimulationState::new(self.archetype.initial_payload())
    }

    /// Whether the fight is over.
    #[must_use]
    pub const fn is_finished(&self, state: &SimulationState<A::Payload>) -> bool {
        state.now >= self.duration_ms
    }

    /// Run one full iteration.
    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulationResult {
        let mut state = self.new_state();
        while !self.is_finished(&state) {
            self.advance_step(&mut state, rng);
        }
        tracing::debug!(
            class = %self.archetype.class(),
            duration_ms = self.duration_ms,
            events = state.events.len(),
            "Iteration complete"
        );
        SimulationResult::from_events(state.events, self.duration_ms)
    }

    /// Advance one step through all five phases.
    pub fn advance_step<R: Rng + ?Sized>(&self, state: &mut SimulationState<A::Payload>, rng: &mut R) {
        // 1. Regen
        self.archetype.regen(state);

        // 2. Swings and cast completion
        self.archetype.resolve_scheduled(state, rng);

        // 3. Buff expiry
        for expired in state.buffs.sweep(state.now) {
            tracing::debug!(time_ms = state.now, buff = %expired.buff, "Buff expired");
            self.archetype.on_buff_expired(&expired, state);
        }

        // 4. Rotation
        if state.gcd_ready() && !self.archetype.is_casting(&state.payload) {
            self.evaluate_rotation(state, rng);
        }

        #[cfg(feature = "debug-validation")]
        self.validate_state(state);

        // 5. Advance
        state.now += self.step_ms;
    }

    /// Attempt the first eligible rotation command.
    ///
    /// Returns the ability used, or `None` if nothing was eligible.
    pub fn evaluate_rotation<R: Rng + ?Sized>(
        &self,
        state: &mut SimulationState<A::Payload>,
        rng: &mut R,
    ) -> Option<Ability> {
        for command in self.rotation.commands() {
            let eligible = command.is_eligible(&self.guard_context(state))
                && self.archetype.is_ability_ready(command.ability, state);
            if eligible && self.archetype.try_ability(command.ability, state, rng) {
                return Some(command.ability);
            }
        }
        None
    }

    /// Snapshot of the values rotation guards can inspect.
    #[must_use]
    pub fn guard_context<'a>(&self, state: &'a SimulationState<A::Payload>) -> GuardContext<'a> {
        GuardContext {
            now: state.now,
            buffs: &state.buffs,
            cooldowns: &state.cooldowns,
            resource: self.archetype.resource(&state.payload),
            combo_points: self.archetype.combo_points(&state.payload),
            deficit: self.archetype.target_deficit(&state.payload),
        }
    }

    #[cfg(feature = "debug-validation")]
    fn validate_state(&self, state: &SimulationState<A::Payload>) {
        let resource = self.archetype.resource(&state.payload);
        debug_assert!(
            (0.0..=self.archetype.max_resource()).contains(&resource),
            "resource {resource} out of bounds at {}ms",
            state.now
        );
        debug_assert!(self.archetype.combo_points(&state.payload) <= self.archetype.combo_cap());
        debug_assert!(state.events.iter().all(|e| e.time_ms < self.duration_ms));
    }
}
