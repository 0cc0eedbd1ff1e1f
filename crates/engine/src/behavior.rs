//! Timed action scheduler shared by every boss.
//!
//! A boss type supplies an action enum implementing [`BehaviorAction`]; the
//! scheduler owns one [`ActionSlot`] per variant, the set of actions cooling
//! down, the shared no-action lockout and the one-shot phase gate. What each
//! action *does* stays with the boss.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::marker::PhantomData;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{require_in_range, require_non_negative, require_positive, ConfigError};
use crate::timer::{Timer, TimerTick};

pub trait BehaviorAction: Copy + Eq + Ord + Debug + 'static {
    /// Every variant, in index order.
    const ALL: &'static [Self];

    fn index(self) -> usize;

    fn name(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionTiming {
    pub duration_ms: f64,
    #[serde(default)]
    pub cooldown_ms: Option<f64>,
}

impl ActionTiming {
    pub const fn new(duration_ms: f64, cooldown_ms: Option<f64>) -> Self {
        Self {
            duration_ms,
            cooldown_ms,
        }
    }

    pub fn validate(&self, context: &'static str) -> Result<(), ConfigError> {
        require_positive(context, "duration_ms", self.duration_ms)?;
        if let Some(cooldown_ms) = self.cooldown_ms {
            require_non_negative(context, "cooldown_ms", cooldown_ms)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionSlot {
    timing: ActionTiming,
    pub duration: Timer,
    pub cooldown: Timer,
    pub animation_index: u32,
}

impl ActionSlot {
    fn new(timing: ActionTiming) -> Self {
        Self {
            timing,
            duration: Timer::inactive(),
            cooldown: Timer::inactive(),
            animation_index: 0,
        }
    }

    pub fn timing(&self) -> ActionTiming {
        self.timing
    }
}

/// One slot per action variant, indexed by [`BehaviorAction::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorProfile<A> {
    slots: Vec<ActionSlot>,
    _actions: PhantomData<A>,
}

impl<A: BehaviorAction> BehaviorProfile<A> {
    pub fn try_new<F>(context: &'static str, mut timing_of: F) -> Result<Self, ConfigError>
    where
        F: FnMut(A) -> ActionTiming,
    {
        if A::ALL.is_empty() {
            return Err(ConfigError::EmptyProfile);
        }
        let mut slots = Vec::with_capacity(A::ALL.len());
        for (position, action) in A::ALL.iter().copied().enumerate() {
            if action.index() != position {
                return Err(ConfigError::ActionIndexMismatch {
                    action: action.name(),
                    position,
                    index: action.index(),
                });
            }
            let timing = timing_of(action);
            timing.validate(context)?;
            slots.push(ActionSlot::new(timing));
        }
        Ok(Self {
            slots,
            _actions: PhantomData,
        })
    }

    pub fn slot(&self, action: A) -> &ActionSlot {
        &self.slots[action.index()]
    }

    pub fn slot_mut(&mut self, action: A) -> &mut ActionSlot {
        &mut self.slots[action.index()]
    }

    pub fn is_eligible(&self, action: A) -> bool {
        !self.slot(action).cooldown.is_active()
    }
}

/// Recently finished actions whose cooldown is still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHistory<A> {
    entries: BTreeSet<A>,
}

impl<A> Default for ActionHistory<A> {
    fn default() -> Self {
        Self {
            entries: BTreeSet::new(),
        }
    }
}

impl<A: BehaviorAction> ActionHistory<A> {
    pub fn contains(&self, action: A) -> bool {
        self.entries.contains(&action)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = A> + '_ {
        self.entries.iter().copied()
    }

    fn insert(&mut self, action: A) {
        self.entries.insert(action);
    }

    /// Ticks each entry's cooldown and drops the ones that reached `None`.
    fn tick(&mut self, profile: &mut BehaviorProfile<A>, dt_seconds: f64) -> Vec<A> {
        let mut released = Vec::new();
        self.entries.retain(|action| {
            let cooldown = &mut profile.slot_mut(*action).cooldown;
            match cooldown.tick(dt_seconds) {
                TimerTick::Running => true,
                TimerTick::Expired | TimerTick::Idle => {
                    released.push(*action);
                    false
                }
            }
        });
        released
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Opening,
    Escalated,
}

/// Flips to [`Phase::Escalated`] the first time health drops to the
/// threshold fraction and never flips back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseGate {
    threshold: f64,
    phase: Phase,
}

impl PhaseGate {
    pub fn try_new(context: &'static str, threshold: f64) -> Result<Self, ConfigError> {
        let threshold = require_in_range(context, "phase_threshold", threshold, 0.0, 1.0)?;
        Ok(Self {
            threshold,
            phase: Phase::Opening,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns true only on the call that performs the flip.
    pub fn check(&mut self, health_fraction: f64) -> bool {
        if self.phase == Phase::Escalated || health_fraction > self.threshold {
            return false;
        }
        self.phase = Phase::Escalated;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerTuning {
    pub lockout_ms: f64,
    pub phase_threshold: f64,
    pub escalated_cooldown_multiplier: f64,
}

impl SchedulerTuning {
    pub fn validate(&self, context: &'static str) -> Result<(), ConfigError> {
        require_non_negative(context, "lockout_ms", self.lockout_ms)?;
        require_in_range(context, "phase_threshold", self.phase_threshold, 0.0, 1.0)?;
        require_positive(
            context,
            "escalated_cooldown_multiplier",
            self.escalated_cooldown_multiplier,
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorCore<A> {
    profile: BehaviorProfile<A>,
    history: ActionHistory<A>,
    lockout: Timer,
    tuning: SchedulerTuning,
    cooldown_multiplier: f64,
    phase: PhaseGate,
}

impl<A: BehaviorAction> BehaviorCore<A> {
    pub fn try_new(
        context: &'static str,
        profile: BehaviorProfile<A>,
        tuning: SchedulerTuning,
    ) -> Result<Self, ConfigError> {
        tuning.validate(context)?;
        Ok(Self {
            profile,
            history: ActionHistory::default(),
            lockout: Timer::inactive(),
            phase: PhaseGate::try_new(context, tuning.phase_threshold)?,
            tuning,
            cooldown_multiplier: 1.0,
        })
    }

    pub fn profile(&self) -> &BehaviorProfile<A> {
        &self.profile
    }

    pub fn history(&self) -> &ActionHistory<A> {
        &self.history
    }

    pub fn slot(&self, action: A) -> &ActionSlot {
        self.profile.slot(action)
    }

    pub fn slot_mut(&mut self, action: A) -> &mut ActionSlot {
        self.profile.slot_mut(action)
    }

    pub fn lockout(&self) -> &Timer {
        &self.lockout
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn cooldown_multiplier(&self) -> f64 {
        self.cooldown_multiplier
    }

    pub fn eligible(&self) -> Vec<A> {
        A::ALL
            .iter()
            .copied()
            .filter(|action| self.profile.is_eligible(*action) && !self.history.contains(*action))
            .collect()
    }

    /// Uniform choice among eligible actions, or `None` while the lockout runs.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<A> {
        if self.lockout.is_active() {
            return None;
        }
        self.eligible().choose(rng).copied()
    }

    pub fn start(&mut self, action: A) {
        let slot = self.profile.slot_mut(action);
        slot.duration.start(slot.timing.duration_ms);
        slot.animation_index = 0;
    }

    /// Re-arms the duration for the next stage of a multi-stage action.
    pub fn restart_duration(&mut self, action: A, duration_ms: f64) {
        self.profile.slot_mut(action).duration.start(duration_ms);
    }

    pub fn tick_duration(&mut self, action: A, dt_seconds: f64) -> TimerTick {
        self.profile.slot_mut(action).duration.tick(dt_seconds)
    }

    /// Truncates the running duration so the next tick expires it.
    pub fn interrupt(&mut self, action: A) {
        self.profile.slot_mut(action).duration.force_expire();
    }

    /// Tears the action down: cooldown (scaled by the phase multiplier),
    /// history entry when it has a cooldown, and the shared lockout.
    pub fn finish(&mut self, action: A) -> Option<f64> {
        let multiplier = self.cooldown_multiplier;
        let slot = self.profile.slot_mut(action);
        slot.duration.clear();
        slot.animation_index = 0;
        let cooldown_ms = slot.timing.cooldown_ms.map(|ms| ms * multiplier);
        if let Some(ms) = cooldown_ms {
            slot.cooldown.start(ms);
            self.history.insert(action);
        }
        self.lockout.start(self.tuning.lockout_ms);
        cooldown_ms
    }

    /// Advances the lockout and every history entry's cooldown; returns the
    /// actions that became eligible this tick.
    pub fn tick_timers(&mut self, dt_seconds: f64) -> Vec<A> {
        self.lockout.tick(dt_seconds);
        let released = self.history.tick(&mut self.profile, dt_seconds);
        for action in &released {
            debug!(action = action.name(), "action_cooldown_released");
        }
        released
    }

    /// Evaluates the health threshold; on the single flip it also installs
    /// the escalated cooldown multiplier.
    pub fn check_phase(&mut self, health_fraction: f64) -> bool {
        let flipped = self.phase.check(health_fraction);
        if flipped {
            self.cooldown_multiplier = self.tuning.escalated_cooldown_multiplier;
        }
        flipped
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Move {
        Slam,
        Dash,
        Burst,
    }

    impl BehaviorAction for Move {
        const ALL: &'static [Self] = &[Move::Slam, Move::Dash, Move::Burst];

        fn index(self) -> usize {
            self as usize
        }

        fn name(self) -> &'static str {
            match self {
                Move::Slam => "slam",
                Move::Dash => "dash",
                Move::Burst => "burst",
            }
        }
    }

    fn timing(action: Move) -> ActionTiming {
        match action {
            Move::Slam => ActionTiming::new(500.0, Some(10_000.0)),
            Move::Dash => ActionTiming::new(800.0, Some(4_000.0)),
            Move::Burst => ActionTiming::new(300.0, None),
        }
    }

    fn core() -> BehaviorCore<Move> {
        let profile = BehaviorProfile::try_new("test", timing).expect("profile");
        BehaviorCore::try_new(
            "test",
            profile,
            SchedulerTuning {
                lockout_ms: 1_000.0,
                phase_threshold: 0.5,
                escalated_cooldown_multiplier: 0.5,
            },
        )
        .expect("core")
    }

    #[test]
    fn invalid_timing_fails_profile_construction() {
        let err = BehaviorProfile::<Move>::try_new("test", |_| ActionTiming::new(0.0, None))
            .expect_err("zero duration");
        assert!(matches!(err, ConfigError::NotPositive { field: "duration_ms", .. }));
    }

    #[test]
    fn finished_action_returns_after_exact_cooldown() {
        let mut core = core();
        core.start(Move::Slam);
        assert_eq!(core.finish(Move::Slam), Some(10_000.0));
        assert!(core.history().contains(Move::Slam));

        for _ in 0..99 {
            core.tick_timers(0.1);
            assert!(!core.eligible().contains(&Move::Slam));
        }
        let released = core.tick_timers(0.1);
        assert_eq!(released, vec![Move::Slam]);
        assert!(core.eligible().contains(&Move::Slam));
        assert!(core.history().is_empty());
    }

    #[test]
    fn cooling_actions_are_never_selected() {
        let mut core = core();
        core.finish(Move::Slam);
        core.finish(Move::Dash);
        core.tick_timers(1.5);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(core.select(&mut rng), Some(Move::Burst));
        }
    }

    #[test]
    fn lockout_blocks_selection_until_it_expires() {
        let mut core = core();
        core.finish(Move::Burst);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(core.select(&mut rng), None);
        core.tick_timers(0.5);
        assert_eq!(core.select(&mut rng), None);
        core.tick_timers(0.5);
        assert!(core.select(&mut rng).is_some());
    }

    #[test]
    fn action_without_cooldown_skips_history() {
        let mut core = core();
        assert_eq!(core.finish(Move::Burst), None);
        assert!(core.history().is_empty());
        assert!(core.profile().is_eligible(Move::Burst));
    }

    #[test]
    fn selection_covers_every_eligible_action() {
        let core = core();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = BTreeSet::new();
        for _ in 0..300 {
            if let Some(action) = core.select(&mut rng) {
                seen.insert(action);
            }
        }
        assert_eq!(seen.len(), Move::ALL.len());
    }

    #[test]
    fn interrupt_expires_duration_on_next_tick() {
        let mut core = core();
        core.start(Move::Dash);
        assert_eq!(core.tick_duration(Move::Dash, 0.1), TimerTick::Running);
        core.interrupt(Move::Dash);
        assert_eq!(core.slot(Move::Dash).duration.remaining_ms(), Some(0.0));
        assert_eq!(core.tick_duration(Move::Dash, 0.016), TimerTick::Expired);
    }

    #[test]
    fn phase_flips_once_and_scales_later_cooldowns() {
        let mut core = core();
        assert!(!core.check_phase(0.8));
        assert!(core.check_phase(0.5));
        assert!(!core.check_phase(0.1));
        assert_eq!(core.phase(), Phase::Escalated);
        assert_eq!(core.finish(Move::Dash), Some(2_000.0));
    }
}
