/// Countdown in milliseconds. `None` means inactive.
///
/// A running timer never holds a negative value: the tick that would take it
/// to zero or below clears it and reports [`TimerTick::Expired`] exactly once,
/// which is where the owner runs its one-shot transition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timer {
    remaining_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Idle,
    Running,
    Expired,
}

impl Timer {
    pub const fn inactive() -> Self {
        Self { remaining_ms: None }
    }

    pub fn started(duration_ms: f64) -> Self {
        let mut timer = Self::inactive();
        timer.start(duration_ms);
        timer
    }

    pub fn start(&mut self, duration_ms: f64) {
        self.remaining_ms = Some(duration_ms.max(0.0));
    }

    pub fn clear(&mut self) {
        self.remaining_ms = None;
    }

    /// Truncates the countdown so the next tick expires it.
    pub fn force_expire(&mut self) {
        self.remaining_ms = Some(0.0);
    }

    pub fn remaining_ms(&self) -> Option<f64> {
        self.remaining_ms
    }

    pub fn is_active(&self) -> bool {
        self.remaining_ms.is_some()
    }

    pub fn tick(&mut self, dt_seconds: f64) -> TimerTick {
        let Some(remaining) = self.remaining_ms else {
            return TimerTick::Idle;
        };
        let next = remaining - dt_seconds * 1000.0;
        if next <= 0.0 {
            self.remaining_ms = None;
            TimerTick::Expired
        } else {
            self.remaining_ms = Some(next);
            TimerTick::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_timer_is_a_noop() {
        let mut timer = Timer::inactive();
        assert_eq!(timer.tick(1.0), TimerTick::Idle);
        assert_eq!(timer.remaining_ms(), None);
    }

    #[test]
    fn running_timer_decreases_by_elapsed_milliseconds() {
        let mut timer = Timer::started(1000.0);
        let mut previous = 1000.0;
        for _ in 0..7 {
            assert_eq!(timer.tick(0.125), TimerTick::Running);
            let remaining = timer.remaining_ms().expect("running");
            assert!(remaining > 0.0);
            assert!((previous - remaining - 125.0).abs() < 1e-9);
            previous = remaining;
        }
        assert_eq!(timer.tick(0.125), TimerTick::Expired);
        assert_eq!(timer.remaining_ms(), None);
        assert_eq!(timer.tick(0.125), TimerTick::Idle);
    }

    #[test]
    fn overshooting_tick_expires_without_going_negative() {
        let mut timer = Timer::started(30.0);
        assert_eq!(timer.tick(0.5), TimerTick::Expired);
        assert!(!timer.is_active());
    }

    #[test]
    fn forced_expiry_fires_on_next_tick() {
        let mut timer = Timer::started(5000.0);
        timer.force_expire();
        assert_eq!(timer.remaining_ms(), Some(0.0));
        assert_eq!(timer.tick(0.0), TimerTick::Expired);
    }

    #[test]
    fn negative_start_is_clamped_to_zero() {
        let timer = Timer::started(-4.0);
        assert_eq!(timer.remaining_ms(), Some(0.0));
    }
}
