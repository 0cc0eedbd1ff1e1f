use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("frame delta must be finite and non-negative, got {value}")]
    InvalidDelta { value: f64 },
    #[error("displacement on axis {axis} is not finite ({value})")]
    NonFiniteDisplacement { axis: &'static str, value: f64 },
}

/// One fixed-step pass over everything that moves.
pub trait Simulation {
    fn step(&mut self, dt_seconds: f64) -> Result<(), FrameError>;

    /// Lets the driver stop early once the encounter is decided.
    fn is_finished(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub run_for: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            run_for: Duration::from_secs(90),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameMetrics {
    pub frames: u64,
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub dropped_backlog: Duration,
    pub simulated: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

/// Headless fixed-step driver: wall-clock deltas go in, whole simulation
/// ticks come out.
#[derive(Debug)]
pub struct FrameDriver {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    metrics_log_interval: Duration,
    accumulator: Duration,
    since_last_log: Duration,
    ticks_since_last_log: u64,
    metrics: FrameMetrics,
}

impl FrameDriver {
    pub fn new(config: &LoopConfig) -> Self {
        let target_tps = config.target_tps.max(1);
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / f64::from(target_tps)),
            max_frame_delta: normalize_non_zero_duration(
                config.max_frame_delta,
                Duration::from_millis(250),
            ),
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            metrics_log_interval: normalize_non_zero_duration(
                config.metrics_log_interval,
                Duration::from_secs(1),
            ),
            accumulator: Duration::ZERO,
            since_last_log: Duration::ZERO,
            ticks_since_last_log: 0,
            metrics: FrameMetrics::default(),
        }
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn metrics(&self) -> FrameMetrics {
        self.metrics
    }

    /// Feeds one rendered frame's wall-clock delta and runs the ticks it
    /// pays for. Returns how many ticks ran (including skipped ones).
    pub fn advance<S: Simulation + ?Sized>(&mut self, simulation: &mut S, frame_dt: Duration) -> u32 {
        let clamped = frame_dt.min(self.max_frame_delta);
        self.accumulator = self.accumulator.saturating_add(clamped);
        self.metrics.frames = self.metrics.frames.saturating_add(1);

        let plan = plan_sim_steps(self.accumulator, self.fixed_dt, self.max_ticks_per_frame);
        let dt_seconds = self.fixed_dt.as_secs_f64();
        let mut ran = 0;
        for _ in 0..plan.ticks_to_run {
            if simulation.is_finished() {
                break;
            }
            if let Err(error) = simulation.step(dt_seconds) {
                self.metrics.skipped_ticks = self.metrics.skipped_ticks.saturating_add(1);
                warn!(error = %error, tick = self.metrics.ticks, "frame_skipped");
            }
            ran += 1;
            self.metrics.ticks = self.metrics.ticks.saturating_add(1);
            self.metrics.simulated = self.metrics.simulated.saturating_add(self.fixed_dt);
            self.ticks_since_last_log = self.ticks_since_last_log.saturating_add(1);
        }
        self.accumulator = plan.remaining_accumulator;

        if plan.dropped_backlog > Duration::ZERO {
            self.metrics.dropped_backlog =
                self.metrics.dropped_backlog.saturating_add(plan.dropped_backlog);
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }

        self.since_last_log = self.since_last_log.saturating_add(clamped);
        if self.since_last_log >= self.metrics_log_interval {
            let seconds = self.since_last_log.as_secs_f64().max(f64::EPSILON);
            info!(
                tps = self.ticks_since_last_log as f64 / seconds,
                ticks = self.metrics.ticks,
                skipped_ticks = self.metrics.skipped_ticks,
                simulated_ms = self.metrics.simulated.as_millis() as u64,
                "loop_metrics"
            );
            self.since_last_log = Duration::ZERO;
            self.ticks_since_last_log = 0;
        }
        ran
    }
}

/// Rejects deltas that would poison every integrator downstream.
pub fn validate_delta(dt_seconds: f64) -> Result<f64, FrameError> {
    if dt_seconds.is_finite() && dt_seconds >= 0.0 {
        Ok(dt_seconds)
    } else {
        Err(FrameError::InvalidDelta { value: dt_seconds })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        steps: Vec<f64>,
        fail_on: Option<usize>,
        finish_after: Option<usize>,
    }

    impl Simulation for Recorder {
        fn step(&mut self, dt_seconds: f64) -> Result<(), FrameError> {
            self.steps.push(dt_seconds);
            if self.fail_on == Some(self.steps.len()) {
                return Err(FrameError::InvalidDelta { value: f64::NAN });
            }
            Ok(())
        }

        fn is_finished(&self) -> bool {
            self.finish_after.is_some_and(|limit| self.steps.len() >= limit)
        }
    }

    fn config() -> LoopConfig {
        LoopConfig {
            target_tps: 50,
            ..LoopConfig::default()
        }
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);
        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);
        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn driver_carries_partial_ticks_between_frames() {
        let mut driver = FrameDriver::new(&config());
        let mut sim = Recorder::default();
        assert_eq!(driver.advance(&mut sim, Duration::from_millis(30)), 1);
        assert_eq!(driver.advance(&mut sim, Duration::from_millis(10)), 1);
        assert_eq!(sim.steps.len(), 2);
        assert!(sim.steps.iter().all(|dt| (dt - 0.02).abs() < 1e-12));
    }

    #[test]
    fn large_frame_is_clamped_then_backlog_dropped() {
        let mut driver = FrameDriver::new(&LoopConfig {
            target_tps: 100,
            max_ticks_per_frame: 4,
            ..LoopConfig::default()
        });
        let mut sim = Recorder::default();
        assert_eq!(driver.advance(&mut sim, Duration::from_secs(3)), 4);
        let metrics = driver.metrics();
        assert_eq!(metrics.ticks, 4);
        assert_eq!(metrics.dropped_backlog, Duration::from_millis(210));
    }

    #[test]
    fn failing_step_is_counted_and_the_loop_continues() {
        let mut driver = FrameDriver::new(&config());
        let mut sim = Recorder {
            fail_on: Some(2),
            ..Recorder::default()
        };
        driver.advance(&mut sim, Duration::from_millis(80));
        assert_eq!(sim.steps.len(), 4);
        assert_eq!(driver.metrics().skipped_ticks, 1);
        assert_eq!(driver.metrics().ticks, 4);
    }

    #[test]
    fn finished_simulation_stops_consuming_ticks() {
        let mut driver = FrameDriver::new(&config());
        let mut sim = Recorder {
            finish_after: Some(2),
            ..Recorder::default()
        };
        assert_eq!(driver.advance(&mut sim, Duration::from_millis(100)), 2);
    }

    #[test]
    fn validate_delta_rejects_negative_and_nan() {
        assert!(validate_delta(0.016).is_ok());
        assert!(validate_delta(-0.1).is_err());
        assert!(validate_delta(f64::INFINITY).is_err());
    }
}
