use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::obstacles::TileGridError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{context}: {field} must be a finite value greater than zero, got {value}")]
    NotPositive {
        context: &'static str,
        field: &'static str,
        value: f64,
    },
    #[error("{context}: {field} must be a finite value of zero or more, got {value}")]
    Negative {
        context: &'static str,
        field: &'static str,
        value: f64,
    },
    #[error("{context}: {field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        context: &'static str,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("behavior action {action} is listed at position {position} but reports index {index}")]
    ActionIndexMismatch {
        action: &'static str,
        position: usize,
        index: usize,
    },
    #[error("behavior profile has no actions")]
    EmptyProfile,
    #[error(transparent)]
    TileGrid(#[from] TileGridError),
}

pub fn require_positive(
    context: &'static str,
    field: &'static str,
    value: f64,
) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive {
            context,
            field,
            value,
        })
    }
}

pub fn require_non_negative(
    context: &'static str,
    field: &'static str,
    value: f64,
) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative {
            context,
            field,
            value,
        })
    }
}

pub fn require_in_range(
    context: &'static str,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            context,
            field,
            value,
            min,
            max,
        })
    }
}

/// Distance/time pair that defines a maneuver's target velocity.
///
/// `distance` is covered in `time_to_velocity` seconds at constant speed;
/// `time_to_accelerate` is how long the ramp from the current velocity takes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionTuning {
    pub distance: f64,
    pub time_to_velocity: f64,
    pub time_to_accelerate: f64,
}

impl MotionTuning {
    pub fn validate(&self, context: &'static str) -> Result<(), ConfigError> {
        require_non_negative(context, "distance", self.distance)?;
        require_positive(context, "time_to_velocity", self.time_to_velocity)?;
        require_positive(context, "time_to_accelerate", self.time_to_accelerate)?;
        Ok(())
    }

    pub fn target_speed(&self) -> f64 {
        target_velocity(self.distance, self.time_to_velocity)
    }

    pub fn with_distance(self, distance: f64) -> Self {
        Self { distance, ..self }
    }
}

pub fn target_velocity(distance: f64, time_to_velocity: f64) -> f64 {
    2.0 * distance / (2.0 * time_to_velocity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_time_to_velocity_is_rejected() {
        let tuning = MotionTuning {
            distance: 100.0,
            time_to_velocity: 0.0,
            time_to_accelerate: 0.2,
        };
        let err = tuning.validate("player.motion").expect_err("invalid");
        assert_eq!(
            err,
            ConfigError::NotPositive {
                context: "player.motion",
                field: "time_to_velocity",
                value: 0.0,
            }
        );
    }

    #[test]
    fn nan_acceleration_time_is_rejected() {
        let tuning = MotionTuning {
            distance: 100.0,
            time_to_velocity: 1.0,
            time_to_accelerate: f64::NAN,
        };
        assert!(tuning.validate("boss.chase").is_err());
    }

    #[test]
    fn target_speed_is_distance_over_time() {
        let tuning = MotionTuning {
            distance: 300.0,
            time_to_velocity: 1.5,
            time_to_accelerate: 0.25,
        };
        assert!(tuning.validate("ok").is_ok());
        assert!((tuning.target_speed() - 200.0).abs() < 1e-12);
    }

    #[test]
    fn motion_tuning_reads_from_json() {
        let tuning: MotionTuning = serde_json::from_str(
            r#"{"distance": 240.0, "time_to_velocity": 1.2, "time_to_accelerate": 0.1}"#,
        )
        .expect("json");
        assert!((tuning.target_speed() - 200.0).abs() < 1e-9);
    }
}
