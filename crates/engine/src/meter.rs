use crate::config::{require_positive, ConfigError};

/// Bounded gameplay value such as health or energy. Deltas are clamped to
/// `[0, max]` instead of being reported as errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meter {
    current: f64,
    max: f64,
}

impl Meter {
    pub fn full(context: &'static str, max: f64) -> Result<Self, ConfigError> {
        let max = require_positive(context, "max", max)?;
        Ok(Self { current: max, max })
    }

    pub fn empty(context: &'static str, max: f64) -> Result<Self, ConfigError> {
        let max = require_positive(context, "max", max)?;
        Ok(Self { current: 0.0, max })
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn fraction(&self) -> f64 {
        self.current / self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// Applies `delta` and returns the change that actually landed.
    pub fn apply_delta(&mut self, delta: f64) -> f64 {
        if !delta.is_finite() {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + delta).clamp(0.0, self.max);
        self.current - before
    }
}
