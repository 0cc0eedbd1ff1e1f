use crate::config::{target_velocity, MotionTuning};
use crate::geom::{heading, Axis, Vec2};

/// Accelerated motion along one axis.
///
/// `velocity` (u) ramps toward `target_velocity` (v) at `acceleration` (a) and
/// is clamped so `|u| <= |v|` after every [`AxisMotion::integrate`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisMotion {
    pub velocity: f64,
    pub target_velocity: f64,
    pub acceleration: f64,
    pub displacement: f64,
    decelerating: bool,
}

impl AxisMotion {
    /// Aims this axis at covering `distance` per `time_to_velocity` seconds.
    pub fn set_target(&mut self, distance: f64, tuning: &MotionTuning) {
        self.target_velocity = target_velocity(distance, tuning.time_to_velocity);
        self.acceleration = (self.target_velocity - self.velocity) / tuning.time_to_accelerate;
        self.decelerating = false;
    }

    pub fn integrate(&mut self, dt: f64) -> f64 {
        let target = self.target_velocity;
        let mut applied_acceleration = 0.0;

        if self.velocity != target {
            let toward = (target - self.velocity).signum();
            let rate = self.acceleration.abs() * toward;
            let next = self.velocity + rate * dt;
            let overshot = (target - next).signum() != toward && target != next;
            if overshot || next == target {
                self.velocity = target;
            } else {
                self.velocity = next;
                applied_acceleration = rate;
            }
        }

        if self.velocity.abs() > target.abs() {
            self.velocity = self.velocity.signum() * target.abs();
            applied_acceleration = 0.0;
        }

        self.displacement = self.velocity * dt + 0.5 * applied_acceleration * dt * dt;
        self.displacement
    }

    /// Player-only braking once directional input stops. Clears the
    /// decelerating flag the frame velocity reaches zero.
    pub fn decelerate(&mut self, rate: f64, dt: f64) -> f64 {
        self.target_velocity = 0.0;
        self.acceleration = 0.0;
        if self.velocity == 0.0 {
            self.decelerating = false;
            self.displacement = 0.0;
            return 0.0;
        }

        let step = rate.abs() * dt;
        if self.velocity.abs() <= step {
            self.velocity = 0.0;
            self.decelerating = false;
        } else {
            self.velocity -= self.velocity.signum() * step;
        }
        self.displacement = self.velocity * dt;
        self.displacement
    }

    pub fn begin_deceleration(&mut self) {
        self.decelerating = self.velocity != 0.0;
    }

    pub fn is_decelerating(&self) -> bool {
        self.decelerating
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionModel {
    pub horizontal: AxisMotion,
    pub vertical: AxisMotion,
}

impl MotionModel {
    pub fn axis(&self, axis: Axis) -> &AxisMotion {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisMotion {
        match axis {
            Axis::Horizontal => &mut self.horizontal,
            Axis::Vertical => &mut self.vertical,
        }
    }

    /// Splits `distance` along `angle_radians` so diagonal travel is no
    /// faster than travel along a single axis.
    pub fn set_heading(&mut self, distance: f64, angle_radians: f64, tuning: &MotionTuning) {
        let direction = heading(angle_radians);
        self.horizontal.set_target(distance * direction.x, tuning);
        self.vertical.set_target(distance * direction.y, tuning);
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2 {
            x: self.horizontal.velocity,
            y: self.vertical.velocity,
        }
    }

    pub fn begin_deceleration(&mut self) {
        self.horizontal.begin_deceleration();
        self.vertical.begin_deceleration();
    }

    pub fn is_decelerating(&self) -> bool {
        self.horizontal.is_decelerating() || self.vertical.is_decelerating()
    }

    pub fn is_at_rest(&self) -> bool {
        self.horizontal.velocity == 0.0 && self.vertical.velocity == 0.0
    }

    pub fn reset_axis(&mut self, axis: Axis) {
        self.axis_mut(axis).reset();
    }

    pub fn stop(&mut self) {
        self.horizontal.reset();
        self.vertical.reset();
    }
}
