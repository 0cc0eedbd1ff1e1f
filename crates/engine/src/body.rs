use crate::collision::{resolve_axis, Collision, CollisionFlags, CollisionSide, Contact};
use crate::config::{require_non_negative, require_positive, ConfigError};
use crate::frame::FrameError;
use crate::geom::{Axis, IntRect, Rect, Vec2};
use crate::motion::{AxisMotion, MotionModel};
use crate::obstacles::ObstacleSet;

/// Anything that moves through the arena: the player and every boss.
///
/// `position` is the authoritative top-left corner in world units. The
/// rounded [`IntRect`] is what rendering and obstacle pruning see.
#[derive(Debug, Clone, PartialEq)]
pub struct MovableEntity {
    pub position: Vec2,
    size: Vec2,
    pub motion: MotionModel,
    floating_correction: Vec2,
    permitted: Vec2,
    collision_tolerance: f64,
    flags: CollisionFlags,
    physics_enabled: bool,
}

/// Collisions produced by one frame of movement, at most one per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub horizontal: Option<Collision>,
    pub vertical: Option<Collision>,
}

impl StepReport {
    pub fn collisions(&self) -> impl Iterator<Item = Collision> {
        self.horizontal.into_iter().chain(self.vertical)
    }

    pub fn collided(&self) -> bool {
        self.horizontal.is_some() || self.vertical.is_some()
    }

    fn record(&mut self, axis: Axis, collision: Option<Collision>) {
        match axis {
            Axis::Horizontal => self.horizontal = collision,
            Axis::Vertical => self.vertical = collision,
        }
    }
}

impl MovableEntity {
    pub fn try_new(
        context: &'static str,
        position: Vec2,
        width: f64,
        height: f64,
        collision_tolerance: f64,
    ) -> Result<Self, ConfigError> {
        let width = require_positive(context, "width", width)?;
        let height = require_positive(context, "height", height)?;
        let collision_tolerance =
            require_non_negative(context, "collision_tolerance", collision_tolerance)?;
        Ok(Self {
            position,
            size: Vec2 {
                x: width,
                y: height,
            },
            motion: MotionModel::default(),
            floating_correction: Vec2::ZERO,
            permitted: Vec2::ZERO,
            collision_tolerance,
            flags: CollisionFlags::default(),
            physics_enabled: true,
        })
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size.x, self.size.y)
    }

    pub fn int_rect(&self) -> IntRect {
        self.bounding_box().to_int_rect()
    }

    pub fn center(&self) -> Vec2 {
        self.bounding_box().center()
    }

    pub fn collision_tolerance(&self) -> f64 {
        self.collision_tolerance
    }

    pub fn floating_correction(&self, axis: Axis) -> f64 {
        self.floating_correction.component(axis)
    }

    pub(crate) fn set_floating_correction(&mut self, axis: Axis, value: f64) {
        *self.floating_correction.component_mut(axis) = value;
    }

    /// Distance this axis was allowed to move in the latest resolution.
    pub fn permitted(&self, axis: Axis) -> f64 {
        self.permitted.component(axis)
    }

    pub(crate) fn set_permitted(&mut self, axis: Axis, value: f64) {
        *self.permitted.component_mut(axis) = value;
    }

    pub fn collision_flags(&self) -> CollisionFlags {
        self.flags
    }

    pub fn physics_enabled(&self) -> bool {
        self.physics_enabled
    }

    /// One-way switch used when the owner dies.
    pub fn disable_physics(&mut self) {
        self.physics_enabled = false;
        self.motion.stop();
        self.permitted = Vec2::ZERO;
        self.flags.clear();
    }

    pub fn reset_axis(&mut self, axis: Axis, clear_permitted: bool) {
        self.motion.reset_axis(axis);
        if clear_permitted {
            self.set_permitted(axis, 0.0);
        }
    }

    pub fn reset_motion(&mut self, clear_permitted: bool) {
        for axis in Axis::BOTH {
            self.reset_axis(axis, clear_permitted);
        }
    }

    /// Moves the entity without collision, e.g. restoring a saved position.
    pub fn teleport(&mut self, position: Vec2) {
        self.position = position;
        self.floating_correction = Vec2::ZERO;
        self.permitted = Vec2::ZERO;
    }

    pub fn teleport_center(&mut self, center: Vec2) {
        self.teleport(Vec2 {
            x: center.x - self.size.x * 0.5,
            y: center.y - self.size.y * 0.5,
        });
    }

    /// Resolves `distance` against `obstacles`, commits the permitted part and
    /// keeps the entity inside `[0, world_size]`.
    pub fn move_axis(
        &mut self,
        obstacles: &ObstacleSet,
        world_size: Vec2,
        distance: f64,
        axis: Axis,
    ) -> Result<Option<Collision>, FrameError> {
        if !distance.is_finite() {
            return Err(FrameError::NonFiniteDisplacement {
                axis: axis.as_token(),
                value: distance,
            });
        }
        if !self.physics_enabled {
            return Ok(None);
        }

        let resolution = resolve_axis(self, obstacles, distance, axis);
        let boundary = self.commit_axis(axis, world_size);
        let collision = resolution.collision.or(boundary);
        if let Some(collision) = collision {
            self.flags.set(collision.side);
        }
        Ok(collision)
    }

    fn commit_axis(&mut self, axis: Axis, world_size: Vec2) -> Option<Collision> {
        let delta = self.permitted(axis);
        *self.position.component_mut(axis) += delta;

        let extent = self.size.component(axis);
        let limit = world_size.component(axis);
        let min = self.position.component(axis);
        let (clamped_min, direction) = if min < 0.0 {
            (0.0, -1.0)
        } else if min + extent > limit {
            ((limit - extent).max(0.0), 1.0)
        } else {
            return None;
        };

        let allowed = delta - (min - clamped_min);
        *self.position.component_mut(axis) = clamped_min;
        self.set_permitted(axis, allowed);
        self.set_floating_correction(axis, 0.0);
        self.motion.reset_axis(axis);
        Some(Collision {
            side: CollisionSide::leading(axis, direction),
            contact: Contact::Boundary,
        })
    }

    /// Applies an explicit displacement (knockback, scripted paths) through
    /// the resolver, horizontal axis first.
    pub fn displace(
        &mut self,
        obstacles: &ObstacleSet,
        world_size: Vec2,
        delta: Vec2,
    ) -> Result<StepReport, FrameError> {
        self.flags.clear();
        let mut report = StepReport::default();
        for axis in Axis::BOTH {
            let collision = self.move_axis(obstacles, world_size, delta.component(axis), axis)?;
            report.record(axis, collision);
        }
        Ok(report)
    }

    /// Integrates each axis with `displacement_of` and resolves it before the
    /// next axis runs.
    pub fn step_with<F>(
        &mut self,
        obstacles: &ObstacleSet,
        world_size: Vec2,
        mut displacement_of: F,
    ) -> Result<StepReport, FrameError>
    where
        F: FnMut(&mut AxisMotion) -> f64,
    {
        self.flags.clear();
        let mut report = StepReport::default();
        if !self.physics_enabled {
            return Ok(report);
        }
        for axis in Axis::BOTH {
            let distance = displacement_of(self.motion.axis_mut(axis));
            let collision = self.move_axis(obstacles, world_size, distance, axis)?;
            report.record(axis, collision);
        }
        Ok(report)
    }

    pub fn step(
        &mut self,
        obstacles: &ObstacleSet,
        world_size: Vec2,
        dt_seconds: f64,
    ) -> Result<StepReport, FrameError> {
        self.step_with(obstacles, world_size, |axis| axis.integrate(dt_seconds))
    }
}
