use std::f64::consts::{FRAC_PI_3, PI, TAU};

use engine::{
    heading, look_angle, ConfigError, FrameError, Meter, MovableEntity, ObstacleSet, StepReport,
    Timer, TimerTick, Vec2,
};
use tracing::info;

use super::tuning::PlayerTuning;

const STRIKE_HALF_ARC: f64 = FRAC_PI_3;

/// Directional flags plus the aim point, sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PlayerInput {
    pub(crate) up: bool,
    pub(crate) down: bool,
    pub(crate) left: bool,
    pub(crate) right: bool,
    pub(crate) aim: Option<Vec2>,
    pub(crate) strike: bool,
}

impl PlayerInput {
    /// Screen-space angle for the held directions, `None` when they cancel out.
    pub(crate) fn move_angle(&self) -> Option<f64> {
        let dx = f64::from(i8::from(self.right) - i8::from(self.left));
        let dy = f64::from(i8::from(self.up) - i8::from(self.down));
        if dx == 0.0 && dy == 0.0 {
            None
        } else {
            Some(dy.atan2(dx))
        }
    }
}

/// Distance-per-second push supplied by whatever hit the player.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Knockback {
    gradient: Vec2,
}

#[derive(Debug, Clone)]
pub(crate) struct PlayerController {
    body: MovableEntity,
    tuning: PlayerTuning,
    health: Meter,
    energy: Meter,
    look_angle: f64,
    knockback: Option<Knockback>,
    knockback_timer: Timer,
    invincibility: Timer,
    strike_cooldown: Timer,
    knockback_speed: f64,
}

impl PlayerController {
    pub(crate) fn try_new(tuning: &PlayerTuning, spawn: Vec2) -> Result<Self, ConfigError> {
        tuning.validate()?;
        let body = MovableEntity::try_new(
            "player",
            spawn,
            tuning.width,
            tuning.height,
            tuning.collision_tolerance,
        )?;
        Ok(Self {
            body,
            health: Meter::full("player.health", tuning.max_health)?,
            energy: Meter::empty("player.energy", tuning.max_energy)?,
            look_angle: 0.0,
            knockback: None,
            knockback_timer: Timer::inactive(),
            invincibility: Timer::inactive(),
            strike_cooldown: Timer::inactive(),
            knockback_speed: tuning.knockback_distance / (tuning.knockback_ms / 1000.0),
            tuning: tuning.clone(),
        })
    }

    pub(crate) fn body(&self) -> &MovableEntity {
        &self.body
    }

    pub(crate) fn center(&self) -> Vec2 {
        self.body.center()
    }

    pub(crate) fn health(&self) -> &Meter {
        &self.health
    }

    pub(crate) fn energy(&self) -> &Meter {
        &self.energy
    }

    #[cfg(test)]
    pub(crate) fn look_angle(&self) -> f64 {
        self.look_angle
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.health.is_depleted()
    }

    #[cfg(test)]
    pub(crate) fn is_invincible(&self) -> bool {
        self.invincibility.is_active()
    }

    pub(crate) fn strike_range(&self) -> f64 {
        self.tuning.strike_range
    }

    /// Whether `target` lies inside the strike arc around the look angle.
    pub(crate) fn faces(&self, target: Vec2) -> bool {
        let towards = look_angle(self.center(), target);
        let offset = (towards - self.look_angle + PI).rem_euclid(TAU) - PI;
        offset.abs() <= STRIKE_HALF_ARC
    }

    pub(crate) fn update(
        &mut self,
        dt_seconds: f64,
        input: &PlayerInput,
        obstacles: &ObstacleSet,
        world_size: Vec2,
    ) -> Result<StepReport, FrameError> {
        self.invincibility.tick(dt_seconds);
        self.strike_cooldown.tick(dt_seconds);
        if self.is_dead() {
            return Ok(StepReport::default());
        }
        if let Some(aim) = input.aim {
            self.look_angle = look_angle(self.center(), aim);
        }

        if let Some(knockback) = self.knockback {
            let report =
                self.body
                    .displace(obstacles, world_size, knockback.gradient.scaled(dt_seconds))?;
            if self.knockback_timer.tick(dt_seconds) == TimerTick::Expired {
                self.knockback = None;
                self.body.reset_motion(true);
            }
            return Ok(report);
        }

        match input.move_angle() {
            Some(angle) => {
                self.body
                    .motion
                    .set_heading(self.tuning.motion.distance, angle, &self.tuning.motion);
                self.body.step(obstacles, world_size, dt_seconds)
            }
            None => {
                self.body.motion.begin_deceleration();
                let rate = self.tuning.deceleration;
                self.body.step_with(obstacles, world_size, |axis| {
                    axis.decelerate(rate, dt_seconds)
                })
            }
        }
    }

    /// Starts a knockback away from `source` unless the player is still
    /// invincible from the previous hit.
    pub(crate) fn apply_knockback(&mut self, source: Vec2, damage: f64, scale: f64) -> bool {
        if self.is_dead() || self.invincibility.is_active() {
            return false;
        }
        let angle = look_angle(source, self.center());
        let speed = self.knockback_speed * scale;
        self.knockback = Some(Knockback {
            gradient: heading(angle).scaled(speed),
        });
        self.knockback_timer.start(self.tuning.knockback_ms);
        self.invincibility.start(self.tuning.invincibility_ms);
        self.body.reset_motion(true);
        let dealt = -self.health.apply_delta(-damage);
        info!(
            damage = dealt,
            health = self.health.current(),
            angle,
            "player_knockback"
        );
        if self.health.is_depleted() {
            self.body.disable_physics();
        }
        true
    }

    /// Consumes the strike cooldown if it is ready.
    pub(crate) fn try_strike(&mut self) -> Option<f64> {
        if self.is_dead() || self.strike_cooldown.is_active() {
            return None;
        }
        self.strike_cooldown.start(self.tuning.strike_cooldown_ms);
        Some(self.tuning.strike_damage)
    }

    pub(crate) fn reward_hit(&mut self) {
        self.energy.apply_delta(self.tuning.energy_per_hit);
    }
}
