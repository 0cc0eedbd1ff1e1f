use engine::{
    heading, look_angle, BehaviorAction, BehaviorProfile, ConfigError, FrameError, MovableEntity,
    Phase, TimerTick, Vec2,
};

use super::boss::{Boss, BossFrame, BossShell, BossView, ContactHit};
use super::events::FrameEvent;
use super::projectiles::Projectile;
use super::tuning::WardenTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum WardenAction {
    Orbit,
    Sleep,
    Volley,
}

impl BehaviorAction for WardenAction {
    const ALL: &'static [Self] = &[Self::Orbit, Self::Sleep, Self::Volley];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Orbit => "orbit",
            Self::Sleep => "sleep",
            Self::Volley => "volley",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum WardenState {
    Chase,
    /// `perch` is the top-left corner restored when the orbit ends.
    Orbit { pivot: Vec2, perch: Vec2, angle: f64 },
    Sleep,
    Volley,
    Death,
}

/// Ranged boss that keeps its distance, circles the player and naps.
#[derive(Debug, Clone)]
pub(crate) struct Warden {
    shell: BossShell<WardenAction>,
    tuning: WardenTuning,
    state: WardenState,
    shards: u32,
}

impl Warden {
    pub(crate) fn try_new(tuning: &WardenTuning, spawn: Vec2) -> Result<Self, ConfigError> {
        tuning.validate()?;
        let profile = BehaviorProfile::try_new("warden", |action| match action {
            WardenAction::Orbit => tuning.orbit,
            WardenAction::Sleep => tuning.sleep,
            WardenAction::Volley => tuning.volley,
        })?;
        let shell = BossShell::try_new("warden", &tuning.body, spawn, profile, tuning.scheduler)?;
        Ok(Self {
            shell,
            tuning: tuning.clone(),
            state: WardenState::Chase,
            shards: 0,
        })
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> WardenState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn shards(&self) -> u32 {
        self.shards
    }

    fn volley_angles(&self, base: f64) -> Vec<f64> {
        let count = self.tuning.volley_projectiles + self.shards;
        if count <= 1 {
            return vec![base];
        }
        let spread = self.tuning.volley_spread;
        let step = spread / f64::from(count - 1);
        (0..count)
            .map(|index| base - spread * 0.5 + step * f64::from(index))
            .collect()
    }

    fn begin(&mut self, action: WardenAction, frame: &mut BossFrame<'_>) {
        let center = self.shell.body.center();
        self.shell.body.reset_motion(true);
        self.state = match action {
            WardenAction::Orbit => WardenState::Orbit {
                pivot: frame.player_center,
                perch: self.shell.body.position,
                angle: look_angle(frame.player_center, center),
            },
            WardenAction::Sleep => WardenState::Sleep,
            WardenAction::Volley => {
                let base = look_angle(center, frame.player_center);
                for angle in self.volley_angles(base) {
                    frame.projectiles.push(Projectile::fire(
                        center,
                        angle,
                        self.tuning.projectile_speed,
                        self.tuning.projectile_damage,
                    ));
                    frame.events.emit(FrameEvent::ProjectileFired {
                        origin: center,
                        angle,
                    });
                }
                WardenState::Volley
            }
        };
        self.shell.start(action, frame.events);
    }

    fn end(&mut self, action: WardenAction, frame: &mut BossFrame<'_>) {
        if let WardenState::Orbit { perch, .. } = self.state {
            self.shell.body.teleport(perch);
            if self.shell.core.phase() == Phase::Escalated {
                self.shards = (self.shards + 1).min(self.tuning.max_shards);
            }
        }
        self.shell.body.reset_motion(true);
        self.shell.finish(action, frame.events);
        self.state = WardenState::Chase;
    }

    fn update_orbit(
        &mut self,
        frame: &mut BossFrame<'_>,
        pivot: Vec2,
        perch: Vec2,
        angle: f64,
    ) -> Result<(), FrameError> {
        let angle = angle + self.tuning.orbit_angular_speed * frame.dt_seconds;
        let desired = pivot + heading(angle).scaled(self.tuning.orbit_radius);
        let delta = desired - self.shell.body.center();
        self.shell.displace(frame, delta)?;
        self.state = WardenState::Orbit {
            pivot,
            perch,
            angle,
        };
        Ok(())
    }

    fn running_action(&self) -> Option<WardenAction> {
        match self.state {
            WardenState::Orbit { .. } => Some(WardenAction::Orbit),
            WardenState::Sleep => Some(WardenAction::Sleep),
            WardenState::Volley => Some(WardenAction::Volley),
            WardenState::Chase | WardenState::Death => None,
        }
    }
}

impl Boss for Warden {
    fn name(&self) -> &'static str {
        self.shell.name
    }

    fn body(&self) -> &MovableEntity {
        &self.shell.body
    }

    fn view(&self) -> BossView {
        let action = match (self.state, self.running_action()) {
            (WardenState::Death, _) => "death",
            (_, Some(action)) => action.name(),
            (_, None) => "chase",
        };
        BossView {
            action,
            stage: None,
            animation_index: self
                .running_action()
                .map_or(0, |action| self.shell.animation_index(action)),
            health_fraction: self.shell.health.fraction(),
            phase: self.shell.core.phase(),
        }
    }

    fn is_dead(&self) -> bool {
        self.state == WardenState::Death
    }

    fn update(&mut self, frame: &mut BossFrame<'_>) -> Result<(), FrameError> {
        if self.state == WardenState::Death {
            return Ok(());
        }
        if self.shell.health.is_depleted() {
            self.state = WardenState::Death;
            self.shell.enter_death(frame.events);
            return Ok(());
        }

        self.shell.core.tick_timers(frame.dt_seconds);
        let Some(action) = self.running_action() else {
            self.shell.check_phase(frame.events);
            if let Some(action) = self.shell.select() {
                self.begin(action, frame);
                return Ok(());
            }
            let chase = self.tuning.body.chase;
            self.shell
                .chase(frame, &chase, self.tuning.body.hold_distance)?;
            return Ok(());
        };

        if self.shell.core.tick_duration(action, frame.dt_seconds) == TimerTick::Expired {
            self.end(action, frame);
            return Ok(());
        }
        self.shell.bump_animation(action);
        if let WardenState::Orbit {
            pivot,
            perch,
            angle,
        } = self.state
        {
            self.update_orbit(frame, pivot, perch, angle)?;
        }
        Ok(())
    }

    fn take_damage(&mut self, amount: f64) -> f64 {
        match self.state {
            WardenState::Death => 0.0,
            WardenState::Sleep => self
                .shell
                .take_damage(amount * self.tuning.sleep_damage_multiplier),
            _ => self.shell.take_damage(amount),
        }
    }

    fn contact_hit(&self) -> Option<ContactHit> {
        match self.state {
            WardenState::Chase | WardenState::Orbit { .. } => Some(ContactHit {
                damage: self.tuning.body.contact_damage,
                knockback_scale: 1.0,
            }),
            WardenState::Sleep | WardenState::Volley | WardenState::Death => None,
        }
    }

    fn clone_boxed(&self) -> Box<dyn Boss> {
        Box::new(self.clone())
    }
}
