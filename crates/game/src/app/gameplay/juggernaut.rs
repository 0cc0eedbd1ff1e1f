use engine::{
    look_angle, BehaviorAction, BehaviorProfile, ConfigError, Contact, FrameError, MovableEntity,
    ObstacleKind, ObstacleSet, Phase, TileGrid, Timer, TimerTick, Vec2,
};
use tracing::info;

use super::boss::{Boss, BossFrame, BossShell, BossView, ContactHit};
use super::events::FrameEvent;
use super::projectiles::Projectile;
use super::tuning::JuggernautTuning;

const CHARGE_KNOCKBACK_SCALE: f64 = 1.5;
/// Leap stops steering once the target is closer than this.
const LEAP_ARRIVAL_DISTANCE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum JuggernautAction {
    Charge,
    Leap,
}

impl BehaviorAction for JuggernautAction {
    const ALL: &'static [Self] = &[Self::Charge, Self::Leap];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Charge => "charge",
            Self::Leap => "leap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeapStage {
    Launch,
    Target,
    Land,
}

impl LeapStage {
    fn name(self) -> &'static str {
        match self {
            Self::Launch => "launch",
            Self::Target => "target",
            Self::Land => "land",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum JuggernautState {
    Chase,
    Charge { angle: f64, stun_pending: bool },
    /// `launch` is the top-left corner the leap took off from.
    Leap { stage: LeapStage, launch: Vec2 },
    Stunned,
    Death,
}

/// Heavy melee boss: committed charges that stun it on impact, and a
/// three-stage leap that ends in a shockwave.
#[derive(Debug, Clone)]
pub(crate) struct Juggernaut {
    shell: BossShell<JuggernautAction>,
    tuning: JuggernautTuning,
    state: JuggernautState,
    stun: Timer,
    spit_cooldown: Timer,
    rage: u32,
}

impl Juggernaut {
    pub(crate) fn try_new(tuning: &JuggernautTuning, spawn: Vec2) -> Result<Self, ConfigError> {
        tuning.validate()?;
        let profile = BehaviorProfile::try_new("juggernaut", |action| match action {
            JuggernautAction::Charge => tuning.charge,
            JuggernautAction::Leap => tuning.leap,
        })?;
        let shell = BossShell::try_new(
            "juggernaut",
            &tuning.body,
            spawn,
            profile,
            tuning.scheduler,
        )?;
        Ok(Self {
            shell,
            tuning: tuning.clone(),
            state: JuggernautState::Chase,
            stun: Timer::inactive(),
            spit_cooldown: Timer::started(tuning.spit_cooldown_ms),
            rage: 0,
        })
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> JuggernautState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn rage(&self) -> u32 {
        self.rage
    }

    fn charge_distance(&self) -> f64 {
        self.tuning.charge_motion.distance
            * (1.0 + f64::from(self.rage) * self.tuning.rage_distance_bonus)
    }

    fn begin(&mut self, action: JuggernautAction, frame: &mut BossFrame<'_>) {
        let center = self.shell.body.center();
        self.shell.body.reset_motion(true);
        self.state = match action {
            JuggernautAction::Charge => JuggernautState::Charge {
                angle: look_angle(center, frame.player_center),
                stun_pending: false,
            },
            JuggernautAction::Leap => JuggernautState::Leap {
                stage: LeapStage::Launch,
                launch: self.shell.body.position,
            },
        };
        self.shell.start(action, frame.events);
    }

    fn update_chase(&mut self, frame: &mut BossFrame<'_>) -> Result<(), FrameError> {
        self.shell.check_phase(frame.events);
        if let Some(action) = self.shell.select() {
            self.begin(action, frame);
            return Ok(());
        }

        if self.spit_cooldown.tick(frame.dt_seconds) == TimerTick::Expired {
            let origin = self.shell.body.center();
            let angle = look_angle(origin, frame.player_center);
            frame.projectiles.push(Projectile::fire(
                origin,
                angle,
                self.tuning.spit_speed,
                self.tuning.spit_damage,
            ));
            frame.events.emit(FrameEvent::ProjectileFired { origin, angle });
            self.spit_cooldown.start(self.tuning.spit_cooldown_ms);
        }

        let chase = self.tuning.body.chase;
        self.shell
            .chase(frame, &chase, self.tuning.body.hold_distance)?;
        Ok(())
    }

    fn update_charge(
        &mut self,
        frame: &mut BossFrame<'_>,
        angle: f64,
        stun_pending: bool,
    ) -> Result<(), FrameError> {
        let action = JuggernautAction::Charge;
        if self.shell.core.tick_duration(action, frame.dt_seconds) == TimerTick::Expired {
            self.shell.body.reset_motion(true);
            self.shell.finish(action, frame.events);
            if self.shell.core.phase() == Phase::Escalated {
                self.rage = (self.rage + 1).min(self.tuning.max_rage);
            }
            if stun_pending {
                self.stun.start(self.tuning.stun_ms);
                self.state = JuggernautState::Stunned;
            } else {
                self.state = JuggernautState::Chase;
            }
            return Ok(());
        }

        let distance = self.charge_distance();
        let motion = self.tuning.charge_motion;
        self.shell.body.motion.set_heading(distance, angle, &motion);
        let report = self.shell.step(frame)?;
        self.shell.bump_animation(action);

        let Some(first) = report.collisions().next() else {
            return Ok(());
        };
        if stun_pending {
            return Ok(());
        }
        self.shell.core.interrupt(action);
        self.state = JuggernautState::Charge {
            angle,
            stun_pending: true,
        };
        for collision in report.collisions() {
            if let Contact::Obstacle {
                handle,
                kind: ObstacleKind::DestructibleTile,
            } = collision.contact
            {
                frame.broken_tiles.push(handle);
            }
        }
        info!(
            boss = self.shell.name,
            action = action.name(),
            side = first.side.as_token(),
            "boss_action_interrupted"
        );
        frame.events.emit(FrameEvent::ActionInterrupted {
            action: action.name(),
            side: first.side,
        });
        Ok(())
    }

    /// The airborne stage ignores tiles, so a landing inside solid geometry
    /// is undone by returning to the launch point.
    fn settle_landing(&mut self, grid: &TileGrid, launch: Vec2) {
        let landing = self.shell.body.bounding_box();
        let overlaps = grid.obstacles_near(&landing, 0.0).hits(&landing).count();
        if overlaps == 0 {
            return;
        }
        info!(
            boss = self.shell.name,
            x = landing.x,
            y = landing.y,
            overlaps,
            "leap_landing_blocked"
        );
        self.shell.body.teleport(launch);
    }

    fn update_leap(
        &mut self,
        frame: &mut BossFrame<'_>,
        stage: LeapStage,
        launch: Vec2,
    ) -> Result<(), FrameError> {
        let action = JuggernautAction::Leap;
        let expired =
            self.shell.core.tick_duration(action, frame.dt_seconds) == TimerTick::Expired;
        self.shell.bump_animation(action);

        match stage {
            LeapStage::Launch => {
                if expired {
                    self.shell
                        .core
                        .restart_duration(action, self.tuning.leap_target_ms);
                    self.state = JuggernautState::Leap {
                        stage: LeapStage::Target,
                        launch,
                    };
                }
            }
            LeapStage::Target => {
                if expired {
                    self.shell.body.reset_motion(true);
                    self.shell
                        .core
                        .restart_duration(action, self.tuning.leap_land_ms);
                    self.settle_landing(frame.grid, launch);
                    self.state = JuggernautState::Leap {
                        stage: LeapStage::Land,
                        launch,
                    };
                    frame.events.emit(FrameEvent::Shockwave {
                        center: self.shell.body.center(),
                        radius: self.tuning.shockwave_radius,
                        damage: self.tuning.shockwave_damage,
                    });
                    return Ok(());
                }
                let center = self.shell.body.center();
                let target = frame.player_center;
                let distance = if center.distance_to(target) > LEAP_ARRIVAL_DISTANCE {
                    self.tuning.leap_motion.distance
                } else {
                    0.0
                };
                let motion = self.tuning.leap_motion;
                self.shell
                    .body
                    .motion
                    .set_heading(distance, look_angle(center, target), &motion);
                // Airborne: only the arena boundary applies.
                self.shell.body.step(
                    &ObstacleSet::new(),
                    frame.grid.world_size(),
                    frame.dt_seconds,
                )?;
            }
            LeapStage::Land => {
                if expired {
                    self.shell.finish(action, frame.events);
                    self.state = JuggernautState::Chase;
                }
            }
        }
        Ok(())
    }
}

impl Boss for Juggernaut {
    fn name(&self) -> &'static str {
        self.shell.name
    }

    fn body(&self) -> &MovableEntity {
        &self.shell.body
    }

    fn view(&self) -> BossView {
        let (action, stage, animation_index) = match self.state {
            JuggernautState::Chase => ("chase", None, 0),
            JuggernautState::Charge { .. } => (
                "charge",
                None,
                self.shell.animation_index(JuggernautAction::Charge),
            ),
            JuggernautState::Leap { stage, .. } => (
                "leap",
                Some(stage.name()),
                self.shell.animation_index(JuggernautAction::Leap),
            ),
            JuggernautState::Stunned => ("stunned", None, 0),
            JuggernautState::Death => ("death", None, 0),
        };
        BossView {
            action,
            stage,
            animation_index,
            health_fraction: self.shell.health.fraction(),
            phase: self.shell.core.phase(),
        }
    }

    fn is_dead(&self) -> bool {
        self.state == JuggernautState::Death
    }

    fn update(&mut self, frame: &mut BossFrame<'_>) -> Result<(), FrameError> {
        if self.state == JuggernautState::Death {
            return Ok(());
        }
        if self.shell.health.is_depleted() {
            self.state = JuggernautState::Death;
            self.shell.enter_death(frame.events);
            return Ok(());
        }

        self.shell.core.tick_timers(frame.dt_seconds);
        match self.state {
            JuggernautState::Chase => self.update_chase(frame),
            JuggernautState::Charge {
                angle,
                stun_pending,
            } => self.update_charge(frame, angle, stun_pending),
            JuggernautState::Leap { stage, launch } => self.update_leap(frame, stage, launch),
            JuggernautState::Stunned => {
                if self.stun.tick(frame.dt_seconds) == TimerTick::Expired {
                    self.state = JuggernautState::Chase;
                }
                Ok(())
            }
            JuggernautState::Death => Ok(()),
        }
    }

    fn take_damage(&mut self, amount: f64) -> f64 {
        if self.state == JuggernautState::Death {
            return 0.0;
        }
        self.shell.take_damage(amount)
    }

    fn contact_hit(&self) -> Option<ContactHit> {
        match self.state {
            JuggernautState::Chase => Some(ContactHit {
                damage: self.tuning.body.contact_damage,
                knockback_scale: 1.0,
            }),
            JuggernautState::Charge { .. } => Some(ContactHit {
                damage: self.tuning.charge_contact_damage,
                knockback_scale: CHARGE_KNOCKBACK_SCALE,
            }),
            JuggernautState::Leap { .. } | JuggernautState::Stunned | JuggernautState::Death => {
                None
            }
        }
    }

    fn clone_boxed(&self) -> Box<dyn Boss> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use engine::{CollisionSide, ObstacleHandle, TileGrid};

    use super::*;
    use crate::app::gameplay::arena::ARENA_LAYOUT;
    use crate::app::gameplay::events::{FrameEventBus, FrameEventKind};

    struct Harness {
        grid: TileGrid,
        events: FrameEventBus,
        projectiles: Vec<Projectile>,
        broken: Vec<ObstacleHandle>,
    }

    impl Harness {
        fn new(rows: &[&str]) -> Self {
            Self {
                grid: TileGrid::from_rows(32.0, rows).expect("grid"),
                events: FrameEventBus::default(),
                projectiles: Vec::new(),
                broken: Vec::new(),
            }
        }

        fn solid_overlaps(&self, boss: &Juggernaut) -> usize {
            let area = boss.body().bounding_box();
            self.grid.obstacles_near(&area, 0.0).hits(&area).count()
        }

        fn tick(&mut self, boss: &mut Juggernaut, player_center: Vec2) {
            self.events.clear_current_tick();
            let mut frame = BossFrame {
                dt_seconds: 1.0 / 60.0,
                player_center,
                grid: &self.grid,
                events: &mut self.events,
                projectiles: &mut self.projectiles,
                broken_tiles: &mut self.broken,
            };
            boss.update(&mut frame).expect("update");
        }
    }

    fn tuning() -> JuggernautTuning {
        let mut tuning = JuggernautTuning::default();
        tuning.body.seed = Some(3);
        tuning
    }

    const OPEN: [&str; 8] = [
        "....................",
        "....................",
        "....................",
        "....................",
        "....................",
        "....................",
        "....................",
        "....................",
    ];

    #[test]
    fn charge_into_destructible_wall_interrupts_then_stuns() {
        let mut harness = Harness::new(&[
            "............%.......",
            "............%.......",
            "............%.......",
            "............%.......",
        ]);
        let mut boss = Juggernaut::try_new(&tuning(), Vec2::new(64.0, 32.0)).expect("boss");
        let player = Vec2::new(600.0, 64.0);
        boss.shell.start(JuggernautAction::Charge, &mut harness.events);
        boss.state = JuggernautState::Charge {
            angle: 0.0,
            stun_pending: false,
        };

        let mut interrupted_at = None;
        for frame in 0..80 {
            harness.tick(&mut boss, player);
            if harness.events.count(FrameEventKind::ActionInterrupted) > 0 {
                interrupted_at = Some(frame);
                break;
            }
        }
        assert!(interrupted_at.is_some());
        assert_eq!(
            boss.shell.core.slot(JuggernautAction::Charge).duration.remaining_ms(),
            Some(0.0)
        );
        assert!(matches!(
            boss.state(),
            JuggernautState::Charge {
                stun_pending: true,
                ..
            }
        ));
        assert_eq!(boss.body().bounding_box().right(), 12.0 * 32.0);
        assert!(!harness.broken.is_empty());
        assert!(harness
            .events
            .iter_emitted_so_far()
            .any(|event| matches!(
                event,
                FrameEvent::Collided {
                    side: CollisionSide::Right,
                    ..
                }
            )));

        harness.tick(&mut boss, player);
        assert_eq!(boss.state(), JuggernautState::Stunned);
        assert!(boss
            .shell
            .core
            .history()
            .contains(JuggernautAction::Charge));
        assert_eq!(boss.view().action, "stunned");
    }

    #[test]
    fn uninterrupted_charge_returns_to_chase() {
        let mut harness = Harness::new(&OPEN);
        let mut boss = Juggernaut::try_new(&tuning(), Vec2::new(32.0, 96.0)).expect("boss");
        boss.shell.start(JuggernautAction::Charge, &mut harness.events);
        boss.state = JuggernautState::Charge {
            angle: 0.0,
            stun_pending: false,
        };
        // Short enough to end before the far wall.
        boss.shell.core.restart_duration(JuggernautAction::Charge, 300.0);
        let mut finished = 0;
        for _ in 0..30 {
            harness.tick(&mut boss, Vec2::new(600.0, 96.0));
            finished += harness.events.count(FrameEventKind::ActionFinished);
            if boss.state() == JuggernautState::Chase {
                break;
            }
        }
        assert_eq!(boss.state(), JuggernautState::Chase);
        assert_eq!(finished, 1);
        assert_eq!(harness.events.count(FrameEventKind::ActionInterrupted), 0);
    }

    #[test]
    fn leap_runs_launch_target_land_and_emits_shockwave() {
        let mut harness = Harness::new(&OPEN);
        let mut boss = Juggernaut::try_new(&tuning(), Vec2::new(32.0, 32.0)).expect("boss");
        let player = Vec2::new(400.0, 160.0);
        boss.begin(JuggernautAction::Leap, &mut BossFrame {
            dt_seconds: 1.0 / 60.0,
            player_center: player,
            grid: &harness.grid,
            events: &mut harness.events,
            projectiles: &mut harness.projectiles,
            broken_tiles: &mut harness.broken,
        });

        let mut stages = vec![boss.view().stage];
        let mut shockwaves = 0;
        for _ in 0..200 {
            harness.tick(&mut boss, player);
            shockwaves += harness.events.count(FrameEventKind::Shockwave);
            let stage = boss.view().stage;
            if stages.last() != Some(&stage) {
                stages.push(stage);
            }
            if boss.state() == JuggernautState::Chase {
                break;
            }
        }
        assert_eq!(
            stages,
            vec![Some("launch"), Some("target"), Some("land"), None]
        );
        assert_eq!(shockwaves, 1);
        assert!(boss.body().center().distance_to(player) < 200.0);
    }

    #[test]
    fn leap_landing_inside_a_pillar_returns_to_the_launch_point() {
        let mut harness = Harness::new(&ARENA_LAYOUT);
        let launch = Vec2::new(352.0, 48.0);
        let mut boss = Juggernaut::try_new(&tuning(), launch).expect("boss");
        // Straight below the launch point, past the centre pillar.
        let player = Vec2::new(384.0, 560.0);
        boss.begin(JuggernautAction::Leap, &mut BossFrame {
            dt_seconds: 1.0 / 60.0,
            player_center: player,
            grid: &harness.grid,
            events: &mut harness.events,
            projectiles: &mut harness.projectiles,
            broken_tiles: &mut harness.broken,
        });

        let mut shockwave = None;
        for _ in 0..200 {
            harness.tick(&mut boss, player);
            let landed = harness.events.iter_emitted_so_far().find_map(|event| match *event {
                FrameEvent::Shockwave { center, .. } => Some(center),
                _ => None,
            });
            if landed.is_some() {
                shockwave = landed;
                assert_eq!(harness.solid_overlaps(&boss), 0);
            }
            if boss.state() == JuggernautState::Chase {
                break;
            }
        }
        assert_eq!(boss.state(), JuggernautState::Chase);
        assert_eq!(boss.body().position, launch);
        assert_eq!(shockwave, Some(boss.body().center()));

        for _ in 0..300 {
            harness.tick(&mut boss, player);
            assert_eq!(harness.solid_overlaps(&boss), 0);
        }
    }

    #[test]
    fn spit_fires_while_chasing() {
        let mut harness = Harness::new(&OPEN);
        let mut tuning = tuning();
        tuning.spit_cooldown_ms = 100.0;
        let mut boss = Juggernaut::try_new(&tuning, Vec2::new(32.0, 32.0)).expect("boss");
        boss.shell.core.finish(JuggernautAction::Charge);
        boss.shell.core.finish(JuggernautAction::Leap);
        for _ in 0..10 {
            harness.tick(&mut boss, Vec2::new(500.0, 200.0));
        }
        assert_eq!(harness.projectiles.len(), 1);
    }

    #[test]
    fn escalated_phase_grows_rage_per_charge() {
        let mut harness = Harness::new(&OPEN);
        let mut boss = Juggernaut::try_new(&tuning(), Vec2::new(300.0, 96.0)).expect("boss");
        boss.take_damage(300.0);
        boss.shell.core.finish(JuggernautAction::Leap);
        boss.shell.core.finish(JuggernautAction::Charge);
        harness.tick(&mut boss, Vec2::new(500.0, 96.0));
        assert_eq!(boss.view().phase, Phase::Escalated);
        assert_eq!(harness.events.count(FrameEventKind::PhaseChanged), 1);

        let before = boss.charge_distance();
        boss.state = JuggernautState::Charge {
            angle: 0.0,
            stun_pending: false,
        };
        boss.shell.core.start(JuggernautAction::Charge);
        boss.shell.core.interrupt(JuggernautAction::Charge);
        harness.tick(&mut boss, Vec2::new(500.0, 96.0));
        assert_eq!(boss.state(), JuggernautState::Chase);
        assert_eq!(boss.rage(), 1);
        assert!(boss.charge_distance() > before);
        assert_eq!(
            boss.shell.core.slot(JuggernautAction::Charge).cooldown.remaining_ms(),
            Some(3600.0)
        );
    }

    #[test]
    fn death_is_terminal() {
        let mut harness = Harness::new(&OPEN);
        let mut boss = Juggernaut::try_new(&tuning(), Vec2::new(96.0, 96.0)).expect("boss");
        assert_eq!(boss.take_damage(10_000.0), 400.0);
        harness.tick(&mut boss, Vec2::new(300.0, 96.0));
        assert!(boss.is_dead());
        assert_eq!(harness.events.count(FrameEventKind::EntityDied), 1);
        let position = boss.body().position;

        for _ in 0..120 {
            harness.tick(&mut boss, Vec2::new(300.0, 96.0));
            assert_eq!(boss.view().action, "death");
            assert_eq!(harness.events.count(FrameEventKind::EntityDied), 0);
        }
        assert_eq!(boss.take_damage(5.0), 0.0);
        assert!(boss.contact_hit().is_none());
        assert_eq!(boss.body().position, position);
        assert!(!boss.body().physics_enabled());
    }
}
