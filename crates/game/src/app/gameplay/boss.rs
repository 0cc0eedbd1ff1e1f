use engine::{
    look_angle, BehaviorAction, BehaviorCore, BehaviorProfile, ConfigError, FrameError, Meter,
    MotionTuning, MovableEntity, ObstacleHandle, ObstacleSet, Phase, SchedulerTuning, StepReport,
    TileGrid, Vec2,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use super::events::{EntityRef, FrameEvent, FrameEventBus};
use super::projectiles::Projectile;
use super::tuning::BossBodyTuning;

/// Tiles further than this from a boss's box cannot be reached in one tick.
const OBSTACLE_SEARCH_TILES: f64 = 2.0;

/// Everything a boss may read or produce during one tick.
pub(crate) struct BossFrame<'a> {
    pub(crate) dt_seconds: f64,
    pub(crate) player_center: Vec2,
    pub(crate) grid: &'a TileGrid,
    pub(crate) events: &'a mut FrameEventBus,
    pub(crate) projectiles: &'a mut Vec<Projectile>,
    pub(crate) broken_tiles: &'a mut Vec<ObstacleHandle>,
}

/// Presentation-facing snapshot: the animation layer picks frames from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BossView {
    pub(crate) action: &'static str,
    pub(crate) stage: Option<&'static str>,
    pub(crate) animation_index: u32,
    pub(crate) health_fraction: f64,
    pub(crate) phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ContactHit {
    pub(crate) damage: f64,
    pub(crate) knockback_scale: f64,
}

pub(crate) trait Boss {
    fn name(&self) -> &'static str;

    fn body(&self) -> &MovableEntity;

    fn view(&self) -> BossView;

    fn is_dead(&self) -> bool;

    fn update(&mut self, frame: &mut BossFrame<'_>) -> Result<(), FrameError>;

    /// Returns the damage that actually landed after multipliers and clamping.
    fn take_damage(&mut self, amount: f64) -> f64;

    /// Damage dealt by touching the boss right now, if any.
    fn contact_hit(&self) -> Option<ContactHit>;

    /// Copy taken before a tick so a failed tick can be rolled back.
    fn clone_boxed(&self) -> Box<dyn Boss>;
}

/// State every boss composes: body, health, scheduler and its own RNG.
#[derive(Debug, Clone)]
pub(crate) struct BossShell<A> {
    pub(crate) name: &'static str,
    pub(crate) body: MovableEntity,
    pub(crate) health: Meter,
    pub(crate) core: BehaviorCore<A>,
    rng: ChaCha8Rng,
}

impl<A: BehaviorAction> BossShell<A> {
    pub(crate) fn try_new(
        name: &'static str,
        tuning: &BossBodyTuning,
        spawn: Vec2,
        profile: BehaviorProfile<A>,
        scheduler: SchedulerTuning,
    ) -> Result<Self, ConfigError> {
        let body = MovableEntity::try_new(
            name,
            spawn,
            tuning.width,
            tuning.height,
            tuning.collision_tolerance,
        )?;
        let rng = match tuning.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            name,
            body,
            health: Meter::full(name, tuning.max_health)?,
            core: BehaviorCore::try_new(name, profile, scheduler)?,
            rng,
        })
    }

    pub(crate) fn select(&mut self) -> Option<A> {
        self.core.select(&mut self.rng)
    }

    pub(crate) fn start(&mut self, action: A, events: &mut FrameEventBus) {
        self.core.start(action);
        info!(boss = self.name, action = action.name(), "boss_action_started");
        events.emit(FrameEvent::ActionStarted {
            action: action.name(),
        });
    }

    pub(crate) fn finish(&mut self, action: A, events: &mut FrameEventBus) {
        let cooldown_ms = self.core.finish(action);
        info!(
            boss = self.name,
            action = action.name(),
            cooldown_ms = cooldown_ms.unwrap_or(0.0),
            "boss_action_finished"
        );
        events.emit(FrameEvent::ActionFinished {
            action: action.name(),
        });
    }

    /// Evaluated from the default state only; true on the tick it flips.
    pub(crate) fn check_phase(&mut self, events: &mut FrameEventBus) -> bool {
        let health_fraction = self.health.fraction();
        if !self.core.check_phase(health_fraction) {
            return false;
        }
        info!(
            boss = self.name,
            health_fraction,
            cooldown_multiplier = self.core.cooldown_multiplier(),
            "boss_phase_changed"
        );
        events.emit(FrameEvent::PhaseChanged {
            phase: self.core.phase(),
        });
        true
    }

    pub(crate) fn bump_animation(&mut self, action: A) {
        let slot = self.core.slot_mut(action);
        slot.animation_index = slot.animation_index.saturating_add(1);
    }

    pub(crate) fn animation_index(&self, action: A) -> u32 {
        self.core.slot(action).animation_index
    }

    pub(crate) fn obstacles(&self, grid: &TileGrid) -> ObstacleSet {
        grid.obstacles_near(
            &self.body.bounding_box(),
            grid.tile_size() * OBSTACLE_SEARCH_TILES,
        )
    }

    /// Integrates the current motion against nearby tiles and reports every
    /// collision as a frame event.
    pub(crate) fn step(&mut self, frame: &mut BossFrame<'_>) -> Result<StepReport, FrameError> {
        let obstacles = self.obstacles(frame.grid);
        let report = self
            .body
            .step(&obstacles, frame.grid.world_size(), frame.dt_seconds)?;
        emit_collisions(frame.events, &report);
        Ok(report)
    }

    pub(crate) fn displace(
        &mut self,
        frame: &mut BossFrame<'_>,
        delta: Vec2,
    ) -> Result<StepReport, FrameError> {
        let obstacles = self.obstacles(frame.grid);
        let report = self.body.displace(&obstacles, frame.grid.world_size(), delta)?;
        emit_collisions(frame.events, &report);
        Ok(report)
    }

    /// Default movement: close in on the player until `hold_distance`.
    pub(crate) fn chase(
        &mut self,
        frame: &mut BossFrame<'_>,
        tuning: &MotionTuning,
        hold_distance: f64,
    ) -> Result<StepReport, FrameError> {
        let center = self.body.center();
        let distance = if center.distance_to(frame.player_center) > hold_distance {
            tuning.distance
        } else {
            0.0
        };
        let angle = look_angle(center, frame.player_center);
        self.body.motion.set_heading(distance, angle, tuning);
        self.step(frame)
    }

    pub(crate) fn take_damage(&mut self, amount: f64) -> f64 {
        -self.health.apply_delta(-amount.max(0.0))
    }

    pub(crate) fn enter_death(&mut self, events: &mut FrameEventBus) {
        self.body.disable_physics();
        info!(boss = self.name, "boss_died");
        events.emit(FrameEvent::EntityDied {
            entity: EntityRef::Boss,
        });
    }
}

pub(crate) fn emit_collisions(events: &mut FrameEventBus, report: &StepReport) {
    for collision in report.collisions() {
        events.emit(FrameEvent::Collided {
            entity: EntityRef::Boss,
            side: collision.side,
        });
    }
}
