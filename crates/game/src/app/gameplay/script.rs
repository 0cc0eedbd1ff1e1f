use engine::{FrameError, Simulation, Timer, TimerTick, Vec2};
use tracing::{debug, info, trace};

use super::arena::{Arena, Outcome};
use super::events::{FrameEvent, FrameEventKind};
use super::player::PlayerInput;

/// A direction component counts as held once it exceeds sin(22.5deg) of the
/// full vector, which maps any heading onto the nearest of eight.
const DIRECTION_DEADZONE: f64 = 0.38;
const STRAFE_FLIP_MS: f64 = 2000.0;
const APPROACH_FRACTION: f64 = 0.8;

/// Headless stand-in for a human: walks into strike reach, circles the boss
/// once there and swings whenever the boss is in reach.
#[derive(Debug, Clone)]
pub(crate) struct Autopilot {
    clockwise: bool,
    strafe_flip: Timer,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            clockwise: true,
            strafe_flip: Timer::started(STRAFE_FLIP_MS),
        }
    }
}

fn directional_input(direction: Vec2) -> PlayerInput {
    let length = direction.length();
    if length <= f64::EPSILON {
        return PlayerInput::default();
    }
    let threshold = length * DIRECTION_DEADZONE;
    PlayerInput {
        right: direction.x > threshold,
        left: direction.x < -threshold,
        // Screen y grows downward.
        up: direction.y < -threshold,
        down: direction.y > threshold,
        ..PlayerInput::default()
    }
}

impl Autopilot {
    pub(crate) fn next_input(&mut self, arena: &Arena, dt_seconds: f64) -> PlayerInput {
        if self.strafe_flip.tick(dt_seconds) == TimerTick::Expired {
            self.clockwise = !self.clockwise;
            self.strafe_flip.start(STRAFE_FLIP_MS);
        }
        let player = arena.player().center();
        let boss = arena.boss().body().center();
        let to_boss = boss - player;
        let distance = to_boss.length();
        let reach = arena.strike_reach();

        let direction = if distance > reach * APPROACH_FRACTION {
            to_boss
        } else if self.clockwise {
            Vec2::new(-to_boss.y, to_boss.x)
        } else {
            Vec2::new(to_boss.y, -to_boss.x)
        };
        PlayerInput {
            aim: Some(boss),
            strike: distance <= reach,
            ..directional_input(direction)
        }
    }
}

/// Running totals over one encounter, filled from the drained event bus.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct EncounterTally {
    pub(crate) ticks: u64,
    pub(crate) knockbacks: u32,
    pub(crate) boss_damage: f64,
    pub(crate) actions_started: u32,
    pub(crate) interrupts: u32,
    pub(crate) tiles_broken: u32,
    pub(crate) projectiles_fired: u32,
}

impl EncounterTally {
    fn record(&mut self, event: &FrameEvent) {
        match event.kind() {
            FrameEventKind::PlayerKnockedBack => self.knockbacks += 1,
            FrameEventKind::ActionStarted => self.actions_started += 1,
            FrameEventKind::ActionInterrupted => self.interrupts += 1,
            FrameEventKind::TileBroken => self.tiles_broken += 1,
            FrameEventKind::ProjectileFired => self.projectiles_fired += 1,
            _ => {}
        }
        if let FrameEvent::BossDamaged { amount } = *event {
            self.boss_damage += amount;
        }
    }
}

/// Stand-in for the sound and particle layers: one structured line per event.
fn trace_event(tick: u64, event: &FrameEvent) {
    match *event {
        FrameEvent::Collided { entity, side } => {
            trace!(tick, entity = entity.as_token(), side = side.as_token(), "collided");
        }
        FrameEvent::ActionStarted { action } => debug!(tick, action, "action_started"),
        FrameEvent::ActionFinished { action } => debug!(tick, action, "action_finished"),
        FrameEvent::ActionInterrupted { action, side } => {
            debug!(tick, action, side = side.as_token(), "action_interrupted");
        }
        FrameEvent::PhaseChanged { phase } => debug!(tick, phase = ?phase, "phase_changed"),
        FrameEvent::ProjectileFired { origin, angle } => {
            trace!(tick, x = origin.x, y = origin.y, angle, "projectile_fired");
        }
        FrameEvent::Shockwave {
            center,
            radius,
            damage,
        } => debug!(tick, x = center.x, y = center.y, radius, damage, "shockwave"),
        FrameEvent::PlayerKnockedBack { damage } => debug!(tick, damage, "player_knocked_back"),
        FrameEvent::BossDamaged { amount } => trace!(tick, amount, "boss_damaged"),
        FrameEvent::EntityDied { entity } => debug!(tick, entity = entity.as_token(), "entity_died"),
        FrameEvent::TileBroken { handle } => debug!(tick, tile = handle.0, "tile_broken"),
    }
}

/// An arena driven by the autopilot, ready for the frame driver.
pub(crate) struct ScriptedEncounter {
    arena: Arena,
    autopilot: Autopilot,
    tally: EncounterTally,
    reported: bool,
}

impl ScriptedEncounter {
    pub(crate) fn new(arena: Arena) -> Self {
        Self {
            arena,
            autopilot: Autopilot::default(),
            tally: EncounterTally::default(),
            reported: false,
        }
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    pub(crate) fn tally(&self) -> EncounterTally {
        self.tally
    }
}

impl Simulation for ScriptedEncounter {
    fn step(&mut self, dt_seconds: f64) -> Result<(), FrameError> {
        let input = self.autopilot.next_input(&self.arena, dt_seconds);
        self.arena.step(dt_seconds, &input)?;
        self.tally.ticks += 1;

        let tick = self.tally.ticks;
        for event in self.arena.events_mut().drain() {
            trace_event(tick, &event);
            self.tally.record(&event);
        }
        let view = self.arena.boss().view();
        trace!(
            tick,
            action = view.action,
            stage = view.stage.unwrap_or("none"),
            animation_index = view.animation_index,
            phase = ?view.phase,
            "boss_view"
        );

        let outcome = self.arena.outcome();
        if outcome != Outcome::Ongoing && !self.reported {
            self.reported = true;
            info!(
                boss = self.arena.boss().name(),
                outcome = outcome.as_token(),
                ticks = self.tally.ticks,
                "encounter_decided"
            );
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.arena.outcome() != Outcome::Ongoing
    }
}
