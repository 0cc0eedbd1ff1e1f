use engine::{CollisionSide, ObstacleHandle, Phase, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntityRef {
    Player,
    Boss,
}

impl EntityRef {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Boss => "boss",
        }
    }
}

/// What happened during one tick, for the camera, sound and particle layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FrameEvent {
    Collided {
        entity: EntityRef,
        side: CollisionSide,
    },
    ActionStarted {
        action: &'static str,
    },
    ActionFinished {
        action: &'static str,
    },
    ActionInterrupted {
        action: &'static str,
        side: CollisionSide,
    },
    PhaseChanged {
        phase: Phase,
    },
    ProjectileFired {
        origin: Vec2,
        angle: f64,
    },
    Shockwave {
        center: Vec2,
        radius: f64,
        damage: f64,
    },
    PlayerKnockedBack {
        damage: f64,
    },
    BossDamaged {
        amount: f64,
    },
    EntityDied {
        entity: EntityRef,
    },
    TileBroken {
        handle: ObstacleHandle,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameEventKind {
    Collided,
    ActionStarted,
    ActionFinished,
    ActionInterrupted,
    PhaseChanged,
    ProjectileFired,
    Shockwave,
    PlayerKnockedBack,
    BossDamaged,
    EntityDied,
    TileBroken,
}

impl FrameEvent {
    pub(crate) fn kind(self) -> FrameEventKind {
        match self {
            Self::Collided { .. } => FrameEventKind::Collided,
            Self::ActionStarted { .. } => FrameEventKind::ActionStarted,
            Self::ActionFinished { .. } => FrameEventKind::ActionFinished,
            Self::ActionInterrupted { .. } => FrameEventKind::ActionInterrupted,
            Self::PhaseChanged { .. } => FrameEventKind::PhaseChanged,
            Self::ProjectileFired { .. } => FrameEventKind::ProjectileFired,
            Self::Shockwave { .. } => FrameEventKind::Shockwave,
            Self::PlayerKnockedBack { .. } => FrameEventKind::PlayerKnockedBack,
            Self::BossDamaged { .. } => FrameEventKind::BossDamaged,
            Self::EntityDied { .. } => FrameEventKind::EntityDied,
            Self::TileBroken { .. } => FrameEventKind::TileBroken,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FrameEventBus {
    current_tick_events: Vec<FrameEvent>,
}

impl FrameEventBus {
    pub(crate) fn clear_current_tick(&mut self) {
        self.current_tick_events.clear();
    }

    pub(crate) fn emit(&mut self, event: FrameEvent) {
        self.current_tick_events.push(event);
    }

    pub(crate) fn iter_emitted_so_far(&self) -> impl Iterator<Item = &FrameEvent> {
        self.current_tick_events.iter()
    }

    #[cfg(test)]
    pub(crate) fn count(&self, kind: FrameEventKind) -> usize {
        self.current_tick_events
            .iter()
            .filter(|event| event.kind() == kind)
            .count()
    }

    /// Hands this tick's events to the presentation layer.
    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, FrameEvent> {
        self.current_tick_events.drain(..)
    }
}
