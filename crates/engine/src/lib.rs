pub mod behavior;
pub mod body;
pub mod collision;
pub mod config;
pub mod frame;
pub mod geom;
pub mod meter;
pub mod motion;
pub mod obstacles;
pub mod timer;

pub use behavior::{
    ActionHistory, ActionSlot, ActionTiming, BehaviorAction, BehaviorCore, BehaviorProfile, Phase,
    PhaseGate, SchedulerTuning,
};
pub use body::{MovableEntity, StepReport};
pub use collision::{
    resolve_axis, AxisResolution, Collision, CollisionFlags, CollisionSide, Contact,
};
pub use config::{
    require_in_range, require_non_negative, require_positive, target_velocity, ConfigError,
    MotionTuning,
};
pub use frame::{validate_delta, FrameDriver, FrameError, FrameMetrics, LoopConfig, Simulation};
pub use geom::{heading, look_angle, Axis, IntRect, Rect, Vec2};
pub use meter::Meter;
pub use motion::{AxisMotion, MotionModel};
pub use obstacles::{
    Obstacle, ObstacleHandle, ObstacleKind, ObstacleSet, TileGrid, TileGridError, TileKind,
};
pub use timer::{Timer, TimerTick};
