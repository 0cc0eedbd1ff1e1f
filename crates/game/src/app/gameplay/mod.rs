//! Boss encounters: the arena, the player, both bosses and the scripted
//! input that drives them headless.

pub(crate) mod arena;
pub(crate) mod boss;
pub(crate) mod events;
pub(crate) mod juggernaut;
pub(crate) mod player;
pub(crate) mod projectiles;
pub(crate) mod script;
pub(crate) mod tuning;
pub(crate) mod warden;
