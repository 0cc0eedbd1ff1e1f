use engine::{validate_delta, ConfigError, FrameError, ObstacleHandle, TileGrid, Vec2};
use tracing::info;

use super::boss::{Boss, BossFrame};
use super::events::{EntityRef, FrameEvent, FrameEventBus};
use super::juggernaut::Juggernaut;
use super::player::{PlayerController, PlayerInput};
use super::projectiles::{Projectile, ProjectileFate};
use super::tuning::TuningTable;
use super::warden::Warden;

pub(crate) const ARENA_TILE_SIZE: f64 = 32.0;

/// `#` static wall, `%` breakable pillar, `.` floor.
pub(crate) const ARENA_LAYOUT: [&str; 20] = [
    "##############################",
    "#............................#",
    "#............................#",
    "#............................#",
    "#....%%................%%....#",
    "#....%%................%%....#",
    "#............................#",
    "#............................#",
    "#..........##....##..........#",
    "#..........##....##..........#",
    "#............................#",
    "#............................#",
    "#....%%................%%....#",
    "#....%%................%%....#",
    "#............................#",
    "#............................#",
    "#............................#",
    "#............................#",
    "#............................#",
    "##############################",
];

const PLAYER_SPAWN_CENTER: Vec2 = Vec2 { x: 480.0, y: 512.0 };
const BOSS_SPAWN_CENTER: Vec2 = Vec2 { x: 480.0, y: 96.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BossKind {
    Juggernaut,
    Warden,
}

impl BossKind {
    pub(crate) const ALL: [BossKind; 2] = [BossKind::Juggernaut, BossKind::Warden];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Ongoing,
    BossDefeated,
    PlayerDefeated,
}

impl Outcome {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::BossDefeated => "boss_defeated",
            Self::PlayerDefeated => "player_defeated",
        }
    }
}

/// One encounter: the tile grid, the player, a single boss and whatever they
/// have fired. [`Arena::step`] fixes the order everything runs in.
pub(crate) struct Arena {
    grid: TileGrid,
    player: PlayerController,
    boss: Box<dyn Boss>,
    projectiles: Vec<Projectile>,
    broken_tiles: Vec<ObstacleHandle>,
    events: FrameEventBus,
    player_death_reported: bool,
}

fn top_left_for(center: Vec2, width: f64, height: f64) -> Vec2 {
    Vec2 {
        x: center.x - width * 0.5,
        y: center.y - height * 0.5,
    }
}

impl Arena {
    pub(crate) fn try_new(tuning: &TuningTable, kind: BossKind) -> Result<Self, ConfigError> {
        let grid = TileGrid::from_rows(ARENA_TILE_SIZE, &ARENA_LAYOUT)?;
        let player = PlayerController::try_new(
            &tuning.player,
            top_left_for(
                PLAYER_SPAWN_CENTER,
                tuning.player.width,
                tuning.player.height,
            ),
        )?;
        let boss: Box<dyn Boss> = match kind {
            BossKind::Juggernaut => {
                let body = &tuning.juggernaut.body;
                Box::new(Juggernaut::try_new(
                    &tuning.juggernaut,
                    top_left_for(BOSS_SPAWN_CENTER, body.width, body.height),
                )?)
            }
            BossKind::Warden => {
                let body = &tuning.warden.body;
                Box::new(Warden::try_new(
                    &tuning.warden,
                    top_left_for(BOSS_SPAWN_CENTER, body.width, body.height),
                )?)
            }
        };
        Ok(Self::from_parts(grid, player, boss))
    }

    pub(crate) fn from_parts(grid: TileGrid, player: PlayerController, boss: Box<dyn Boss>) -> Self {
        Self {
            grid,
            player,
            boss,
            projectiles: Vec::new(),
            broken_tiles: Vec::new(),
            events: FrameEventBus::default(),
            player_death_reported: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub(crate) fn player(&self) -> &PlayerController {
        &self.player
    }

    pub(crate) fn boss(&self) -> &dyn Boss {
        self.boss.as_ref()
    }

    pub(crate) fn events_mut(&mut self) -> &mut FrameEventBus {
        &mut self.events
    }

    pub(crate) fn outcome(&self) -> Outcome {
        if self.player.is_dead() {
            Outcome::PlayerDefeated
        } else if self.boss.is_dead() {
            Outcome::BossDefeated
        } else {
            Outcome::Ongoing
        }
    }

    /// Center distance within which a strike lands.
    pub(crate) fn strike_reach(&self) -> f64 {
        let boss = self.boss.body().size();
        self.player.strike_range() + boss.x.max(boss.y) * 0.5
    }

    /// One tick: player movement, boss behavior, tile damage, area and
    /// projectile hits, contact, then the player's strike.
    ///
    /// Only the two movement passes can fail. A failure rolls both bodies
    /// back, so a skipped tick leaves the arena as it found it.
    pub(crate) fn step(&mut self, dt_seconds: f64, input: &PlayerInput) -> Result<(), FrameError> {
        let dt_seconds = validate_delta(dt_seconds)?;
        self.events.clear_current_tick();
        if self.player.is_dead() {
            return Ok(());
        }

        let player_before = self.player.clone();
        let boss_before = self.boss.clone_boxed();
        let projectiles_before = self.projectiles.len();
        if let Err(error) = self.move_bodies(dt_seconds, input) {
            self.player = player_before;
            self.boss = boss_before;
            self.projectiles.truncate(projectiles_before);
            self.broken_tiles.clear();
            self.events.clear_current_tick();
            return Err(error);
        }

        for handle in self.broken_tiles.drain(..) {
            if self.grid.break_tile(handle) {
                info!(tile = handle.0, "tile_broken");
                self.events.emit(FrameEvent::TileBroken { handle });
            }
        }

        let shockwaves: Vec<(Vec2, f64, f64)> = self
            .events
            .iter_emitted_so_far()
            .filter_map(|event| match *event {
                FrameEvent::Shockwave {
                    center,
                    radius,
                    damage,
                } => Some((center, radius, damage)),
                _ => None,
            })
            .collect();
        for (center, radius, damage) in shockwaves {
            if self.player.center().distance_to(center) <= radius {
                self.knock_player(center, damage, 1.0);
            }
        }

        let player_box = self.player.body().bounding_box();
        let mut projectile_hits = Vec::new();
        let grid = &self.grid;
        self.projectiles
            .retain_mut(|projectile| match projectile.advance(dt_seconds, grid, &player_box) {
                ProjectileFate::Flying => true,
                ProjectileFate::HitPlayer { origin, damage } => {
                    projectile_hits.push((origin, damage));
                    false
                }
                ProjectileFate::Expired | ProjectileFate::HitWall => false,
            });
        for (origin, damage) in projectile_hits {
            self.knock_player(origin, damage, 1.0);
        }

        if let Some(hit) = self.boss.contact_hit() {
            let boss_box = self.boss.body().bounding_box();
            if boss_box.intersects(&self.player.body().bounding_box()) {
                self.knock_player(boss_box.center(), hit.damage, hit.knockback_scale);
            }
        }

        if input.strike {
            self.resolve_strike();
        }

        if self.player.is_dead() && !self.player_death_reported {
            self.player_death_reported = true;
            info!(boss = self.boss.name(), "player_died");
            self.events.emit(FrameEvent::EntityDied {
                entity: EntityRef::Player,
            });
        }
        Ok(())
    }

    fn move_bodies(&mut self, dt_seconds: f64, input: &PlayerInput) -> Result<(), FrameError> {
        let world_size = self.grid.world_size();
        let nearby = self.grid.obstacles_near(
            &self.player.body().bounding_box(),
            self.grid.tile_size() * 2.0,
        );
        let report = self.player.update(dt_seconds, input, &nearby, world_size)?;
        for collision in report.collisions() {
            self.events.emit(FrameEvent::Collided {
                entity: EntityRef::Player,
                side: collision.side,
            });
        }

        let mut frame = BossFrame {
            dt_seconds,
            player_center: self.player.center(),
            grid: &self.grid,
            events: &mut self.events,
            projectiles: &mut self.projectiles,
            broken_tiles: &mut self.broken_tiles,
        };
        self.boss.update(&mut frame)
    }

    fn knock_player(&mut self, source: Vec2, damage: f64, scale: f64) {
        if self.player.apply_knockback(source, damage, scale) {
            self.events.emit(FrameEvent::PlayerKnockedBack { damage });
        }
    }

    fn resolve_strike(&mut self) {
        if self.boss.is_dead() {
            return;
        }
        let boss_box = self.boss.body().bounding_box();
        let player_box = self.player.body().bounding_box();
        let boss_center = boss_box.center();
        let lands = boss_box.intersects(&player_box)
            || (self.player.center().distance_to(boss_center) <= self.strike_reach()
                && self.player.faces(boss_center));
        if !lands {
            return;
        }
        let Some(damage) = self.player.try_strike() else {
            return;
        };
        let dealt = self.boss.take_damage(damage);
        if dealt > 0.0 {
            self.player.reward_hit();
            self.events.emit(FrameEvent::BossDamaged { amount: dealt });
        }
    }
}
