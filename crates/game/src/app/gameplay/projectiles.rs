use engine::{heading, Rect, TileGrid, Timer, TimerTick, Vec2};

const PROJECTILE_SIZE: f64 = 10.0;
const PROJECTILE_LIFETIME_MS: f64 = 4000.0;

/// Straight-line shot fired by a boss. Projectiles do not slide along walls,
/// so they skip the collision resolver and die on first contact.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Projectile {
    rect: Rect,
    velocity: Vec2,
    damage: f64,
    lifetime: Timer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ProjectileFate {
    Flying,
    Expired,
    HitWall,
    HitPlayer { origin: Vec2, damage: f64 },
}

impl Projectile {
    pub(crate) fn fire(origin: Vec2, angle: f64, speed: f64, damage: f64) -> Self {
        let half = PROJECTILE_SIZE * 0.5;
        Self {
            rect: Rect::new(origin.x - half, origin.y - half, PROJECTILE_SIZE, PROJECTILE_SIZE),
            velocity: heading(angle).scaled(speed),
            damage,
            lifetime: Timer::started(PROJECTILE_LIFETIME_MS),
        }
    }

    pub(crate) fn center(&self) -> Vec2 {
        self.rect.center()
    }

    pub(crate) fn advance(&mut self, dt_seconds: f64, grid: &TileGrid, player: &Rect) -> ProjectileFate {
        if self.lifetime.tick(dt_seconds) == TimerTick::Expired {
            return ProjectileFate::Expired;
        }
        let origin = self.center();
        self.rect.x += self.velocity.x * dt_seconds;
        self.rect.y += self.velocity.y * dt_seconds;

        if self.rect.intersects(player) {
            return ProjectileFate::HitPlayer {
                origin,
                damage: self.damage,
            };
        }
        let world = grid.world_size();
        let outside = self.rect.left() < 0.0
            || self.rect.top() < 0.0
            || self.rect.right() > world.x
            || self.rect.bottom() > world.y;
        let nearby = grid.obstacles_near(&self.rect, 0.0);
        if outside || nearby.hits(&self.rect).next().is_some() {
            return ProjectileFate::HitWall;
        }
        ProjectileFate::Flying
    }
}
