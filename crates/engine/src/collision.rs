//! Axis-separated tile collision.
//!
//! Each axis is resolved on its own, once per frame, after that axis' motion
//! has been integrated. Distances below one unit are banked in the entity's
//! floating correction; whole-unit moves are swept against the local
//! obstacle set:
//!
//! - an obstacle ahead within `collision_tolerance` snaps the leading edge
//!   flush, zeroes the permitted distance and resets that axis' motion;
//! - an obstacle ahead but further away than the tolerance clips the move to
//!   the gap;
//! - an obstacle only behind the entity never blocks, so an entity shoved into
//!   a wall can always back out of it.
//!
//! Obstacles whose overlap with the entity on the other axis is within the
//! grazing threshold are ignored on this axis; the other axis owns them.

use crate::body::MovableEntity;
use crate::geom::{Axis, Rect};
use crate::obstacles::{Obstacle, ObstacleHandle, ObstacleKind, ObstacleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl CollisionSide {
    pub fn leading(axis: Axis, direction: f64) -> Self {
        match (axis, direction >= 0.0) {
            (Axis::Horizontal, true) => Self::Right,
            (Axis::Horizontal, false) => Self::Left,
            (Axis::Vertical, true) => Self::Bottom,
            (Axis::Vertical, false) => Self::Top,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Horizontal,
            Self::Top | Self::Bottom => Axis::Vertical,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Obstacle {
        handle: ObstacleHandle,
        kind: ObstacleKind,
    },
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    pub side: CollisionSide,
    pub contact: Contact,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionFlags {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl CollisionFlags {
    pub fn set(&mut self, side: CollisionSide) {
        match side {
            CollisionSide::Left => self.left = true,
            CollisionSide::Right => self.right = true,
            CollisionSide::Top => self.top = true,
            CollisionSide::Bottom => self.bottom = true,
        }
    }

    pub fn contains(&self, side: CollisionSide) -> bool {
        match side {
            CollisionSide::Left => self.left,
            CollisionSide::Right => self.right,
            CollisionSide::Top => self.top,
            CollisionSide::Bottom => self.bottom,
        }
    }

    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisResolution {
    /// Whole units the entity may move this frame; zero when blocked.
    pub permitted: f64,
    pub collision: Option<Collision>,
    /// An obstacle overlaps from behind and the move backs away from it.
    pub unstuck: bool,
}

pub fn resolve_axis(
    entity: &mut MovableEntity,
    obstacles: &ObstacleSet,
    distance: f64,
    axis: Axis,
) -> AxisResolution {
    let total = distance + entity.floating_correction(axis);
    if total.abs() < 1.0 {
        entity.set_floating_correction(axis, total);
        entity.set_permitted(axis, 0.0);
        return AxisResolution {
            permitted: 0.0,
            collision: None,
            unstuck: false,
        };
    }

    let whole = total.trunc();
    let remainder = total - whole;
    let direction = whole.signum();
    let bounds = entity.bounding_box();
    let tolerance = entity.collision_tolerance();
    let graze = grazing_threshold(&bounds, axis, tolerance);

    let leading_probe = bounds.swept(axis, whole);
    let Some((handle, obstacle)) =
        nearest_ahead(obstacles, &leading_probe, &bounds, axis, direction, graze)
    else {
        let trailing_probe = bounds.swept(axis, -whole);
        let unstuck = obstacles.hits(&trailing_probe).any(|(_, obstacle)| {
            is_blocking(&bounds, &obstacle.rect, axis, -direction, graze)
        });
        entity.set_permitted(axis, whole);
        entity.set_floating_correction(axis, remainder);
        return AxisResolution {
            permitted: whole,
            collision: None,
            unstuck,
        };
    };

    let gap = gap_ahead(&bounds, &obstacle.rect, axis, direction);
    entity.set_floating_correction(axis, 0.0);
    if gap < tolerance {
        let facing_edge = if direction > 0.0 {
            obstacle.rect.min(axis)
        } else {
            obstacle.rect.max(axis)
        };
        let snapped_min = if direction > 0.0 {
            facing_edge - bounds.extent(axis)
        } else {
            facing_edge
        };
        *entity.position.component_mut(axis) = snapped_min;
        entity.set_permitted(axis, 0.0);
        entity.motion.reset_axis(axis);
        AxisResolution {
            permitted: 0.0,
            collision: Some(Collision {
                side: CollisionSide::leading(axis, direction),
                contact: Contact::Obstacle {
                    handle,
                    kind: obstacle.kind,
                },
            }),
            unstuck: false,
        }
    } else {
        let clipped = direction * gap.floor();
        entity.set_permitted(axis, clipped);
        AxisResolution {
            permitted: clipped,
            collision: None,
            unstuck: false,
        }
    }
}

fn grazing_threshold(bounds: &Rect, axis: Axis, tolerance: f64) -> f64 {
    let cross_extent = bounds.extent(other_axis(axis));
    tolerance.min(cross_extent * 0.5)
}

fn other_axis(axis: Axis) -> Axis {
    match axis {
        Axis::Horizontal => Axis::Vertical,
        Axis::Vertical => Axis::Horizontal,
    }
}

fn cross_overlap(bounds: &Rect, obstacle: &Rect, axis: Axis) -> f64 {
    let cross = other_axis(axis);
    bounds.max(cross).min(obstacle.max(cross)) - bounds.min(cross).max(obstacle.min(cross))
}

/// Obstacle sits on the `direction` side of the entity and overlaps it enough
/// on the other axis to be a real contact.
fn is_blocking(bounds: &Rect, obstacle: &Rect, axis: Axis, direction: f64, graze: f64) -> bool {
    let offset = obstacle.center().component(axis) - bounds.center().component(axis);
    offset * direction > 0.0 && cross_overlap(bounds, obstacle, axis) > graze
}

fn gap_ahead(bounds: &Rect, obstacle: &Rect, axis: Axis, direction: f64) -> f64 {
    if direction > 0.0 {
        obstacle.min(axis) - bounds.max(axis)
    } else {
        bounds.min(axis) - obstacle.max(axis)
    }
}

fn nearest_ahead<'a>(
    obstacles: &'a ObstacleSet,
    probe: &'a Rect,
    bounds: &Rect,
    axis: Axis,
    direction: f64,
    graze: f64,
) -> Option<(ObstacleHandle, &'a Obstacle)> {
    let mut nearest: Option<(ObstacleHandle, &Obstacle, f64)> = None;
    for (handle, obstacle) in obstacles.hits(probe) {
        if !is_blocking(bounds, &obstacle.rect, axis, direction, graze) {
            continue;
        }
        let gap = gap_ahead(bounds, &obstacle.rect, axis, direction);
        match nearest {
            Some((_, _, best)) if best <= gap => {}
            _ => nearest = Some((handle, obstacle, gap)),
        }
    }
    nearest.map(|(handle, obstacle, _)| (handle, obstacle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec2;
    use crate::obstacles::TileGrid;

    fn entity_at(x: f64, y: f64, width: f64, height: f64, tolerance: f64) -> MovableEntity {
        MovableEntity::try_new("test", Vec2::new(x, y), width, height, tolerance).expect("entity")
    }

    fn single_obstacle(rect: Rect) -> ObstacleSet {
        let mut set = ObstacleSet::new();
        set.insert(
            ObstacleHandle(1),
            Obstacle {
                kind: ObstacleKind::StaticTile,
                rect,
            },
        );
        set
    }

    #[test]
    fn snaps_flush_when_obstacle_ahead_is_within_tolerance() {
        let mut entity = entity_at(100.0, 0.0, 40.0, 40.0, 18.0);
        entity.motion.horizontal.velocity = 300.0;
        let obstacles = single_obstacle(Rect::new(150.0, 0.0, 50.0, 40.0));

        let resolution = resolve_axis(&mut entity, &obstacles, 60.0, Axis::Horizontal);

        assert_eq!(resolution.permitted, 0.0);
        assert_eq!(entity.permitted(Axis::Horizontal), 0.0);
        assert_eq!(entity.position.x, 150.0 - 40.0);
        assert_eq!(entity.motion.horizontal.velocity, 0.0);
        assert_eq!(
            resolution.collision.map(|collision| collision.side),
            Some(CollisionSide::Right)
        );
    }

    #[test]
    fn snapping_twice_is_idempotent() {
        let mut entity = entity_at(100.0, 0.0, 40.0, 40.0, 18.0);
        let obstacles = single_obstacle(Rect::new(150.0, 0.0, 50.0, 40.0));
        resolve_axis(&mut entity, &obstacles, 60.0, Axis::Horizontal);
        let first = entity.position;
        let again = resolve_axis(&mut entity, &obstacles, 60.0, Axis::Horizontal);
        assert_eq!(entity.position, first);
        assert_eq!(again.permitted, 0.0);
        assert!(again.collision.is_some());
    }

    #[test]
    fn clear_path_permits_full_distance_and_clears_correction() {
        let mut entity = entity_at(100.0, 0.0, 40.0, 40.0, 18.0);
        entity.set_floating_correction(Axis::Horizontal, 0.0);
        let obstacles = single_obstacle(Rect::new(400.0, 0.0, 50.0, 40.0));
        let resolution = resolve_axis(&mut entity, &obstacles, 60.0, Axis::Horizontal);
        assert_eq!(resolution.permitted, 60.0);
        assert!(resolution.collision.is_none());
        assert_eq!(entity.floating_correction(Axis::Horizontal), 0.0);
    }

    #[test]
    fn distant_obstacle_clips_move_to_gap() {
        let mut entity = entity_at(0.0, 0.0, 20.0, 20.0, 12.0);
        let obstacles = single_obstacle(Rect::new(50.0, 0.0, 32.0, 32.0));
        let resolution = resolve_axis(&mut entity, &obstacles, 45.0, Axis::Horizontal);
        assert_eq!(resolution.permitted, 30.0);
        assert!(resolution.collision.is_none());
    }

    #[test]
    fn sub_unit_moves_accumulate_until_a_whole_unit() {
        let mut entity = entity_at(10.0, 10.0, 8.0, 8.0, 12.0);
        let obstacles = ObstacleSet::new();

        resolve_axis(&mut entity, &obstacles, 0.4, Axis::Vertical);
        assert_eq!(entity.permitted(Axis::Vertical), 0.0);
        resolve_axis(&mut entity, &obstacles, 0.4, Axis::Vertical);
        assert_eq!(entity.permitted(Axis::Vertical), 0.0);
        assert!((entity.floating_correction(Axis::Vertical) - 0.8).abs() < 1e-9);

        let third = resolve_axis(&mut entity, &obstacles, 0.4, Axis::Vertical);
        assert_eq!(third.permitted, 1.0);
        assert!((entity.floating_correction(Axis::Vertical) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn embedded_entity_can_back_out() {
        // Pushed 6 units into a wall on its right; now moving left.
        let mut entity = entity_at(116.0, 0.0, 40.0, 40.0, 18.0);
        let obstacles = single_obstacle(Rect::new(150.0, 0.0, 50.0, 40.0));
        let resolution = resolve_axis(&mut entity, &obstacles, -5.0, Axis::Horizontal);
        assert_eq!(resolution.permitted, -5.0);
        assert!(resolution.unstuck);
        assert!(resolution.collision.is_none());
    }

    #[test]
    fn grazing_corner_does_not_block_the_other_axis() {
        // Bottom edge rests 2 units inside a floor tile; sliding sideways is free.
        let mut entity = entity_at(40.0, 0.0, 20.0, 34.0, 12.0);
        let obstacles = single_obstacle(Rect::new(32.0, 32.0, 64.0, 32.0));
        let resolution = resolve_axis(&mut entity, &obstacles, 5.0, Axis::Horizontal);
        assert_eq!(resolution.permitted, 5.0);
    }

    #[test]
    fn nearest_obstacle_wins_over_handle_order() {
        let mut entity = entity_at(0.0, 0.0, 10.0, 10.0, 4.0);
        let mut obstacles = ObstacleSet::new();
        obstacles.insert(
            ObstacleHandle(1),
            Obstacle {
                kind: ObstacleKind::StaticTile,
                rect: Rect::new(80.0, 0.0, 10.0, 10.0),
            },
        );
        obstacles.insert(
            ObstacleHandle(2),
            Obstacle {
                kind: ObstacleKind::DestructibleTile,
                rect: Rect::new(40.0, 0.0, 10.0, 10.0),
            },
        );
        let resolution = resolve_axis(&mut entity, &obstacles, 100.0, Axis::Horizontal);
        assert_eq!(resolution.permitted, 30.0);
    }

    #[test]
    fn vertical_axis_uses_top_and_bottom_sides() {
        let grid = TileGrid::from_rows(32.0, &["###", "#.#", "#.#", "###"]).expect("grid");
        let mut entity = entity_at(36.0, 40.0, 24.0, 24.0, 12.0);
        let obstacles = grid.obstacles_near(&entity.bounding_box(), 32.0);
        let resolution = resolve_axis(&mut entity, &obstacles, -10.0, Axis::Vertical);
        assert_eq!(
            resolution.collision.map(|collision| collision.side),
            Some(CollisionSide::Top)
        );
        assert_eq!(entity.position.y, 32.0);
    }
}
