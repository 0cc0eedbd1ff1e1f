use std::collections::BTreeMap;

use thiserror::Error;

use crate::geom::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObstacleHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    StaticTile,
    DestructibleTile,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub rect: Rect,
}

/// Frame-local obstacles near one entity, keyed by handle so iteration order
/// is stable from frame to frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObstacleSet {
    entries: BTreeMap<ObstacleHandle, Obstacle>,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: ObstacleHandle, obstacle: Obstacle) {
        self.entries.insert(handle, obstacle);
    }

    pub fn remove(&mut self, handle: ObstacleHandle) -> Option<Obstacle> {
        self.entries.remove(&handle)
    }

    pub fn get(&self, handle: ObstacleHandle) -> Option<&Obstacle> {
        self.entries.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObstacleHandle, &Obstacle)> {
        self.entries.iter().map(|(handle, obstacle)| (*handle, obstacle))
    }

    pub fn hits<'a>(&'a self, probe: &'a Rect) -> impl Iterator<Item = (ObstacleHandle, &'a Obstacle)> {
        self.iter()
            .filter(move |(_, obstacle)| obstacle.rect.intersects(probe))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Floor,
    Static,
    Destructible,
}

impl TileKind {
    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Self::Floor),
            '#' => Some(Self::Static),
            '%' => Some(Self::Destructible),
            _ => None,
        }
    }

    fn obstacle_kind(self) -> Option<ObstacleKind> {
        match self {
            Self::Floor => None,
            Self::Static => Some(ObstacleKind::StaticTile),
            Self::Destructible => Some(ObstacleKind::DestructibleTile),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileGridError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("row {row} has {actual} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile symbol {symbol:?} at row {row}, column {column}")]
    UnknownSymbol {
        symbol: char,
        row: usize,
        column: usize,
    },
    #[error("tile grid must have at least one row and one column")]
    Empty,
    #[error("tile size must be a finite value greater than zero")]
    InvalidTileSize,
    #[error("{columns}x{rows} tiles do not fit 32-bit tile handles")]
    TooLarge { columns: usize, rows: usize },
}

/// Tile layout of the arena. Tile (0,0) has its top-left corner at the world
/// origin and the world spans `[0, world_size]` on both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_size: f64,
    tiles: Vec<TileKind>,
}

impl TileGrid {
    pub fn new(
        columns: u32,
        rows: u32,
        tile_size: f64,
        tiles: Vec<TileKind>,
    ) -> Result<Self, TileGridError> {
        if columns == 0 || rows == 0 {
            return Err(TileGridError::Empty);
        }
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(TileGridError::InvalidTileSize);
        }
        // Handles index the tile vector as `u32`.
        let expected = (columns as usize)
            .checked_mul(rows as usize)
            .filter(|count| u32::try_from(*count).is_ok())
            .ok_or(TileGridError::TooLarge {
                columns: columns as usize,
                rows: rows as usize,
            })?;
        let actual = tiles.len();
        if expected != actual {
            return Err(TileGridError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            columns,
            rows,
            tile_size,
            tiles,
        })
    }

    /// Parses rows of `.` (floor), `#` (static) and `%` (destructible).
    pub fn from_rows<S: AsRef<str>>(tile_size: f64, rows: &[S]) -> Result<Self, TileGridError> {
        let Some(first) = rows.first() else {
            return Err(TileGridError::Empty);
        };
        let columns = first.as_ref().chars().count();
        let mut tiles = Vec::with_capacity(columns * rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let actual = row.chars().count();
            if actual != columns {
                return Err(TileGridError::RaggedRow {
                    row: row_index,
                    expected: columns,
                    actual,
                });
            }
            for (column, symbol) in row.chars().enumerate() {
                let kind = TileKind::from_symbol(symbol).ok_or(TileGridError::UnknownSymbol {
                    symbol,
                    row: row_index,
                    column,
                })?;
                tiles.push(kind);
            }
        }
        let too_large = || TileGridError::TooLarge {
            columns,
            rows: rows.len(),
        };
        let column_count = u32::try_from(columns).map_err(|_| too_large())?;
        let row_count = u32::try_from(rows.len()).map_err(|_| too_large())?;
        Self::new(column_count, row_count, tile_size, tiles)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Far edge of the last tile on each axis.
    pub fn world_size(&self) -> Vec2 {
        Vec2 {
            x: self.columns as f64 * self.tile_size,
            y: self.rows as f64 * self.tile_size,
        }
    }

    pub fn index_of(&self, column: u32, row: u32) -> Option<usize> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }

    pub fn tile_at(&self, column: u32, row: u32) -> Option<TileKind> {
        self.index_of(column, row)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn tile_rect(&self, column: u32, row: u32) -> Rect {
        Rect::new(
            column as f64 * self.tile_size,
            row as f64 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }

    pub fn handle_of(&self, column: u32, row: u32) -> Option<ObstacleHandle> {
        self.index_of(column, row)
            .map(|index| ObstacleHandle(index as u32))
    }

    fn coords_of(&self, handle: ObstacleHandle) -> Option<(u32, u32)> {
        let index = handle.0;
        if index as usize >= self.tiles.len() {
            return None;
        }
        Some((index % self.columns, index / self.columns))
    }

    pub fn tile_kind(&self, handle: ObstacleHandle) -> Option<TileKind> {
        self.tiles.get(handle.0 as usize).copied()
    }

    /// Solid tiles overlapping `area` grown by `margin` on every side.
    pub fn obstacles_near(&self, area: &Rect, margin: f64) -> ObstacleSet {
        let mut set = ObstacleSet::new();
        let search = area.expanded(margin.max(0.0));
        let max_column = self.columns as f64 - 1.0;
        let max_row = self.rows as f64 - 1.0;
        let first_column = (search.left() / self.tile_size).floor().clamp(0.0, max_column) as u32;
        let last_column = (search.right() / self.tile_size).floor().clamp(0.0, max_column) as u32;
        let first_row = (search.top() / self.tile_size).floor().clamp(0.0, max_row) as u32;
        let last_row = (search.bottom() / self.tile_size).floor().clamp(0.0, max_row) as u32;

        for row in first_row..=last_row {
            for column in first_column..=last_column {
                let Some(kind) = self.tile_at(column, row).and_then(TileKind::obstacle_kind)
                else {
                    continue;
                };
                let Some(handle) = self.handle_of(column, row) else {
                    continue;
                };
                set.insert(
                    handle,
                    Obstacle {
                        kind,
                        rect: self.tile_rect(column, row),
                    },
                );
            }
        }
        set
    }

    /// Turns a destructible tile into floor. Returns `false` for anything else.
    pub fn break_tile(&mut self, handle: ObstacleHandle) -> bool {
        if self.coords_of(handle).is_none() {
            return false;
        }
        match self.tiles.get_mut(handle.0 as usize) {
            Some(tile) if *tile == TileKind::Destructible => {
                *tile = TileKind::Floor;
                true
            }
            _ => false,
        }
    }

    pub fn solid_tile_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|tile| tile.obstacle_kind().is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> TileGrid {
        TileGrid::from_rows(
            32.0,
            &["#####", "#...#", "#.%.#", "#...#", "#####"],
        )
        .expect("grid")
    }

    #[test]
    fn parses_layout_and_reports_world_size() {
        let grid = arena();
        assert_eq!(grid.columns(), 5);
        assert_eq!(grid.rows(), 5);
        assert_eq!(grid.world_size(), Vec2::new(160.0, 160.0));
        assert_eq!(grid.tile_at(2, 2), Some(TileKind::Destructible));
        assert_eq!(grid.tile_at(1, 1), Some(TileKind::Floor));
        assert_eq!(grid.tile_at(5, 0), None);
        assert_eq!(grid.solid_tile_count(), 17);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = TileGrid::from_rows(32.0, &["###", "##"]).expect_err("ragged");
        assert_eq!(
            err,
            TileGridError::RaggedRow {
                row: 1,
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let err = TileGrid::from_rows(32.0, &["#x#"]).expect_err("symbol");
        assert!(matches!(err, TileGridError::UnknownSymbol { symbol: 'x', .. }));
    }

    #[test]
    fn tile_count_mismatch_is_rejected() {
        let err = TileGrid::new(2, 2, 16.0, vec![TileKind::Floor; 3]).expect_err("count");
        assert_eq!(
            err,
            TileGridError::TileCountMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn dimensions_beyond_handle_space_are_rejected() {
        let err = TileGrid::new(u32::MAX, 2, 16.0, Vec::new()).expect_err("too large");
        assert_eq!(
            err,
            TileGridError::TooLarge {
                columns: u32::MAX as usize,
                rows: 2
            }
        );

        let err = TileGrid::new(65_536, 65_536, 16.0, Vec::new()).expect_err("too large");
        assert!(matches!(err, TileGridError::TooLarge { .. }));
    }

    #[test]
    fn obstacles_near_only_returns_local_solid_tiles() {
        let grid = arena();
        let entity = Rect::new(40.0, 40.0, 20.0, 20.0);
        let set = grid.obstacles_near(&entity, 0.0);
        // The entity covers tile (1,1) only; nothing solid there.
        assert!(set.is_empty());

        let set = grid.obstacles_near(&entity, 16.0);
        let destructible = grid.handle_of(2, 2).expect("handle");
        assert_eq!(
            set.get(destructible).map(|obstacle| obstacle.kind),
            Some(ObstacleKind::DestructibleTile)
        );
        assert!(set.get(grid.handle_of(0, 0).expect("handle")).is_some());
        assert!(set.get(grid.handle_of(4, 4).expect("handle")).is_none());
    }

    #[test]
    fn break_tile_only_affects_destructible_tiles() {
        let mut grid = arena();
        let wall = grid.handle_of(0, 0).expect("wall");
        let crate_tile = grid.handle_of(2, 2).expect("crate");
        assert!(!grid.break_tile(wall));
        assert!(grid.break_tile(crate_tile));
        assert_eq!(grid.tile_at(2, 2), Some(TileKind::Floor));
        assert!(!grid.break_tile(crate_tile));
        assert!(!grid.break_tile(ObstacleHandle(999)));
    }

    #[test]
    fn first_hit_order_follows_handles() {
        let mut set = ObstacleSet::new();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        set.insert(
            ObstacleHandle(7),
            Obstacle {
                kind: ObstacleKind::StaticTile,
                rect,
            },
        );
        set.insert(
            ObstacleHandle(3),
            Obstacle {
                kind: ObstacleKind::DestructibleTile,
                rect,
            },
        );
        let probe = Rect::new(5.0, 5.0, 2.0, 2.0);
        let first = set.hits(&probe).next().map(|(handle, _)| handle);
        assert_eq!(first, Some(ObstacleHandle(3)));
    }
}
