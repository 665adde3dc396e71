//! Board state: geometry, tile arena, cell index, spawning and the post-move check.

use crate::tile::{Tile, is_valid_value};
use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;

/// Arena index of a live tile. Stable for the duration of a move.
pub type TileId = usize;

/// Grid coordinate, 0-based from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid must have at least two cells (got {rows}x{cols})")]
    GridTooSmall { rows: usize, cols: usize },
    #[error("canvas {width}x{height} is smaller than the {rows}x{cols} grid")]
    CanvasTooSmall {
        width: i32,
        height: i32,
        rows: usize,
        cols: usize,
    },
    #[error("velocity must be positive (got {0})")]
    Velocity(i32),
    #[error("cell size {cell_width}x{cell_height} is not a multiple of velocity {velocity}")]
    Misaligned {
        cell_width: i32,
        cell_height: i32,
        velocity: i32,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("cell ({0}, {1}) is outside the grid")]
    OutOfBounds(usize, usize),
    #[error("cell ({0}, {1}) is already occupied")]
    Occupied(usize, usize),
    #[error("{0} is not a valid tile value")]
    InvalidValue(u32),
}

/// Board geometry on the logical canvas. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    rows: usize,
    cols: usize,
    width: i32,
    height: i32,
    velocity: i32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 4,
            width: 800,
            height: 800,
            velocity: 20,
        }
    }
}

impl BoardConfig {
    pub fn new(
        rows: usize,
        cols: usize,
        width: i32,
        height: i32,
        velocity: i32,
    ) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 || rows * cols < 2 {
            return Err(ConfigError::GridTooSmall { rows, cols });
        }
        if width < cols as i32 || height < rows as i32 {
            return Err(ConfigError::CanvasTooSmall {
                width,
                height,
                rows,
                cols,
            });
        }
        if velocity <= 0 {
            return Err(ConfigError::Velocity(velocity));
        }
        let config = Self {
            rows,
            cols,
            width,
            height,
            velocity,
        };
        // Tiles advance in whole velocity steps; anything else leaves fractional residue.
        if config.cell_width() % velocity != 0 || config.cell_height() % velocity != 0 {
            return Err(ConfigError::Misaligned {
                cell_width: config.cell_width(),
                cell_height: config.cell_height(),
                velocity,
            });
        }
        Ok(config)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    /// Canvas size in logical pixels.
    #[inline]
    pub fn canvas(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn cell_width(&self) -> i32 {
        self.width / self.cols as i32
    }

    #[inline]
    pub fn cell_height(&self) -> i32 {
        self.height / self.rows as i32
    }

    /// Pixels a sliding tile advances per tick.
    #[inline]
    pub fn velocity(&self) -> i32 {
        self.velocity
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Canonical top-left pixel of a cell.
    #[inline]
    pub fn origin_of(&self, cell: Cell) -> (i32, i32) {
        (
            cell.col as i32 * self.cell_width(),
            cell.row as i32 * self.cell_height(),
        )
    }
}

/// Result of the terminal check that closes every move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Continue,
    Lost,
}

/// Tiles keyed by cell. Tiles live in an arena so merges can remove them
/// mid-move without invalidating the ids of the others.
#[derive(Debug, Clone)]
pub struct Board {
    config: BoardConfig,
    arena: Vec<Option<Tile>>,
    cells: HashMap<Cell, TileId>,
}

impl Board {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            config,
            arena: Vec::with_capacity(config.capacity()),
            cells: HashMap::with_capacity(config.capacity()),
        }
    }

    #[inline]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Number of occupied cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.cells.len() == self.config.capacity()
    }

    pub fn tile_at(&self, cell: Cell) -> Option<&Tile> {
        self.cells.get(&cell).and_then(|&id| self.get(id))
    }

    /// Live tiles in arena order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.arena.iter().flatten()
    }

    /// Place a tile. Used for seeding and spawning; never overwrites.
    pub fn insert(&mut self, cell: Cell, value: u32) -> Result<TileId, BoardError> {
        if !self.config.contains(cell) {
            return Err(BoardError::OutOfBounds(cell.row, cell.col));
        }
        if self.cells.contains_key(&cell) {
            return Err(BoardError::Occupied(cell.row, cell.col));
        }
        if !is_valid_value(value) {
            return Err(BoardError::InvalidValue(value));
        }
        let id = self.arena.len();
        self.arena
            .push(Some(Tile::new(value, cell.row, cell.col, &self.config)));
        self.cells.insert(cell, id);
        Ok(id)
    }

    /// Drop a tile into a uniformly random empty cell (reject and retry).
    /// `None` when the board is full. Panics on a value no tile can hold.
    pub fn spawn_at<R: Rng + ?Sized>(&mut self, value: u32, rng: &mut R) -> Option<Cell> {
        assert!(is_valid_value(value), "cannot spawn a tile of value {value}");
        if self.is_full() {
            return None;
        }
        let cell = loop {
            let cell = Cell::new(
                rng.gen_range(0..self.config.rows),
                rng.gen_range(0..self.config.cols),
            );
            if !self.cells.contains_key(&cell) {
                break cell;
            }
        };
        self.insert(cell, value).ok().map(|_| cell)
    }

    /// Two value-2 tiles in distinct random cells.
    pub fn seed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for _ in 0..2 {
            self.spawn_at(2, rng);
        }
    }

    /// Terminal check run once a move settles. A full board is lost; otherwise
    /// a 2 or a 4 appears when `spawn` is set.
    pub fn after_move<R: Rng + ?Sized>(&mut self, rng: &mut R, spawn: bool) -> (Status, Option<Cell>) {
        if self.is_full() {
            return (Status::Lost, None);
        }
        if !spawn {
            return (Status::Continue, None);
        }
        let value = if rng.gen_bool(0.5) { 2 } else { 4 };
        (Status::Continue, self.spawn_at(value, rng))
    }

    // ---- move engine access ----

    #[inline]
    pub(crate) fn get(&self, id: TileId) -> Option<&Tile> {
        self.arena.get(id).and_then(Option::as_ref)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.arena.get_mut(id).and_then(Option::as_mut)
    }

    /// Id indexed at `cell` when the index was last rebuilt.
    #[inline]
    pub(crate) fn lookup(&self, cell: Cell) -> Option<TileId> {
        self.cells.get(&cell).copied()
    }

    pub(crate) fn live_ids(&self) -> Vec<TileId> {
        self.arena
            .iter()
            .enumerate()
            .filter_map(|(id, t)| t.as_ref().map(|_| id))
            .collect()
    }

    /// Take a tile out of play. Its cell entry stays until the next reindex.
    pub(crate) fn remove(&mut self, id: TileId) -> Option<Tile> {
        self.arena.get_mut(id).and_then(Option::take)
    }

    /// Rebuild the cell index from the live tiles' current row/col.
    pub(crate) fn reindex(&mut self) {
        self.cells.clear();
        for (id, tile) in self.arena.iter().enumerate() {
            if let Some(tile) = tile {
                let prev = self.cells.insert(tile.cell(), id);
                debug_assert!(prev.is_none(), "two tiles indexed at {:?}", tile.cell());
            }
        }
    }

    /// Drop merged-away slots. Invalidates ids; only call between moves.
    pub(crate) fn compact(&mut self) {
        self.arena.retain(Option::is_some);
        self.reindex();
    }
}

#[cfg(test)]
impl Board {
    /// Build a board from a row-major grid of values (0 = empty).
    pub fn from_rows(config: BoardConfig, rows: &[&[u32]]) -> Self {
        let mut board = Self::new(config);
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v != 0 {
                    board.insert(Cell::new(r, c), v).unwrap();
                }
            }
        }
        board
    }

    /// Row-major grid of values (0 = empty).
    pub fn values(&self) -> Vec<Vec<u32>> {
        let mut grid = vec![vec![0; self.config.cols]; self.config.rows];
        for tile in self.tiles() {
            grid[tile.row][tile.col] = tile.value;
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn default_geometry() {
        let cfg = BoardConfig::default();
        assert_eq!(cfg.capacity(), 16);
        assert_eq!((cfg.cell_width(), cfg.cell_height()), (200, 200));
        assert_eq!(cfg.origin_of(Cell::new(3, 2)), (400, 600));
    }

    #[test]
    fn config_validation() {
        assert_eq!(
            BoardConfig::new(1, 1, 800, 800, 20),
            Err(ConfigError::GridTooSmall { rows: 1, cols: 1 })
        );
        assert_eq!(
            BoardConfig::new(4, 4, 800, 800, 0),
            Err(ConfigError::Velocity(0))
        );
        assert!(matches!(
            BoardConfig::new(4, 4, 800, 800, 30),
            Err(ConfigError::Misaligned { .. })
        ));
        assert!(matches!(
            BoardConfig::new(4, 4, 3, 800, 1),
            Err(ConfigError::CanvasTooSmall { .. })
        ));
        let cfg = BoardConfig::new(5, 3, 600, 500, 25).unwrap();
        assert_eq!((cfg.cell_width(), cfg.cell_height()), (200, 100));
    }

    #[test]
    fn insert_rejects_bad_cells_and_values() {
        let mut board = Board::new(BoardConfig::default());
        assert!(board.insert(Cell::new(0, 0), 2).is_ok());
        assert_eq!(board.insert(Cell::new(0, 0), 4), Err(BoardError::Occupied(0, 0)));
        assert_eq!(board.insert(Cell::new(4, 0), 4), Err(BoardError::OutOfBounds(4, 0)));
        assert_eq!(board.insert(Cell::new(1, 1), 3), Err(BoardError::InvalidValue(3)));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn seed_places_two_twos() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut board = Board::new(BoardConfig::default());
        board.seed(&mut rng);
        assert_eq!(board.len(), 2);
        assert!(board.tiles().all(|t| t.value == 2));
        let cells: Vec<_> = board.tiles().map(Tile::cell).collect();
        assert_ne!(cells[0], cells[1]);
    }

    #[test]
    fn spawn_never_targets_occupied_cell() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut board = Board::new(BoardConfig::default());
        for n in 1..=16 {
            let before: Vec<_> = board.tiles().map(Tile::cell).collect();
            let cell = board.spawn_at(2, &mut rng).expect("room left");
            assert!(!before.contains(&cell));
            assert_eq!(board.len(), n);
        }
        assert!(board.is_full());
        assert_eq!(board.spawn_at(2, &mut rng), None);
        assert_eq!(board.len(), 16);
    }

    #[test]
    #[should_panic(expected = "cannot spawn a tile of value 3")]
    fn spawn_rejects_invalid_value_instead_of_reporting_full() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut board = Board::new(BoardConfig::default());
        let _ = board.spawn_at(3, &mut rng);
    }

    #[test]
    fn after_move_on_full_board_is_lost_without_spawn() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut board = Board::new(BoardConfig::default());
        while board.spawn_at(2, &mut rng).is_some() {}
        assert_eq!(board.after_move(&mut rng, true), (Status::Lost, None));
        assert_eq!(board.len(), 16);
    }

    #[test]
    fn after_move_spawns_two_or_four() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let mut board = Board::from_rows(BoardConfig::default(), &[&[2]]);
            let (status, cell) = board.after_move(&mut rng, true);
            assert_eq!(status, Status::Continue);
            let tile = board.tile_at(cell.unwrap()).unwrap();
            assert!(tile.value == 2 || tile.value == 4);
            assert_eq!(board.len(), 2);
        }
    }

    #[test]
    fn after_move_without_spawn_leaves_board_alone() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut board = Board::from_rows(BoardConfig::default(), &[&[2, 4]]);
        assert_eq!(board.after_move(&mut rng, false), (Status::Continue, None));
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn remove_then_compact_keeps_index_consistent() {
        let mut board = Board::from_rows(BoardConfig::default(), &[&[2, 4, 8]]);
        let id = board.lookup(Cell::new(0, 1)).unwrap();
        assert_eq!(board.remove(id).map(|t| t.value), Some(4));
        // Stale until reindexed.
        assert_eq!(board.lookup(Cell::new(0, 1)), Some(id));
        assert!(board.get(id).is_none());
        board.compact();
        assert_eq!(board.len(), 2);
        assert_eq!(board.values()[0], vec![2, 0, 8, 0]);
        assert_eq!(board.live_ids(), vec![0, 1]);
    }
}
