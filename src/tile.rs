//! Tile: value, grid cell and the continuous pixel position used while sliding.

use crate::board::{BoardConfig, Cell};

/// How a pixel position is rounded back onto the grid after movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snap {
    /// Right/down travel: the leading edge decides the cell.
    Floor,
    /// Left/up travel: the trailing edge decides the cell.
    Ceil,
}

impl Snap {
    fn apply(self, pos: i32, extent: i32) -> usize {
        let q = pos.div_euclid(extent);
        let q = match self {
            Self::Floor => q,
            Self::Ceil if pos.rem_euclid(extent) != 0 => q + 1,
            Self::Ceil => q,
        };
        q.max(0) as usize
    }
}

/// True for the values a tile may hold: powers of two from 2 upwards.
#[inline]
pub fn is_valid_value(value: u32) -> bool {
    value >= 2 && value.is_power_of_two()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub value: u32,
    pub row: usize,
    pub col: usize,
    /// Top-left corner on the logical canvas.
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub fn new(value: u32, row: usize, col: usize, config: &BoardConfig) -> Self {
        assert!(is_valid_value(value), "tile value {value} is not a power of two >= 2");
        let (x, y) = config.origin_of(Cell::new(row, col));
        Self {
            value,
            row,
            col,
            x,
            y,
        }
    }

    #[inline]
    pub fn cell(&self) -> Cell {
        Cell::new(self.row, self.col)
    }

    /// Recompute row/col from the pixel position.
    pub fn set_position(&mut self, snap: Snap, config: &BoardConfig) {
        self.row = snap.apply(self.y, config.cell_height());
        self.col = snap.apply(self.x, config.cell_width());
    }

    /// Shift the pixel position. Bounds are the caller's business.
    #[inline]
    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.x += dx;
        self.y += dy;
    }

    /// Absorb an equal neighbour.
    pub fn double(&mut self) {
        self.value = self
            .value
            .checked_mul(2)
            .unwrap_or_else(|| panic!("tile value overflow doubling {}", self.value));
    }

    /// log2 of the value: 1 for a 2, 11 for a 2048.
    pub fn rank(&self) -> u32 {
        assert!(
            is_valid_value(self.value),
            "tile value {} is not a power of two >= 2",
            self.value
        );
        self.value.trailing_zeros()
    }

    /// Pixel position equals the canonical position of the tile's cell.
    pub fn is_snapped(&self, config: &BoardConfig) -> bool {
        config.origin_of(self.cell()) == (self.x, self.y)
    }
}
