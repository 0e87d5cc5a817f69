//! Board module - manages the 3D well
//!
//! The well is a `COLS x LOGICAL_ROWS x COLS` grid of cells indexed `[z][y][x]`.
//! Uses a flat array for better cache locality and zero-allocation.
//! Coordinates: `x` and `z` range `0..COLS`, `y` ranges `0..LOGICAL_ROWS` (top to bottom).
//! A row at fixed `(y, z)` is contiguous in memory, so z-slice shifts are slice copies.

use crate::catalog::BlockInstance;
use crate::types::{Cell, COLS, LOGICAL_ROWS};

const COLS_N: usize = COLS as usize;
const ROWS_N: usize = LOGICAL_ROWS as usize;

/// Total number of cells in the well
pub const BOARD_SIZE: usize = COLS_N * ROWS_N * COLS_N;

/// The game well using flat array storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    /// Flat array of cells, `(z * ROWS + y) * COLS + x`
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [0; BOARD_SIZE],
        }
    }

    /// Calculate flat index from (x, y, z) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8, z: i8) -> Option<usize> {
        if !Self::in_bounds(x, y, z) {
            return None;
        }
        Some(Self::index_unchecked(x as usize, y as usize, z as usize))
    }

    #[inline(always)]
    fn index_unchecked(x: usize, y: usize, z: usize) -> usize {
        (z * ROWS_N + y) * COLS_N + x
    }

    /// Whether the coordinate lies inside the well
    #[inline]
    pub fn in_bounds(x: i8, y: i8, z: i8) -> bool {
        x >= 0 && x < COLS as i8 && z >= 0 && z < COLS as i8 && y >= 0 && y < LOGICAL_ROWS as i8
    }

    /// Columns along x
    pub fn width(&self) -> u8 {
        COLS
    }

    /// Columns along z
    pub fn depth(&self) -> u8 {
        COLS
    }

    /// Rows along y
    pub fn height(&self) -> u8 {
        LOGICAL_ROWS
    }

    /// Get cell at position (x, y, z)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8, z: i8) -> Option<Cell> {
        Self::index(x, y, z).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y, z)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, z: i8, cell: Cell) -> bool {
        match Self::index(x, y, z) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Check if position is occupied (within bounds and filled)
    ///
    /// Out-of-range coordinates answer `false`; walls and floor are the
    /// collision validator's concern.
    pub fn is_occupied(&self, x: i8, y: i8, z: i8) -> bool {
        matches!(self.get(x, y, z), Some(c) if c != 0)
    }

    /// Copy every set voxel of `block` into the well as `id + 1`
    ///
    /// Voxels above row 0 are still in the spawn buffer and are dropped.
    /// Returns the number of cells written.
    pub fn freeze(&mut self, block: &BlockInstance) -> usize {
        let value = block.id + 1;
        let mut written = 0;
        for (x, y, z) in block.cells() {
            if y < 0 {
                continue;
            }
            if self.set(x, y, z, value) {
                written += 1;
            }
        }
        written
    }

    /// Check if the row running along x at depth `z` and level `y` is filled
    pub fn is_z_row_full(&self, y: u8, z: u8) -> bool {
        if y >= LOGICAL_ROWS || z >= COLS {
            return false;
        }
        let start = Self::index_unchecked(0, y as usize, z as usize);
        self.cells[start..start + COLS_N].iter().all(|&c| c != 0)
    }

    /// Check if the row running along z at column `x` and level `y` is filled
    pub fn is_x_row_full(&self, y: u8, x: u8) -> bool {
        if y >= LOGICAL_ROWS || x >= COLS {
            return false;
        }
        (0..COLS_N).all(|z| self.cells[Self::index_unchecked(x as usize, y as usize, z)] != 0)
    }

    /// Remove the z-row at `target_y` and shift the slice above it down by one
    ///
    /// Only cells with the given `z` move; row 0 of the slice becomes empty.
    pub fn collapse_z_row(&mut self, z: u8, target_y: u8) {
        if z >= COLS || target_y >= LOGICAL_ROWS {
            return;
        }
        let z = z as usize;
        for y in (1..=target_y as usize).rev() {
            let src = Self::index_unchecked(0, y - 1, z);
            let dst = Self::index_unchecked(0, y, z);
            self.cells.copy_within(src..src + COLS_N, dst);
        }
        let top = Self::index_unchecked(0, 0, z);
        self.cells[top..top + COLS_N].fill(0);
    }

    /// Remove the x-row at `target_y` and shift the slice above it down by one
    ///
    /// Only cells with the given `x` move; row 0 of the slice becomes empty.
    pub fn collapse_x_row(&mut self, x: u8, target_y: u8) {
        if x >= COLS || target_y >= LOGICAL_ROWS {
            return;
        }
        let x = x as usize;
        for z in 0..COLS_N {
            for y in (1..=target_y as usize).rev() {
                self.cells[Self::index_unchecked(x, y, z)] =
                    self.cells[Self::index_unchecked(x, y - 1, z)];
            }
            self.cells[Self::index_unchecked(x, 0, z)] = 0;
        }
    }

    /// Build a copy of the well turned by quarter turns about the vertical axis
    ///
    /// One turn maps `new[z][y][x] = old[last - x][y][z]`. Used for
    /// camera-relative presentation; game state is untouched.
    pub fn rotated_layout(&self, quarter_turns: u8) -> Board {
        let last = COLS_N - 1;
        let mut out = self.clone();
        for _ in 0..quarter_turns % 4 {
            let src = out.cells;
            for z in 0..COLS_N {
                for y in 0..ROWS_N {
                    for x in 0..COLS_N {
                        out.cells[Self::index_unchecked(x, y, z)] =
                            src[Self::index_unchecked(z, y, last - x)];
                    }
                }
            }
        }
        out
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Copy into a nested `[z][y][x]` grid (for observers)
    pub fn write_grid(&self, out: &mut BoardGrid) {
        for (z, plane) in out.iter_mut().enumerate() {
            for (y, row) in plane.iter_mut().enumerate() {
                let start = Self::index_unchecked(0, y, z);
                row.copy_from_slice(&self.cells[start..start + COLS_N]);
            }
        }
    }
}

/// Nested `[z][y][x]` copy of the well
pub type BoardGrid = [[[Cell; COLS_N]; ROWS_N]; COLS_N];

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
