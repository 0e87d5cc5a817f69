//! Line clear module - dual-axis row detection and collapse
//!
//! A level `y` can complete rows along both horizontal axes at once:
//!
//! - a **z-row** runs along x at a fixed depth `z` (every `x` occupied)
//! - an **x-row** runs along z at a fixed column `x` (every `z` occupied)
//!
//! Detection is pure. Collapse removes each completed row by shifting its own
//! slice down one row. Collapse order is fixed: levels from the top of the well
//! downward, and within a level all z-rows (ascending `z`) before all x-rows
//! (ascending `x`). Top-down keeps the detected `y` of lower levels valid, since a
//! collapse only moves rows at or above its target.

use arrayvec::ArrayVec;

use crate::board::Board;
use crate::types::{COLS, LOGICAL_ROWS};

const COLS_N: usize = COLS as usize;
const ROWS_N: usize = LOGICAL_ROWS as usize;

/// Completed rows at one level
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FilledLevel {
    pub y: u8,
    /// Depths `z` whose row along x is complete
    pub z_rows: ArrayVec<u8, COLS_N>,
    /// Columns `x` whose row along z is complete
    pub x_rows: ArrayVec<u8, COLS_N>,
}

impl FilledLevel {
    pub fn line_count(&self) -> u32 {
        (self.z_rows.len() + self.x_rows.len()) as u32
    }
}

/// Every completed row in the well, ordered bottom to top
///
/// Levels without a completed row are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FilledRows {
    levels: ArrayVec<FilledLevel, ROWS_N>,
}

impl FilledRows {
    pub fn levels(&self) -> &[FilledLevel] {
        &self.levels
    }

    pub fn level(&self, y: u8) -> Option<&FilledLevel> {
        self.levels.iter().find(|l| l.y == y)
    }

    /// Combined count of completed rows across both axes and all levels
    pub fn line_count(&self) -> u32 {
        self.levels.iter().map(FilledLevel::line_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Find every completed row, scanning from the bottom up
pub fn detect(board: &Board) -> FilledRows {
    let mut out = FilledRows::default();
    for y in (0..LOGICAL_ROWS).rev() {
        let mut level = FilledLevel {
            y,
            ..FilledLevel::default()
        };
        for z in 0..COLS {
            if board.is_z_row_full(y, z) {
                level.z_rows.push(z);
            }
        }
        for x in 0..COLS {
            if board.is_x_row_full(y, x) {
                level.x_rows.push(x);
            }
        }
        if level.line_count() > 0 {
            out.levels.push(level);
        }
    }
    out
}

/// Collapse every detected row and return the combined count
pub fn collapse(board: &mut Board, rows: &FilledRows) -> u32 {
    for level in rows.levels.iter().rev() {
        for &z in &level.z_rows {
            board.collapse_z_row(z, level.y);
        }
        for &x in &level.x_rows {
            board.collapse_x_row(x, level.y);
        }
    }
    rows.line_count()
}
