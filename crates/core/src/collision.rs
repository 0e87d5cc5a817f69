//! Collision module - the single legality check for blocks
//!
//! Every move, rotation, drop and spawn decision goes through [`validate`].

use crate::board::Board;
use crate::catalog::BlockInstance;
use crate::types::{COLS, LOGICAL_ROWS};

/// Check whether `block`, shifted by `(dx, dy, dz)`, fits in the well
///
/// Fails when any set voxel lands outside `[0, COLS)` on x or z, at or below the
/// floor (`y >= LOGICAL_ROWS`), or on an occupied cell. Rows above the top
/// (`y < 0`) are allowed so a freshly spawned block may stick out of the well.
pub fn validate(board: &Board, block: &BlockInstance, dx: i8, dy: i8, dz: i8) -> bool {
    let ox = block.x as i16 + dx as i16;
    let oy = block.y as i16 + dy as i16;
    let oz = block.z as i16 + dz as i16;

    block.voxels().all(|(x, y, z)| {
        let bx = ox + x as i16;
        let by = oy + y as i16;
        let bz = oz + z as i16;

        if bx < 0 || bx >= COLS as i16 || bz < 0 || bz >= COLS as i16 {
            return false;
        }
        if by >= LOGICAL_ROWS as i16 {
            return false;
        }
        by < 0 || !board.is_occupied(bx as i8, by as i8, bz as i8)
    })
}

/// How many rows `block` can fall before it rests on something
pub fn drop_distance(board: &Board, block: &BlockInstance) -> i8 {
    let mut distance: i8 = 0;
    while validate(board, block, 0, distance + 1, 0) {
        distance += 1;
    }
    distance
}
