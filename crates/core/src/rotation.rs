//! Rotation module - quarter turns of a voxel cube
//!
//! Each operator is a pure function of the cube: voxel `(x, y, z)` of the result is
//! read from a permuted and reflected coordinate of the input. `sign = true` and
//! `sign = false` are exact inverses. There is no wall kick: callers validate the
//! rotated block at its current position and discard the rotation if it collides.

use crate::types::{Plane, Voxels, EMPTY_VOXELS, VOXEL_LENGTH};

const LAST: usize = VOXEL_LENGTH - 1;

/// Rotate in the x→z plane (about the vertical axis)
pub fn rotate_xz(shape: &Voxels, sign: bool) -> Voxels {
    let mut out = EMPTY_VOXELS;
    for z in 0..VOXEL_LENGTH {
        for y in 0..VOXEL_LENGTH {
            for x in 0..VOXEL_LENGTH {
                out[z][y][x] = if sign {
                    shape[LAST - x][y][z]
                } else {
                    shape[x][y][LAST - z]
                };
            }
        }
    }
    out
}

/// Rotate in the x→y plane (about the z axis)
pub fn rotate_xy(shape: &Voxels, sign: bool) -> Voxels {
    let mut out = EMPTY_VOXELS;
    for z in 0..VOXEL_LENGTH {
        for y in 0..VOXEL_LENGTH {
            for x in 0..VOXEL_LENGTH {
                out[z][y][x] = if sign {
                    shape[z][LAST - x][y]
                } else {
                    shape[z][x][LAST - y]
                };
            }
        }
    }
    out
}

/// Rotate in the z→y plane (about the x axis)
pub fn rotate_zy(shape: &Voxels, sign: bool) -> Voxels {
    let mut out = EMPTY_VOXELS;
    for z in 0..VOXEL_LENGTH {
        for y in 0..VOXEL_LENGTH {
            for x in 0..VOXEL_LENGTH {
                out[z][y][x] = if sign {
                    shape[y][LAST - z][x]
                } else {
                    shape[LAST - y][z][x]
                };
            }
        }
    }
    out
}

/// Rotate in the given plane
pub fn rotate(shape: &Voxels, plane: Plane, sign: bool) -> Voxels {
    match plane {
        Plane::Xz => rotate_xz(shape, sign),
        Plane::Xy => rotate_xy(shape, sign),
        Plane::Zy => rotate_zy(shape, sign),
    }
}
