//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, the async engine, the wire adapter).
//!
//! # Well Dimensions
//!
//! The well is a cuboid with two equal horizontal axes and one vertical axis:
//!
//! - **x**: `COLS` columns (indexed 0-5, left to right)
//! - **z**: `COLS` columns (indexed 0-5, front to back)
//! - **y**: `LOGICAL_ROWS` rows (indexed 0-17, top to bottom)
//!
//! Rows `0..HIDDEN_ROWS` are a hidden spawn buffer above the visible field.
//! Blocks spawn with their voxel cube origin at `(START_X, START_Y, START_Z)`.
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `BASE_INTERVAL_MS` | 1000 | Gravity interval at level 1 |
//! | `SPEEDUP_RATE_MS` | 50 | Interval reduction per level |
//! | `MIN_INTERVAL_MS` | 100 | Interval floor at high levels |
//! | `CLEAR_DELAY_MS` | 180 | Default hold before a detected clear is committed |
//!
//! # Examples
//!
//! ```
//! use tetricus_types::{Axis, GameAction, Plane, COLS, LOGICAL_ROWS};
//!
//! assert_eq!(Axis::from_str("z"), Some(Axis::Z));
//! assert_eq!(Plane::from_str("xy"), Some(Plane::Xy));
//!
//! let action = GameAction::from_str("rotateZyReverse").unwrap();
//! assert_eq!(action, GameAction::RotateZyReverse);
//!
//! assert_eq!(COLS, 6);
//! assert_eq!(LOGICAL_ROWS, 18);
//! ```

/// Columns along each horizontal axis (x and z)
pub const COLS: u8 = 6;

/// Rows of the visible play field
pub const VISIBLE_ROWS: u8 = 14;

/// Rows of the hidden spawn buffer above the visible field
pub const HIDDEN_ROWS: u8 = 4;

/// Total rows of the well (hidden buffer + visible field)
pub const LOGICAL_ROWS: u8 = HIDDEN_ROWS + VISIBLE_ROWS;

/// Side length of a block's voxel cube
pub const VOXEL_LENGTH: usize = 4;

/// Spawn origin of the voxel cube (x)
pub const START_X: i8 = 1;

/// Spawn origin of the voxel cube (y)
pub const START_Y: i8 = 0;

/// Spawn origin of the voxel cube (z)
pub const START_Z: i8 = 1;

/// Gravity interval at level 1 (milliseconds per row)
pub const BASE_INTERVAL_MS: u32 = 1000;

/// Gravity speedup per level above 1
pub const SPEEDUP_RATE_MS: u32 = 50;

/// Lowest gravity interval ever scheduled
pub const MIN_INTERVAL_MS: u32 = 100;

/// Scale of the triangular level-up threshold (`RATE * (1 + 2 + ... + level)`)
pub const GOAL_LINES_RATE: u32 = 5;

/// Default delay before the engine auto-commits a detected clear
pub const CLEAR_DELAY_MS: u32 = 180;

/// A cell of the well.
///
/// - `0`: empty
/// - `n > 0`: occupied by the block whose catalog id is `n - 1`
pub type Cell = u8;

/// A block's voxel occupancy cube, indexed `[z][y][x]`, values `0` or `1`.
pub type Voxels = [[[u8; VOXEL_LENGTH]; VOXEL_LENGTH]; VOXEL_LENGTH];

/// A cube with no voxel set
pub const EMPTY_VOXELS: Voxels = [[[0; VOXEL_LENGTH]; VOXEL_LENGTH]; VOXEL_LENGTH];


/// Spatial axes of the well
///
/// - **X**, **Z**: the two horizontal axes
/// - **Y**: the vertical axis, growing downward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Offset `(dx, dy, dz)` for moving `distance` cells along this axis
    pub fn offset(&self, distance: i8) -> (i8, i8, i8) {
        match self {
            Axis::X => (distance, 0, 0),
            Axis::Y => (0, distance, 0),
            Axis::Z => (0, 0, distance),
        }
    }

    /// Parse axis from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// Rotation planes of a voxel cube
///
/// Each plane rotates the cube a quarter turn; the `sign` passed alongside
/// picks the direction, and opposite signs undo each other.
///
/// - **Xz**: x axis toward z axis (about the vertical axis)
/// - **Xy**: x axis toward y axis
/// - **Zy**: z axis toward y axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Xz,
    Xy,
    Zy,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Xz, Plane::Xy, Plane::Zy];

    /// Parse plane from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use tetricus_types::Plane;
    ///
    /// assert_eq!(Plane::from_str("XZ"), Some(Plane::Xz));
    /// assert_eq!(Plane::from_str("zy"), Some(Plane::Zy));
    /// assert_eq!(Plane::from_str("yz"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "xz" => Some(Plane::Xz),
            "xy" => Some(Plane::Xy),
            "zy" => Some(Plane::Zy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plane::Xz => "xz",
            Plane::Xy => "xy",
            Plane::Zy => "zy",
        }
    }
}

/// Horizontal direction a camera looks along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    PosX,
    NegX,
    PosZ,
    NegZ,
}

/// Screen-relative horizontal direction
///
/// `Near` points toward the viewer, `Far` away from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenDir {
    Left,
    Right,
    Near,
    Far,
}

impl Facing {
    /// Unit vector `(x, z)` of the facing
    pub fn vector(&self) -> (i8, i8) {
        match self {
            Facing::PosX => (1, 0),
            Facing::NegX => (-1, 0),
            Facing::PosZ => (0, 1),
            Facing::NegZ => (0, -1),
        }
    }

    /// Map a screen-relative direction onto a board axis move
    ///
    /// Returns the axis and the signed one-cell distance along it.
    pub fn resolve(&self, dir: ScreenDir) -> (Axis, i8) {
        let (fx, fz) = self.vector();
        match dir {
            ScreenDir::Left | ScreenDir::Right => {
                let d = if dir == ScreenDir::Right { 1 } else { -1 };
                if fx != 0 {
                    (Axis::Z, d * fx)
                } else {
                    (Axis::X, -d * fz)
                }
            }
            ScreenDir::Near | ScreenDir::Far => {
                let d = if dir == ScreenDir::Near { 1 } else { -1 };
                if fx != 0 {
                    (Axis::X, d * fx)
                } else {
                    (Axis::Z, d * fz)
                }
            }
        }
    }
}

/// Game actions that can be applied to modify game state
///
/// These actions are used by both human input and remote control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    /// Move block one cell toward -x
    MoveLeft,
    /// Move block one cell toward +x
    MoveRight,
    /// Move block one cell toward -z
    MoveForward,
    /// Move block one cell toward +z
    MoveBack,
    /// Move block one row down
    MoveDown,
    /// Drop block to the lowest valid row (it locks on the next tick)
    Drop,
    RotateXz,
    RotateXzReverse,
    RotateXy,
    RotateXyReverse,
    RotateZy,
    RotateZyReverse,
    Pause,
    Resume,
    /// Start a fresh game (at any time)
    NewGame,
    Quit,
}

impl GameAction {
    pub const ALL: [GameAction; 16] = [
        GameAction::MoveLeft,
        GameAction::MoveRight,
        GameAction::MoveForward,
        GameAction::MoveBack,
        GameAction::MoveDown,
        GameAction::Drop,
        GameAction::RotateXz,
        GameAction::RotateXzReverse,
        GameAction::RotateXy,
        GameAction::RotateXyReverse,
        GameAction::RotateZy,
        GameAction::RotateZyReverse,
        GameAction::Pause,
        GameAction::Resume,
        GameAction::NewGame,
        GameAction::Quit,
    ];

    /// Parse action from string (for the wire protocol)
    ///
    /// # Examples
    ///
    /// ```
    /// use tetricus_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("moveLeft"), Some(GameAction::MoveLeft));
    /// assert_eq!(GameAction::from_str("rotatexy"), Some(GameAction::RotateXy));
    /// assert_eq!(GameAction::from_str("hold"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "moveforward" => Some(GameAction::MoveForward),
            "moveback" => Some(GameAction::MoveBack),
            "movedown" => Some(GameAction::MoveDown),
            "drop" => Some(GameAction::Drop),
            "rotatexz" => Some(GameAction::RotateXz),
            "rotatexzreverse" => Some(GameAction::RotateXzReverse),
            "rotatexy" => Some(GameAction::RotateXy),
            "rotatexyreverse" => Some(GameAction::RotateXyReverse),
            "rotatezy" => Some(GameAction::RotateZy),
            "rotatezyreverse" => Some(GameAction::RotateZyReverse),
            "pause" => Some(GameAction::Pause),
            "resume" => Some(GameAction::Resume),
            "newgame" => Some(GameAction::NewGame),
            "quit" => Some(GameAction::Quit),
            _ => None,
        }
    }

    /// Convert to camelCase string for the wire protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::MoveForward => "moveForward",
            GameAction::MoveBack => "moveBack",
            GameAction::MoveDown => "moveDown",
            GameAction::Drop => "drop",
            GameAction::RotateXz => "rotateXz",
            GameAction::RotateXzReverse => "rotateXzReverse",
            GameAction::RotateXy => "rotateXy",
            GameAction::RotateXyReverse => "rotateXyReverse",
            GameAction::RotateZy => "rotateZy",
            GameAction::RotateZyReverse => "rotateZyReverse",
            GameAction::Pause => "pause",
            GameAction::Resume => "resume",
            GameAction::NewGame => "newGame",
            GameAction::Quit => "quit",
        }
    }

    /// Horizontal/vertical move carried by this action, if any
    pub fn movement(&self) -> Option<(Axis, i8)> {
        match self {
            GameAction::MoveLeft => Some((Axis::X, -1)),
            GameAction::MoveRight => Some((Axis::X, 1)),
            GameAction::MoveForward => Some((Axis::Z, -1)),
            GameAction::MoveBack => Some((Axis::Z, 1)),
            GameAction::MoveDown => Some((Axis::Y, 1)),
            _ => None,
        }
    }

    /// Rotation carried by this action, if any (`true` = forward sign)
    pub fn rotation(&self) -> Option<(Plane, bool)> {
        match self {
            GameAction::RotateXz => Some((Plane::Xz, true)),
            GameAction::RotateXzReverse => Some((Plane::Xz, false)),
            GameAction::RotateXy => Some((Plane::Xy, true)),
            GameAction::RotateXyReverse => Some((Plane::Xy, false)),
            GameAction::RotateZy => Some((Plane::Zy, true)),
            GameAction::RotateZyReverse => Some((Plane::Zy, false)),
            _ => None,
        }
    }
}
