//! Core game logic module - pure, deterministic, and testable
//!
//! This crate contains every rule of the 3D falling-block game: the well, the
//! block catalog and its rotations, collision, dual-axis line clearing, scoring
//! and the gravity state machine. It has **no dependencies** on clocks,
//! networking, or I/O, making it:
//!
//! - **Deterministic**: Same seed produces identical games
//! - **Testable**: Every rule is reachable from plain function calls
//! - **Portable**: The async engine and any other host drive the same state
//!
//! # Module Structure
//!
//! - [`board`]: 6x18x6 well with freeze and per-slice collapse
//! - [`catalog`]: Block templates and positioned instances
//! - [`rotation`]: Quarter turns of a voxel cube in three planes
//! - [`collision`]: The single legality check for moves, rotations and spawns
//! - [`line_clear`]: Completed-row detection along x and z, and collapse
//! - [`scoring`]: Points, levels and the gravity curve
//! - [`game_state`]: Tick schedule, pending clears, lifecycle
//! - [`events`]: Notifications drained by the host
//! - [`rng`]: Seeded LCG for spawn selection
//!
//! # Example
//!
//! ```
//! use tetricus_core::{GameEvent, GameState, Phase};
//! use tetricus_types::GameAction;
//!
//! let mut game = GameState::new(12345);
//! game.new_game();
//!
//! game.apply_action(GameAction::MoveRight).unwrap();
//! game.apply_action(GameAction::RotateXz).unwrap();
//! game.apply_action(GameAction::Drop).unwrap();
//!
//! // The dropped block freezes on the next tick.
//! let ticket = game.scheduled().unwrap();
//! assert!(game.fire(ticket));
//! assert_eq!(game.phase(), Phase::Playing);
//! assert!(game.drain_events().contains(&GameEvent::Tick { froze: true }));
//! ```
//!
//! # Timing
//!
//! The state never reads a clock. [`GameState::scheduled`] names the next tick
//! and its delay; the host sleeps and calls [`GameState::fire`]. Gravity starts
//! at 1000ms per row and speeds up by 50ms per level, never below 100ms.

pub mod board;
pub mod catalog;
pub mod collision;
pub mod error;
pub mod events;
pub mod game_state;
pub mod line_clear;
pub mod rng;
pub mod rotation;
pub mod scoring;
pub mod snapshot;

pub use tetricus_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, BoardGrid};
pub use catalog::{BlockInstance, BlockTemplate, Catalog, STANDARD_TEMPLATES};
pub use collision::{drop_distance, validate};
pub use error::GameError;
pub use events::{ClearToken, GameEvent};
pub use game_state::{GameState, PendingClear, Phase, TickTicket};
pub use line_clear::{FilledLevel, FilledRows};
pub use rng::SimpleRng;
pub use rotation::rotate;
pub use scoring::{score_for_lines, Progress, ScoreResult};
pub use snapshot::GameSnapshot;
