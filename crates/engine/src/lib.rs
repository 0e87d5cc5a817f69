//! Engine - async host for the core game state
//!
//! The core never reads a clock; this crate gives it one. [`spawn`] moves a
//! [`GameState`](tetricus_core::GameState) onto a tokio task that sleeps until
//! the state's next scheduled tick, applies commands from a bounded queue, and
//! broadcasts every [`GameEvent`](tetricus_core::GameEvent).
//!
//! Detected line clears are committed by the loop itself after a short delay
//! ([`ClearGate::Auto`]) or held until a client returns the clear token
//! ([`ClearGate::External`]).
//!
//! # Environment Variables
//!
//! - `TETRICUS_SEED`: RNG seed (default: 1)
//! - `TETRICUS_CLEAR_GATE`: `auto` (default) or `external`
//! - `TETRICUS_CLEAR_DELAY_MS`: Auto-commit delay (default: 180)
//! - `TETRICUS_MAX_PENDING`: Command queue capacity (default: 10)

pub mod config;
pub mod game_loop;

pub use tetricus_core as core;
pub use tetricus_types as types;

pub use config::{ClearGate, LoopConfig};
pub use game_loop::{spawn, spawn_with_state, EngineError, GameHandle, GameLoop, LoopCommand};
