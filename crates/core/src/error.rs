//! Errors for operations refused in the current phase
//!
//! An illegal move or rotation is not an error: it is an `Ok(false)` result.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum GameError {
    #[error("no game in progress")]
    NotPlaying,
    #[error("game is paused")]
    Paused,
    #[error("a line clear is waiting to be committed")]
    ClearPending,
    #[error("clear token is stale or unknown")]
    StaleClearToken,
}

