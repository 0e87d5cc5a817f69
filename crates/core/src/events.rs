//! Events module - notifications queued by the game state
//!
//! The state pushes events as it changes; the owner drains them with
//! [`GameState::drain_events`](crate::GameState::drain_events) and forwards
//! them to whoever renders or records the game.

use crate::catalog::BlockInstance;
use crate::line_clear::FilledRows;

/// One-shot handle for committing a pending line clear
///
/// Tokens are never reused within a [`GameState`](crate::GameState), so a token
/// from an earlier clear or an earlier game is always stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearToken(u64);

impl ClearToken {
    /// Rebuild a token from its wire id
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    GameStarted,
    GameOver,
    GameQuit,
    Paused,
    Resumed,
    /// A block became current at the spawn origin
    BlockSpawned(BlockInstance),
    /// A new preview block was drawn
    NextBlockReady(BlockInstance),
    /// The current block moved, dropped or rotated
    BlockMoved(BlockInstance),
    /// One gravity step ran
    Tick { froze: bool },
    /// A block was written into the board
    Frozen(BlockInstance),
    /// Completed rows were detected; the game waits for `token`
    ClearPending { rows: FilledRows, token: ClearToken },
    /// Rows collapsed and progress updated
    ClearCommitted {
        lines: u32,
        points: u32,
        score: u32,
        level: u32,
    },
}

impl GameEvent {
    /// Kebab-case event name
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::GameStarted => "game-started",
            GameEvent::GameOver => "game-over",
            GameEvent::GameQuit => "game-quit",
            GameEvent::Paused => "paused",
            GameEvent::Resumed => "resumed",
            GameEvent::BlockSpawned(_) => "block-spawned",
            GameEvent::NextBlockReady(_) => "next-block-ready",
            GameEvent::BlockMoved(_) => "block-moved",
            GameEvent::Tick { .. } => "tick",
            GameEvent::Frozen(_) => "frozen",
            GameEvent::ClearPending { .. } => "clear-pending",
            GameEvent::ClearCommitted { .. } => "clear-committed",
        }
    }
}
