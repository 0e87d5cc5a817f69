use crate::board::BoardGrid;
use crate::catalog::BlockInstance;
use crate::events::ClearToken;
use crate::game_state::Phase;
use crate::types::{COLS, LOGICAL_ROWS};

/// Read-only copy of everything a renderer or remote observer needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    /// Cells indexed `[z][y][x]`
    pub board: BoardGrid,
    pub current: Option<BlockInstance>,
    pub next: Option<BlockInstance>,
    pub phase: Phase,
    pub episode_id: u32,
    pub seed: u32,
    pub frame_count: u32,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub tick_interval_ms: u32,
    pub clear_pending: Option<ClearToken>,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.board = [[[0u8; COLS as usize]; LOGICAL_ROWS as usize]; COLS as usize];
        self.current = None;
        self.next = None;
        self.phase = Phase::Idle;
        self.episode_id = 0;
        self.seed = 0;
        self.frame_count = 0;
        self.score = 0;
        self.level = 1;
        self.lines = 0;
        self.tick_interval_ms = 0;
        self.clear_pending = None;
    }

    pub fn playable(&self) -> bool {
        self.phase == Phase::Playing
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        let mut s = Self {
            board: [[[0u8; COLS as usize]; LOGICAL_ROWS as usize]; COLS as usize],
            current: None,
            next: None,
            phase: Phase::Idle,
            episode_id: 0,
            seed: 0,
            frame_count: 0,
            score: 0,
            level: 1,
            lines: 0,
            tick_interval_ms: 0,
            clear_pending: None,
        };
        s.clear();
        s
    }
}
