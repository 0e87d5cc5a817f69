//! Scoring module - points, levels and the gravity curve
//!
//! - A clear of `n` combined rows scores `n` when `n <= 1`, else `2^n`.
//! - Level `L` is left once total cleared rows reach `GOAL_LINES_RATE * (1 + 2 + ... + L)`.
//!   A single large clear may cross several thresholds and gains every level it crosses.
//! - Gravity interval is `BASE_INTERVAL_MS - SPEEDUP_RATE_MS * (level - 1)`, floored at
//!   `MIN_INTERVAL_MS`.

use crate::types::{BASE_INTERVAL_MS, GOAL_LINES_RATE, MIN_INTERVAL_MS, SPEEDUP_RATE_MS};

/// Points for a single clear event of `lines` combined rows
pub fn score_for_lines(lines: u32) -> u32 {
    if lines <= 1 {
        lines
    } else {
        1u32.checked_shl(lines).unwrap_or(u32::MAX)
    }
}

/// Total cleared rows needed to leave `level`
pub fn goal_lines(level: u32) -> u64 {
    let level = level as u64;
    GOAL_LINES_RATE as u64 * (level * (level + 1) / 2)
}

/// Level reached from `level` once `sum_of_clear_lines` rows are cleared
pub fn next_level(level: u32, sum_of_clear_lines: u32) -> u32 {
    let mut level = level.max(1);
    while sum_of_clear_lines as u64 >= goal_lines(level) {
        level += 1;
    }
    level
}

/// Gravity interval at `level` (milliseconds per row)
pub fn tick_interval_ms(level: u32) -> u32 {
    let speedup = SPEEDUP_RATE_MS.saturating_mul(level.saturating_sub(1));
    BASE_INTERVAL_MS
        .saturating_sub(speedup)
        .max(MIN_INTERVAL_MS)
}

/// Outcome of recording one clear event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    pub lines: u32,
    pub points: u32,
    pub level_before: u32,
    pub level_after: u32,
}

impl ScoreResult {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Score, level and cleared-row total of one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Progress {
    score: u32,
    level: u32,
    sum_of_clear_lines: u32,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            score: 0,
            level: 1,
            sum_of_clear_lines: 0,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn sum_of_clear_lines(&self) -> u32 {
        self.sum_of_clear_lines
    }

    pub fn tick_interval_ms(&self) -> u32 {
        tick_interval_ms(self.level)
    }

    /// Apply one clear event: totals, level check, then points
    ///
    /// A zero-line event changes nothing.
    pub fn record_clear(&mut self, lines: u32) -> ScoreResult {
        let level_before = self.level;
        if lines == 0 {
            return ScoreResult {
                lines,
                points: 0,
                level_before,
                level_after: level_before,
            };
        }

        self.sum_of_clear_lines = self.sum_of_clear_lines.saturating_add(lines);
        self.level = next_level(self.level, self.sum_of_clear_lines);
        let points = score_for_lines(lines);
        self.score = self.score.saturating_add(points);

        ScoreResult {
            lines,
            points,
            level_before,
            level_after: self.level,
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}
