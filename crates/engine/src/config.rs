//! Loop configuration from environment variables

use crate::types::CLEAR_DELAY_MS;

/// Who commits a detected line clear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearGate {
    /// The loop commits it itself after `delay_ms`
    Auto { delay_ms: u32 },
    /// A client must send the clear token back
    External,
}

impl Default for ClearGate {
    fn default() -> Self {
        ClearGate::Auto {
            delay_ms: CLEAR_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub seed: u32,
    pub clear_gate: ClearGate,
    /// Capacity of the bounded command queue
    pub max_pending: usize,
    /// Capacity of the event broadcast ring
    pub event_capacity: usize,
    /// Start a game as soon as the loop spawns
    pub autostart: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            clear_gate: ClearGate::default(),
            max_pending: 10,
            event_capacity: 256,
            autostart: true,
        }
    }
}

impl LoopConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();

        let seed = env::var("TETRICUS_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.seed);

        let delay_ms = env::var("TETRICUS_CLEAR_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(CLEAR_DELAY_MS);

        let clear_gate = match env::var("TETRICUS_CLEAR_GATE") {
            Ok(v) if v.eq_ignore_ascii_case("external") => ClearGate::External,
            _ => ClearGate::Auto { delay_ms },
        };

        let max_pending = env::var("TETRICUS_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending);

        Self {
            seed,
            clear_gate,
            max_pending,
            ..defaults
        }
    }
}
