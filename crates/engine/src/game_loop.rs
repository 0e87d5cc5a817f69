//! Game loop - drives one `GameState` on tokio timers
//!
//! The loop is the only owner of the state. Everything else talks to it through
//! a [`GameHandle`]: commands go in over a bounded channel and get a oneshot
//! reply, events come out over a broadcast channel.
//!
//! Timers follow the state's own schedule. A tick deadline is armed for the
//! ticket [`GameState::scheduled`] returns and re-armed only when the ticket
//! changes, so moves and rotations never push gravity back. A paused or
//! finished game has no ticket and the timer branch never completes.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::config::{ClearGate, LoopConfig};
use crate::core::{ClearToken, GameError, GameEvent, GameSnapshot, GameState, Phase, TickTicket};
use crate::types::GameAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("command queue is full")]
    Backpressure,
    #[error("game loop has stopped")]
    Closed,
}

/// Request delivered to the loop
#[derive(Debug)]
pub enum LoopCommand {
    Action {
        action: GameAction,
        reply: oneshot::Sender<Result<bool, GameError>>,
    },
    ContinueClear {
        token: ClearToken,
        reply: oneshot::Sender<Result<u32, GameError>>,
    },
    Snapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },
}

/// Cloneable access to a running loop
#[derive(Debug, Clone)]
pub struct GameHandle {
    cmd_tx: mpsc::Sender<LoopCommand>,
    event_tx: broadcast::Sender<GameEvent>,
}

impl GameHandle {
    /// Apply an action, waiting for queue space
    pub async fn apply(&self, action: GameAction) -> Result<bool, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(LoopCommand::Action { action, reply })
            .await
            .map_err(|_| EngineError::Closed)?;
        Ok(rx.await.map_err(|_| EngineError::Closed)??)
    }

    /// Apply an action, failing with [`EngineError::Backpressure`] when the queue is full
    pub async fn try_apply(&self, action: GameAction) -> Result<bool, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.try_enqueue(LoopCommand::Action { action, reply })?;
        Ok(rx.await.map_err(|_| EngineError::Closed)??)
    }

    /// Commit a pending clear
    pub async fn continue_clear(&self, token: ClearToken) -> Result<u32, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.try_enqueue(LoopCommand::ContinueClear { token, reply })?;
        Ok(rx.await.map_err(|_| EngineError::Closed)??)
    }

    pub async fn snapshot(&self) -> Result<GameSnapshot, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(LoopCommand::Snapshot { reply })
            .await
            .map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.event_tx.subscribe()
    }

    fn try_enqueue(&self, cmd: LoopCommand) -> Result<(), EngineError> {
        self.cmd_tx.try_send(cmd).map_err(|e| match e {
            TrySendError::Full(_) => EngineError::Backpressure,
            TrySendError::Closed(_) => EngineError::Closed,
        })
    }
}

pub struct GameLoop {
    state: GameState,
    clear_gate: ClearGate,
    cmd_rx: mpsc::Receiver<LoopCommand>,
    event_tx: broadcast::Sender<GameEvent>,
}

impl GameLoop {
    pub fn new(config: &LoopConfig, state: GameState) -> (Self, GameHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.max_pending.max(1));
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let handle = GameHandle {
            cmd_tx,
            event_tx: event_tx.clone(),
        };
        let game_loop = Self {
            state,
            clear_gate: config.clear_gate,
            cmd_rx,
            event_tx,
        };
        (game_loop, handle)
    }

    /// Run until the game quits or every handle is dropped
    ///
    /// Returns the final state.
    pub async fn run(mut self) -> GameState {
        let mut tick: Option<(Instant, TickTicket)> = None;
        let mut clear: Option<(Instant, ClearToken)> = None;

        loop {
            self.publish();
            if self.state.phase() == Phase::Quit {
                break;
            }
            tick = rearm_tick(tick, self.state.scheduled());
            clear = self.rearm_clear(clear);

            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                _ = sleep_or_never(tick.map(|(at, _)| at)) => {
                    if let Some((_, ticket)) = tick.take() {
                        self.state.fire(ticket);
                    }
                }
                _ = sleep_or_never(clear.map(|(at, _)| at)) => {
                    if let Some((_, token)) = clear.take() {
                        if let Err(e) = self.state.continue_clear(token) {
                            tracing::debug!(error = %e, "auto clear skipped");
                        }
                    }
                }
            }
        }

        tracing::info!(
            episode = self.state.episode_id(),
            phase = self.state.phase().as_str(),
            "game loop stopped"
        );
        self.state
    }

    fn handle(&mut self, cmd: LoopCommand) {
        match cmd {
            LoopCommand::Action { action, reply } => {
                let result = self.state.apply_action(action);
                if let Err(e) = &result {
                    tracing::debug!(action = action.as_str(), error = %e, "action rejected");
                }
                let _ = reply.send(result);
            }
            LoopCommand::ContinueClear { token, reply } => {
                let _ = reply.send(self.state.continue_clear(token));
            }
            LoopCommand::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot());
            }
        }
    }

    /// Fan queued events out to subscribers
    fn publish(&mut self) {
        for event in self.state.drain_events() {
            match &event {
                GameEvent::GameStarted => tracing::info!(
                    episode = self.state.episode_id(),
                    seed = self.state.seed(),
                    "game started"
                ),
                GameEvent::GameOver => tracing::info!(
                    score = self.state.score(),
                    level = self.state.level(),
                    lines = self.state.sum_of_clear_lines(),
                    "game over"
                ),
                GameEvent::ClearPending { rows, token } => tracing::debug!(
                    token = token.id(),
                    lines = rows.line_count(),
                    "clear pending"
                ),
                GameEvent::ClearCommitted {
                    lines,
                    score,
                    level,
                    ..
                } => tracing::debug!(lines = *lines, score = *score, level = *level, "clear committed"),
                _ => {}
            }
            // No subscribers is fine.
            let _ = self.event_tx.send(event);
        }
    }

    fn rearm_clear(&self, armed: Option<(Instant, ClearToken)>) -> Option<(Instant, ClearToken)> {
        let ClearGate::Auto { delay_ms } = self.clear_gate else {
            return None;
        };
        let token = self.state.pending_clear()?.token;
        match armed {
            Some((at, t)) if t == token => Some((at, t)),
            _ => Some((Instant::now() + Duration::from_millis(delay_ms as u64), token)),
        }
    }
}

fn rearm_tick(
    armed: Option<(Instant, TickTicket)>,
    scheduled: Option<TickTicket>,
) -> Option<(Instant, TickTicket)> {
    match (armed, scheduled) {
        (Some((at, a)), Some(s)) if a == s => Some((at, a)),
        (_, Some(s)) => Some((Instant::now() + Duration::from_millis(s.delay_ms as u64), s)),
        (_, None) => None,
    }
}

async fn sleep_or_never(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Start a loop for a fresh state built from `config`
pub fn spawn(config: LoopConfig) -> (GameHandle, JoinHandle<GameState>) {
    let mut state = GameState::new(config.seed);
    if config.autostart {
        state.new_game();
    }
    spawn_with_state(&config, state)
}

/// Start a loop around an existing state
pub fn spawn_with_state(config: &LoopConfig, state: GameState) -> (GameHandle, JoinHandle<GameState>) {
    let (game_loop, handle) = GameLoop::new(config, state);
    (handle, tokio::spawn(game_loop.run()))
}
