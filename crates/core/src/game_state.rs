//! Game state module - the gravity-driven state machine
//!
//! This module ties together all core components: board, catalog, rotation,
//! collision, line clearing and scoring. It owns the logical tick schedule and
//! the pending-clear handshake, and queues a [`GameEvent`] for every change.
//!
//! The state never sleeps. It publishes the next tick as a [`TickTicket`]; the
//! owner waits `delay_ms` and hands the ticket back to [`GameState::fire`]. Every
//! reschedule or cancel bumps a generation counter, so a ticket taken before a
//! pause, a quit or a new game can never run.

use crate::board::Board;
use crate::catalog::{BlockInstance, Catalog};
use crate::collision::{drop_distance, validate};
use crate::error::GameError;
use crate::events::{ClearToken, GameEvent};
use crate::line_clear::{collapse, detect, FilledRows};
use crate::rng::SimpleRng;
use crate::rotation::rotate;
use crate::scoring::Progress;
use crate::snapshot::GameSnapshot;
use crate::types::{Axis, Facing, GameAction, Plane, ScreenDir, HIDDEN_ROWS};

/// Lifecycle phase of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Never started
    #[default]
    Idle,
    Playing,
    Paused,
    /// A detected clear waits for [`GameState::continue_clear`]
    ClearPending,
    GameOver,
    Quit,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Playing => "playing",
            Phase::Paused => "paused",
            Phase::ClearPending => "clear_pending",
            Phase::GameOver => "gameover",
            Phase::Quit => "quit",
        }
    }
}

/// A scheduled gravity step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickTicket {
    pub generation: u64,
    /// Delay from the moment of scheduling
    pub delay_ms: u32,
}

/// A detected clear waiting for its commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingClear {
    pub token: ClearToken,
    pub rows: FilledRows,
    /// The block whose freeze completed the rows
    pub frozen: BlockInstance,
    /// A pause arrived while waiting; the commit enters [`Phase::Paused`]
    pub pause_requested: bool,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    catalog: Catalog,
    rng: SimpleRng,
    seed: u32,
    board: Board,
    current: Option<BlockInstance>,
    next: Option<BlockInstance>,
    progress: Progress,
    /// Blocks spawned after a freeze in the current game
    frame_count: u32,
    /// Monotonic episode id (increments on every new game)
    episode_id: u32,
    phase: Phase,
    generation: u64,
    scheduled: Option<TickTicket>,
    pending_clear: Option<PendingClear>,
    /// Never reset, so tokens stay unique across games
    clear_seq: u64,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle game over the standard catalog
    pub fn new(seed: u32) -> Self {
        Self::with_catalog(Catalog::standard(), seed)
    }

    pub fn with_catalog(catalog: Catalog, seed: u32) -> Self {
        Self {
            catalog,
            rng: SimpleRng::new(seed),
            seed,
            board: Board::new(),
            current: None,
            next: None,
            progress: Progress::new(),
            frame_count: 0,
            episode_id: 0,
            phase: Phase::Idle,
            generation: 0,
            scheduled: None,
            pending_clear: None,
            clear_seq: 0,
            events: Vec::new(),
        }
    }

    /// Reset everything and start playing
    ///
    /// Valid in any phase. The RNG keeps running, so consecutive games from one
    /// seed differ while the whole session stays reproducible.
    pub fn new_game(&mut self) {
        self.board.clear();
        self.progress = Progress::new();
        self.frame_count = 0;
        self.episode_id = self.episode_id.wrapping_add(1);
        self.pending_clear = None;
        self.current = None;
        self.next = Some(self.catalog.draw(&mut self.rng));
        self.phase = Phase::Playing;
        self.events.push(GameEvent::GameStarted);
        self.promote_next();
        self.schedule();
    }

    /// Pause gravity and input
    ///
    /// While a clear is pending the request is held and takes effect once the
    /// clear commits.
    pub fn pause(&mut self) -> bool {
        if let Some(pending) = self.pending_clear.as_mut() {
            if pending.pause_requested {
                return false;
            }
            pending.pause_requested = true;
            return true;
        }
        if self.phase != Phase::Playing {
            return false;
        }
        self.phase = Phase::Paused;
        self.cancel_schedule();
        self.events.push(GameEvent::Paused);
        true
    }

    /// Leave pause and schedule one tick at the stored interval
    ///
    /// During a pending clear this withdraws a held pause request.
    pub fn resume(&mut self) -> bool {
        if let Some(pending) = self.pending_clear.as_mut() {
            let held = pending.pause_requested;
            pending.pause_requested = false;
            return held;
        }
        if self.phase != Phase::Paused {
            return false;
        }
        self.phase = Phase::Playing;
        self.events.push(GameEvent::Resumed);
        self.schedule();
        true
    }

    pub fn quit(&mut self) -> bool {
        if self.phase == Phase::Quit {
            return false;
        }
        self.phase = Phase::Quit;
        self.pending_clear = None;
        self.cancel_schedule();
        self.events.push(GameEvent::GameQuit);
        true
    }

    /// Run the ticket's tick if it is still the current schedule
    pub fn fire(&mut self, ticket: TickTicket) -> bool {
        if self.scheduled != Some(ticket) {
            return false;
        }
        self.scheduled = None;
        self.tick();
        true
    }

    /// One gravity step
    ///
    /// Moves the current block down a row. When it cannot descend it is frozen,
    /// completed rows are detected, and either a clear goes pending or the next
    /// block spawns. Returns whether a freeze happened. Does nothing outside
    /// [`Phase::Playing`].
    pub fn tick(&mut self) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        let Some(current) = self.current else {
            return false;
        };

        if validate(&self.board, &current, 0, 1, 0) {
            let moved = current.moved(0, 1, 0);
            self.current = Some(moved);
            self.events.push(GameEvent::BlockMoved(moved));
            self.events.push(GameEvent::Tick { froze: false });
            self.schedule();
            return false;
        }

        self.board.freeze(&current);
        self.current = None;
        self.events.push(GameEvent::Frozen(current));

        let rows = detect(&self.board);
        if rows.is_empty() {
            self.settle(current);
        } else {
            self.clear_seq += 1;
            let token = ClearToken::from_raw(self.clear_seq);
            self.phase = Phase::ClearPending;
            self.cancel_schedule();
            self.events.push(GameEvent::ClearPending {
                rows: rows.clone(),
                token,
            });
            self.pending_clear = Some(PendingClear {
                token,
                rows,
                frozen: current,
                pause_requested: false,
            });
        }
        self.events.push(GameEvent::Tick { froze: true });
        true
    }

    /// Commit the pending clear: collapse, score, then spawn or end the game
    ///
    /// Returns the combined number of rows cleared.
    pub fn continue_clear(&mut self, token: ClearToken) -> Result<u32, GameError> {
        match &self.pending_clear {
            Some(pending) if pending.token == token => {}
            _ => return Err(GameError::StaleClearToken),
        }
        let Some(pending) = self.pending_clear.take() else {
            return Err(GameError::StaleClearToken);
        };

        let lines = collapse(&mut self.board, &pending.rows);
        let result = self.progress.record_clear(lines);
        self.events.push(GameEvent::ClearCommitted {
            lines,
            points: result.points,
            score: self.progress.score(),
            level: self.progress.level(),
        });
        self.phase = Phase::Playing;
        self.settle(pending.frozen);
        if pending.pause_requested {
            self.pause();
        }
        Ok(lines)
    }

    /// Move the current block `distance` cells along `axis`
    ///
    /// The block travels cell by cell and every intermediate position must be
    /// legal; otherwise nothing moves. The vertical axis only moves down.
    pub fn move_block(&mut self, axis: Axis, distance: i8) -> Result<bool, GameError> {
        let current = self.input_block()?;
        if distance == 0 || (axis == Axis::Y && distance < 0) {
            return Ok(false);
        }

        let step = distance.signum();
        let mut candidate = current;
        for _ in 0..distance.unsigned_abs() {
            let (dx, dy, dz) = axis.offset(step);
            if !validate(&self.board, &candidate, dx, dy, dz) {
                return Ok(false);
            }
            candidate = candidate.moved(dx, dy, dz);
        }

        self.current = Some(candidate);
        self.events.push(GameEvent::BlockMoved(candidate));
        Ok(true)
    }

    /// Drop the current block to the lowest legal row
    ///
    /// The block is not frozen here; the next tick freezes it. Returns the
    /// number of rows fallen.
    pub fn drop_block(&mut self) -> Result<u32, GameError> {
        let current = self.input_block()?;
        let distance = drop_distance(&self.board, &current);
        if distance > 0 {
            let dropped = current.moved(0, distance, 0);
            self.current = Some(dropped);
            self.events.push(GameEvent::BlockMoved(dropped));
        }
        Ok(distance as u32)
    }

    /// Rotate the current block in place, discarding a colliding rotation
    pub fn rotate_block(&mut self, plane: Plane, sign: bool) -> Result<bool, GameError> {
        let current = self.input_block()?;
        let candidate = current.with_shape(rotate(&current.shape, plane, sign));
        if !validate(&self.board, &candidate, 0, 0, 0) {
            return Ok(false);
        }
        self.current = Some(candidate);
        self.events.push(GameEvent::BlockMoved(candidate));
        Ok(true)
    }

    /// Move along the board axis a screen direction maps to for `facing`
    pub fn relative_move(&mut self, facing: Facing, dir: ScreenDir) -> Result<bool, GameError> {
        let (axis, distance) = facing.resolve(dir);
        self.move_block(axis, distance)
    }

    /// Apply a game action
    ///
    /// Lifecycle actions never fail; they report whether anything changed.
    pub fn apply_action(&mut self, action: GameAction) -> Result<bool, GameError> {
        if let Some((axis, distance)) = action.movement() {
            return self.move_block(axis, distance);
        }
        if let Some((plane, sign)) = action.rotation() {
            return self.rotate_block(plane, sign);
        }
        match action {
            GameAction::Drop => self.drop_block().map(|rows| rows > 0),
            GameAction::Pause => Ok(self.pause()),
            GameAction::Resume => Ok(self.resume()),
            GameAction::NewGame => {
                self.new_game();
                Ok(true)
            }
            GameAction::Quit => Ok(self.quit()),
            _ => Ok(false),
        }
    }

    /// Take every queued event, oldest first
    ///
    /// Events accumulate until drained. An owner that never calls this grows
    /// the queue without bound, so drain after every operation or tick.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access to the well, for setting up positions in tools and tests
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current(&self) -> Option<&BlockInstance> {
        self.current.as_ref()
    }

    pub fn next(&self) -> Option<&BlockInstance> {
        self.next.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.progress.score()
    }

    pub fn level(&self) -> u32 {
        self.progress.level()
    }

    pub fn sum_of_clear_lines(&self) -> u32 {
        self.progress.sum_of_clear_lines()
    }

    pub fn tick_interval_ms(&self) -> u32 {
        self.progress.tick_interval_ms()
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A game is in progress (including paused or waiting on a clear)
    pub fn is_playing(&self) -> bool {
        matches!(
            self.phase,
            Phase::Playing | Phase::Paused | Phase::ClearPending
        )
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn lose(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn pending_clear(&self) -> Option<&PendingClear> {
        self.pending_clear.as_ref()
    }

    /// The tick the owner should fire next, if any
    pub fn scheduled(&self) -> Option<TickTicket> {
        self.scheduled
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.board.write_grid(&mut out.board);
        out.current = self.current;
        out.next = self.next;
        out.phase = self.phase;
        out.episode_id = self.episode_id;
        out.seed = self.seed;
        out.frame_count = self.frame_count;
        out.score = self.progress.score();
        out.level = self.progress.level();
        out.lines = self.progress.sum_of_clear_lines();
        out.tick_interval_ms = self.progress.tick_interval_ms();
        out.clear_pending = self.pending_clear.as_ref().map(|p| p.token);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut out = GameSnapshot::default();
        self.snapshot_into(&mut out);
        out
    }

    fn input_block(&self) -> Result<BlockInstance, GameError> {
        match self.phase {
            Phase::Playing => self.current.ok_or(GameError::NotPlaying),
            Phase::Paused => Err(GameError::Paused),
            Phase::ClearPending => Err(GameError::ClearPending),
            Phase::Idle | Phase::GameOver | Phase::Quit => Err(GameError::NotPlaying),
        }
    }

    /// After a freeze (and its clear, if any): end the game or spawn the next block
    fn settle(&mut self, frozen: BlockInstance) {
        let locked_out = !frozen.cells().any(|(_, y, _)| y >= HIDDEN_ROWS as i8);
        let blocked = match self.next {
            Some(next) => !validate(&self.board, &next.at_spawn(), 0, 0, 0),
            None => true,
        };
        if locked_out || blocked {
            self.phase = Phase::GameOver;
            self.cancel_schedule();
            self.events.push(GameEvent::GameOver);
            return;
        }

        self.frame_count += 1;
        self.promote_next();
        self.schedule();
    }

    fn promote_next(&mut self) {
        let Some(next) = self.next else {
            return;
        };
        let current = next.at_spawn();
        let upcoming = self.catalog.draw(&mut self.rng);
        self.current = Some(current);
        self.next = Some(upcoming);
        self.events.push(GameEvent::BlockSpawned(current));
        self.events.push(GameEvent::NextBlockReady(upcoming));
    }

    fn schedule(&mut self) {
        self.generation += 1;
        self.scheduled = Some(TickTicket {
            generation: self.generation,
            delay_ms: self.progress.tick_interval_ms(),
        });
    }

    fn cancel_schedule(&mut self) {
        self.generation += 1;
        self.scheduled = None;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}
