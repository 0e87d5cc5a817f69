//! TCP server for remote clients
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking and talks to the game only through a
//! [`GameHandle`].

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::core::{ClearToken, GameEvent, GameSnapshot};
use crate::protocol::*;
use crate::types::{COLS, LOGICAL_ROWS};
use tetricus_engine::{ClearGate, EngineError, GameHandle};

/// Stable 64-bit FNV-1a hasher for deterministic `state_hash`.
///
/// We avoid `DefaultHasher` here since its output is not guaranteed stable across
/// Rust versions/platforms.
#[derive(Debug, Clone)]
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl std::hash::Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

impl From<ClearGate> for ClearGateName {
    fn from(gate: ClearGate) -> Self {
        match gate {
            ClearGate::Auto { .. } => ClearGateName::Auto,
            ClearGate::External => ClearGateName::External,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    /// Advertised in `welcome`; must match the engine's gate
    pub clear_gate: ClearGateName,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            protocol_version: PROTOCOL_VERSION.to_string(),
            clear_gate: ClearGateName::Auto,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();

        let host = env::var("TETRICUS_HOST").unwrap_or(defaults.host);
        let port = env::var("TETRICUS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        Self {
            host,
            port,
            ..Self::default()
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if the server is disabled via environment
    pub fn is_disabled() -> bool {
        std::env::var("TETRICUS_ADAPTER_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

/// Shared server state
struct ServerState {
    config: ServerConfig,
    handle: GameHandle,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<u64>>,
    /// Sequence numbers for server-initiated messages
    out_seq: AtomicU64,
}

impl ServerState {
    fn next_seq(&self) -> u64 {
        self.out_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn is_handshaken(&self, client_id: u64) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    async fn check_and_update_seq(&self, client_id: u64, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };

        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn is_controller(&self, client_id: u64) -> bool {
        *self.controller.read().await == Some(client_id)
    }

    /// Handshake, sequencing and controller checks shared by `command` and `continue`
    async fn authorize(&self, client_id: u64, seq: u64, what: &str) -> Result<(), ErrorMessage> {
        if !self.is_handshaken(client_id).await {
            return Err(create_error(
                seq,
                ErrorCode::HandshakeRequired,
                &format!("Send hello before {what}"),
            ));
        }
        if !self.check_and_update_seq(client_id, seq).await {
            return Err(create_error(
                seq,
                ErrorCode::InvalidCommand,
                "seq must be strictly increasing",
            ));
        }
        if !self.is_controller(client_id).await {
            return Err(create_error(
                seq,
                ErrorCode::NotController,
                &format!("Only controller may send {what}"),
            ));
        }
        Ok(())
    }

    async fn broadcast(&self, msg: ClientOutbound) {
        let clients = self.clients.read().await;
        for c in clients.iter().filter(|c| c.stream_events) {
            let _ = c.tx.send(msg.clone());
        }
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: u64,
    stream_events: bool,
    handshaken: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum ClientOutbound {
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Event(EventMessage),
    Observation(Box<ObservationMessage>),
}

/// Start the TCP server
///
/// Runs until the listener fails. `ready_tx` receives the bound address, which
/// is how callers learn the port when binding to port 0.
pub async fn run_server(
    config: ServerConfig,
    handle: GameHandle,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let bound = listener.local_addr()?;
    info!(%bound, clear_gate = ?config.clear_gate, "adapter listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState {
        config,
        handle,
        clients: RwLock::new(Vec::new()),
        controller: RwLock::new(None),
        out_seq: AtomicU64::new(0),
    });

    tokio::spawn(dispatch_events(Arc::clone(&state)));

    let mut client_id_counter = 0u64;

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!(client_id, %addr, "client connected");

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, state).await {
                warn!(client_id, error = %e, "client error");
            }
            info!(client_id, "client disconnected");
        });
    }
}

/// Fan core events out to streaming clients
///
/// Every event is forwarded as an `event` message. Events that end a step of
/// the game are followed by a fresh observation.
async fn dispatch_events(state: Arc<ServerState>) {
    let mut rx = state.handle.subscribe();
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event dispatcher lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let msg = create_event(state.next_seq(), &event);
        state.broadcast(ClientOutbound::Event(msg)).await;

        if wants_observation(&event) {
            match state.handle.snapshot().await {
                Ok(snapshot) => {
                    let obs = build_observation(&snapshot, state.next_seq());
                    state
                        .broadcast(ClientOutbound::Observation(Box::new(obs)))
                        .await;
                }
                Err(e) => debug!(error = %e, "no snapshot for observation"),
            }
        }
    }
    debug!("event dispatcher stopped");
}

fn wants_observation(event: &GameEvent) -> bool {
    matches!(
        event,
        GameEvent::Tick { .. }
            | GameEvent::ClearCommitted { .. }
            | GameEvent::GameStarted
            | GameEvent::GameOver
            | GameEvent::Paused
            | GameEvent::Resumed
    )
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: u64,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    // Channel to send messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            stream_events: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    // Spawn task to write messages to client
    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if let Err(e) = serde_json::to_writer(&mut buf, &msg) {
                warn!(client_id, error = %e, "failed to encode message");
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() || writer.flush().await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            // Client disconnected
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                // Cleanup below must still run.
                warn!(client_id, error = %e, "read failed");
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    let error = create_error(
                        hello.seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                if major_version(&hello.protocol_version)
                    != major_version(&state.config.protocol_version)
                {
                    let error = create_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    break;
                }

                // First client to hello becomes controller
                let (role, controller_id) = {
                    let mut controller = state.controller.write().await;
                    if controller.is_none() {
                        *controller = Some(client_id);
                        info!(client_id, %addr, client = %hello.client.name, "client is now controller");
                    }
                    let role = if *controller == Some(client_id) {
                        AssignedRole::Controller
                    } else {
                        AssignedRole::Observer
                    };
                    (role, *controller)
                };

                {
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_events = hello.stream_events;
                    }
                }

                let welcome = create_welcome(
                    hello.seq,
                    client_id,
                    role,
                    controller_id,
                    state.config.clear_gate,
                );
                let _ = tx.send(ClientOutbound::Welcome(welcome));

                if hello.stream_events {
                    match state.handle.snapshot().await {
                        Ok(snapshot) => {
                            let obs = build_observation(&snapshot, state.next_seq());
                            let _ = tx.send(ClientOutbound::Observation(Box::new(obs)));
                        }
                        Err(e) => debug!(client_id, error = %e, "no initial observation"),
                    }
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if let Err(error) = state.authorize(client_id, cmd.seq, "command").await {
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                if cmd.actions.0.is_empty() {
                    let error = create_error(cmd.seq, ErrorCode::InvalidCommand, "Missing actions");
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                // Actions run in order; the first failure stops the batch.
                let mut failure = None;
                for &action in cmd.actions.0.iter() {
                    if let Err(e) = state.handle.try_apply(action).await {
                        debug!(client_id, action = action.as_str(), error = %e, "command failed");
                        failure = Some(engine_error(cmd.seq, action.as_str(), e));
                        break;
                    }
                }
                match failure {
                    Some(error) => {
                        let _ = tx.send(ClientOutbound::Error(error));
                    }
                    None => {
                        let _ = tx.send(ClientOutbound::Ack(create_ack(cmd.seq)));
                    }
                }
            }

            Ok(ParsedMessage::Continue(cont)) => {
                if let Err(error) = state.authorize(client_id, cont.seq, "continue").await {
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                match state
                    .handle
                    .continue_clear(ClearToken::from_raw(cont.token))
                    .await
                {
                    Ok(lines) => {
                        debug!(client_id, token = cont.token, lines, "clear committed by client");
                        let _ = tx.send(ClientOutbound::Ack(create_ack(cont.seq)));
                    }
                    Err(e) => {
                        let error = engine_error(cont.seq, "continue", e);
                        let _ = tx.send(ClientOutbound::Error(error));
                    }
                }
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                let seq = unknown.seq;
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, seq).await
                {
                    let error = create_error(
                        seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }
                let error = create_error(seq, ErrorCode::InvalidCommand, "Unknown message type");
                let _ = tx.send(ClientOutbound::Error(error));
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                let error = create_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
                let _ = tx.send(ClientOutbound::Error(error));
            }
        }
    }

    // Clean up: remove client and promote a new controller if needed.
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;

        clients.retain(|c| c.id != client_id);

        if *controller == Some(client_id) {
            // Promote the next handshaken client (lowest id) to controller.
            let next_id = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
            *controller = next_id;
            match next_id {
                Some(new_id) => info!(client_id = new_id, "controller promoted"),
                None => info!(client_id, "controller released"),
            }
        }
    }

    drop(tx);
    let _ = write_task.await;

    Ok(())
}

fn major_version(version: &str) -> &str {
    version.split('.').next().unwrap_or_default()
}

fn engine_error(seq: u64, what: &str, err: EngineError) -> ErrorMessage {
    match err {
        EngineError::Backpressure => {
            create_error(seq, ErrorCode::Backpressure, "Command queue is full")
        }
        EngineError::Game(e) => create_error(seq, ErrorCode::Rejected, &format!("{what}: {e}")),
        EngineError::Closed => create_error(seq, ErrorCode::Rejected, "Game has stopped"),
    }
}

/// Build an observation message from a game snapshot
pub fn build_observation(snapshot: &GameSnapshot, seq: u64) -> ObservationMessage {
    use std::hash::{Hash, Hasher};

    let mut hasher = Fnv1aHasher::new();
    snapshot.hash(&mut hasher);
    let state_hash = StateHash(hasher.finish());

    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        phase: snapshot.phase.as_str().to_string(),
        playable: snapshot.playable(),
        paused: snapshot.phase == crate::core::Phase::Paused,
        game_over: snapshot.phase == crate::core::Phase::GameOver,
        episode_id: snapshot.episode_id,
        seed: snapshot.seed,
        frame_count: snapshot.frame_count,
        board: BoardSnapshot {
            width: COLS,
            height: LOGICAL_ROWS,
            depth: COLS,
            cells: snapshot.board,
        },
        current: snapshot.current.as_ref().map(BlockView::from),
        next: snapshot.next.as_ref().map(BlockView::from),
        score: snapshot.score,
        level: snapshot.level,
        lines: snapshot.lines,
        tick_interval_ms: snapshot.tick_interval_ms,
        clear_token: snapshot.clear_pending.map(|t| t.id()),
        state_hash,
    }
}
