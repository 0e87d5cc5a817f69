//! Protocol module - JSON message types for the TCP adapter
//!
//! Line-delimited JSON. All messages have: type, seq (sequence number), ts (timestamp in ms)

use serde::{Deserialize, Serialize};

use crate::core::{BlockInstance, BoardGrid, FilledRows, GameEvent};
use crate::types::GameAction;

use arrayvec::ArrayVec;

/// Protocol version spoken by this server
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Most actions accepted in one command
pub const MAX_ACTIONS: usize = 32;

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandType {
    #[serde(rename = "command")]
    #[default]
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContinueType {
    #[serde(rename = "continue")]
    #[default]
    Continue,
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    /// Receive events and observations as they happen
    #[serde(default)]
    pub stream_events: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Command message (controller only)
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub actions: ActionList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionList(pub ArrayVec<GameAction, MAX_ACTIONS>);

impl<'de> Deserialize<'de> for ActionList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = ActionList;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of action strings")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = ArrayVec::<GameAction, MAX_ACTIONS>::new();
                while let Some(name) = seq.next_element::<String>()? {
                    let action = GameAction::from_str(&name).ok_or_else(|| {
                        serde::de::Error::custom(format!("unknown action: {name}"))
                    })?;
                    out.try_push(action)
                        .map_err(|_| serde::de::Error::custom("too many actions"))?;
                }
                Ok(ActionList(out))
            }
        }

        deserializer.deserialize_seq(V)
    }
}

/// Commit a pending line clear (controller only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinueMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: ContinueType,
    pub seq: u64,
    pub ts: u64,
    pub token: u64,
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "event")]
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "backpressure")]
    Backpressure,
    /// The game refused the command in its current phase
    #[serde(rename = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClearGateName {
    /// The server commits clears on its own
    #[serde(rename = "auto")]
    Auto,
    /// The controller must send `continue`
    #[serde(rename = "external")]
    External,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub formats: Vec<String>,
    /// Every action name a command may carry
    pub actions: Vec<String>,
    pub clear_gate: ClearGateName,
}

/// Acknowledgment for an applied command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// One core event (sent to streaming clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub msg_type: EventType,
    pub seq: u64,
    pub ts: u64,
    pub event: WireEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WireEvent {
    GameStarted,
    GameOver,
    GameQuit,
    Paused,
    Resumed,
    BlockSpawned { block: BlockView },
    NextBlockReady { block: BlockView },
    BlockMoved { block: BlockView },
    Tick { froze: bool },
    Frozen { block: BlockView },
    ClearPending {
        token: u64,
        lines: u32,
        levels: Vec<LevelView>,
    },
    ClearCommitted {
        lines: u32,
        points: u32,
        score: u32,
        level: u32,
    },
}

impl From<&GameEvent> for WireEvent {
    fn from(event: &GameEvent) -> Self {
        match event {
            GameEvent::GameStarted => WireEvent::GameStarted,
            GameEvent::GameOver => WireEvent::GameOver,
            GameEvent::GameQuit => WireEvent::GameQuit,
            GameEvent::Paused => WireEvent::Paused,
            GameEvent::Resumed => WireEvent::Resumed,
            GameEvent::BlockSpawned(b) => WireEvent::BlockSpawned { block: b.into() },
            GameEvent::NextBlockReady(b) => WireEvent::NextBlockReady { block: b.into() },
            GameEvent::BlockMoved(b) => WireEvent::BlockMoved { block: b.into() },
            GameEvent::Tick { froze } => WireEvent::Tick { froze: *froze },
            GameEvent::Frozen(b) => WireEvent::Frozen { block: b.into() },
            GameEvent::ClearPending { rows, token } => WireEvent::ClearPending {
                token: token.id(),
                lines: rows.line_count(),
                levels: LevelView::from_rows(rows),
            },
            GameEvent::ClearCommitted {
                lines,
                points,
                score,
                level,
            } => WireEvent::ClearCommitted {
                lines: *lines,
                points: *points,
                score: *score,
                level: *level,
            },
        }
    }
}

/// A block as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    pub id: u8,
    pub color: u32,
    pub x: i8,
    pub y: i8,
    pub z: i8,
    /// Cube-local `[x, y, z]` of every set voxel
    pub voxels: Vec<[i8; 3]>,
}

impl From<&BlockInstance> for BlockView {
    fn from(block: &BlockInstance) -> Self {
        Self {
            id: block.id,
            color: block.color,
            x: block.x,
            y: block.y,
            z: block.z,
            voxels: block.voxels().map(|(x, y, z)| [x, y, z]).collect(),
        }
    }
}

/// Completed rows at one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelView {
    pub y: u8,
    pub z_rows: Vec<u8>,
    pub x_rows: Vec<u8>,
}

impl LevelView {
    pub fn from_rows(rows: &FilledRows) -> Vec<Self> {
        rows.levels()
            .iter()
            .map(|level| Self {
                y: level.y,
                z_rows: level.z_rows.to_vec(),
                x_rows: level.x_rows.to_vec(),
            })
            .collect()
    }
}

/// Game state observation (sent to streaming clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub phase: String,
    pub playable: bool,
    pub paused: bool,
    pub game_over: bool,
    pub episode_id: u32,
    pub seed: u32,
    pub frame_count: u32,
    pub board: BoardSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<BlockView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<BlockView>,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub tick_interval_ms: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_token: Option<u64>,
    pub state_hash: StateHash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub width: u8,
    pub height: u8,
    pub depth: u8,
    /// `[z][y][x]`, 0 = empty, n = catalog id + 1
    pub cells: BoardGrid,
}

/// Deterministic state hash serialized as lowercase hex (without heap allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut buf = [0u8; 16];
        let mut v = self.0;
        for slot in buf.iter_mut().rev() {
            *slot = HEX[(v & 0x0f) as usize];
            v >>= 4;
        }
        match std::str::from_utf8(&buf) {
            Ok(s) => serializer.serialize_str(s),
            Err(e) => Err(serde::ser::Error::custom(e)),
        }
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        let s = s.trim();
        let mut v: u64 = 0;
        for b in s.as_bytes() {
            let d = match b {
                b'0'..=b'9' => (b - b'0') as u64,
                b'a'..=b'f' => (b - b'a' + 10) as u64,
                b'A'..=b'F' => (b - b'A' + 10) as u64,
                _ => return Err(serde::de::Error::custom("invalid hex")),
            };
            v = (v << 4) | d;
        }
        Ok(StateHash(v))
    }
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
        #[serde(rename = "continue")]
        Continue(ContinueMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Ok(InboundMessage::Continue(m)) => Ok(ParsedMessage::Continue(m)),
        Err(e) => {
            // Unknown message type is not a hard parse error for the protocol.
            #[derive(Debug, Deserialize)]
            struct TypeOnly<'a> {
                #[serde(rename = "type")]
                msg_type: Option<&'a str>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?
                .msg_type
                .unwrap_or("unknown");
            if !matches!(msg_type, "hello" | "command" | "continue") {
                #[derive(Debug, Deserialize)]
                struct SeqOnly {
                    seq: Option<u64>,
                }
                let seq = serde_json::from_str::<SeqOnly>(json)?.seq.unwrap_or(0);
                return Ok(ParsedMessage::Unknown(UnknownMessage { seq }));
            }
            Err(e)
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Continue(ContinueMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, stream_events: bool) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: PROTOCOL_VERSION.to_string(),
        stream_events,
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
    clear_gate: ClearGateName,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        client_id,
        role,
        controller_id,
        game_id: "tetricus".to_string(),
        capabilities: ServerCapabilities {
            formats: vec!["json".to_string()],
            actions: GameAction::ALL
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            clear_gate,
        },
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Create an event message
pub fn create_event(seq: u64, event: &GameEvent) -> EventMessage {
    EventMessage {
        msg_type: EventType::Event,
        seq,
        ts: current_timestamp_ms(),
        event: event.into(),
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Catalog, ClearToken, GameState};

    #[test]
    fn test_parse_hello() {
        let json = r#"{"type":"hello","seq":1,"ts":1234567890,"client":{"name":"test-bot","version":"1.0.0"},"protocol_version":"1.0.0","stream_events":true}"#;

        let result = parse_message(json).unwrap();
        match result {
            ParsedMessage::Hello(msg) => {
                assert_eq!(msg.msg_type, HelloType::Hello);
                assert_eq!(msg.seq, 1);
                assert_eq!(msg.client.name, "test-bot");
                assert_eq!(msg.protocol_version, "1.0.0");
                assert!(msg.stream_events);
            }
            _ => panic!("Expected Hello message"),
        }
    }

    #[test]
    fn test_parse_command_actions() {
        let json = r#"{"type":"command","seq":2,"ts":1234567900,"actions":["moveLeft","rotateZyReverse","drop"]}"#;

        let result = parse_message(json).unwrap();
        match result {
            ParsedMessage::Command(msg) => {
                assert_eq!(
                    msg.actions.0.as_slice(),
                    &[
                        GameAction::MoveLeft,
                        GameAction::RotateZyReverse,
                        GameAction::Drop
                    ]
                );
            }
            _ => panic!("Expected Command message"),
        }
    }

    #[test]
    fn test_parse_command_with_escaped_action_name() {
        // \u0044 is 'D'; escapes force an owned string out of the parser.
        let json = r#"{"type":"command","seq":3,"ts":0,"actions":["move\u0044own","\u0064rop"]}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Command(msg) => assert_eq!(
                msg.actions.0.as_slice(),
                &[GameAction::MoveDown, GameAction::Drop]
            ),
            _ => panic!("Expected Command message"),
        }
    }

    #[test]
    fn test_parse_command_unknown_action_fails() {
        let json = r#"{"type":"command","seq":2,"ts":0,"actions":["hold"]}"#;
        let err = parse_message(json).unwrap_err();
        assert!(err.to_string().contains("unknown action: hold"));
    }

    #[test]
    fn test_parse_continue() {
        let json = r#"{"type":"continue","seq":4,"ts":0,"token":9}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Continue(msg) => assert_eq!(msg.token, 9),
            _ => panic!("Expected Continue message"),
        }
    }

    #[test]
    fn test_parse_unknown_type_keeps_seq() {
        let json = r#"{"type":"control","seq":12,"ts":0,"action":"claim"}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Unknown(msg) => assert_eq!(msg.seq, 12),
            _ => panic!("Expected Unknown message"),
        }
    }

    #[test]
    fn test_create_welcome() {
        let welcome = create_welcome(1, 7, AssignedRole::Controller, Some(7), ClearGateName::Auto);
        assert_eq!(welcome.msg_type, WelcomeType::Welcome);
        assert_eq!(welcome.protocol_version, PROTOCOL_VERSION);
        assert_eq!(welcome.role, AssignedRole::Controller);
        assert_eq!(welcome.game_id, "tetricus");
        assert_eq!(welcome.capabilities.actions.len(), GameAction::ALL.len());

        let json = serde_json::to_value(&welcome).unwrap();
        assert_eq!(json["capabilities"]["clear_gate"], "auto");
    }

    #[test]
    fn test_wire_event_kinds_match_core_names() {
        let block = Catalog::standard().instance(1).unwrap();
        let events = [
            GameEvent::GameStarted,
            GameEvent::BlockSpawned(block),
            GameEvent::Tick { froze: true },
            GameEvent::ClearPending {
                rows: Default::default(),
                token: ClearToken::from_raw(3),
            },
        ];
        for event in &events {
            let json = serde_json::to_value(WireEvent::from(event)).unwrap();
            assert_eq!(json["kind"], event.name());
        }
    }

    #[test]
    fn test_block_view_lists_voxels() {
        let mut game = GameState::new(5);
        game.new_game();
        let current = *game.current().unwrap();
        let view = BlockView::from(&current);
        assert_eq!(view.voxels.len(), current.voxel_count());
        assert_eq!((view.x, view.y, view.z), (current.x, current.y, current.z));
    }

    #[test]
    fn test_state_hash_hex() {
        let json = serde_json::to_string(&StateHash(0xab)).unwrap();
        assert_eq!(json, "\"00000000000000ab\"");
        let back: StateHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StateHash(0xab));
    }
}
