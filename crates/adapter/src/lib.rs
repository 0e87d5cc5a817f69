//! Adapter - remote control via TCP socket with JSON protocol
//!
//! This crate lets external agents drive a running game over a TCP socket.
//! It owns no game state: every message is turned into a call on the engine's
//! [`GameHandle`](tetricus_engine::GameHandle), and every core event is
//! fanned out to clients that asked for a stream.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7777)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//! 4. **Streaming**: Clients with `stream_events` receive every core event and
//!    an observation after each tick, clear and phase change
//! 5. **Commanding**: Controller sends `command` and `continue`
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Handshake with client info and stream preference
//! - **command**: Up to 32 game actions, applied in order
//! - **continue**: Return a clear token to commit a pending line clear
//!
//! ## Server → Client
//!
//! - **welcome**: Assigned role and server capabilities
//! - **event**: One core event (`block-moved`, `clear-pending`, ...)
//! - **observation**: Full game state snapshot with a stable `state_hash`
//! - **ack**: Command acknowledgment
//! - **error**: Error response with code and message
//!
//! # Environment Variables
//!
//! - `TETRICUS_HOST`: Bind address (default: "127.0.0.1")
//! - `TETRICUS_PORT`: Port number (default: 7777)
//! - `TETRICUS_ADAPTER_DISABLED`: Set to "1" or "true" to run headless
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":1234567890,"client":{"name":"my-ai","version":"1.0.0"},"protocol_version":"1.0.0","stream_events":true}
//! Server -> Client: {"type":"welcome","seq":1,"ts":1234567891,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":1234567892,"phase":"playing",...}
//! Client -> Server: {"type":"command","seq":2,"ts":1234567900,"actions":["moveLeft","rotateXz","drop"]}
//! Server -> Client: {"type":"ack","seq":2,"ts":1234567901,"status":"ok"}
//! Server -> Client: {"type":"event","seq":2,"ts":1234568900,"event":{"kind":"clear-pending","token":1,...}}
//! Client -> Server: {"type":"continue","seq":3,"ts":1234568950,"token":1}
//! ```

pub mod protocol;
pub mod server;

pub use tetricus_core as core;
pub use tetricus_types as types;

pub use protocol::{parse_message, ParsedMessage, PROTOCOL_VERSION};
pub use server::{build_observation, run_server, ServerConfig};
