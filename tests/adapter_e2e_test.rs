use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use tetricus::adapter::protocol::{create_hello, ClearGateName};
use tetricus::adapter::server::{run_server, ServerConfig};
use tetricus::core::{Catalog, GameState, STANDARD_TEMPLATES};
use tetricus::engine::{spawn, spawn_with_state, ClearGate, GameHandle, LoopConfig};
use tetricus::types::{COLS, LOGICAL_ROWS};

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    write_half: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read_half, write_half) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            write_half,
        }
    }

    async fn send(&mut self, msg: &Value) {
        let line = serde_json::to_string(msg).unwrap();
        self.write_half.write_all(line.as_bytes()).await.unwrap();
        self.write_half.write_all(b"\n").await.unwrap();
        self.write_half.flush().await.unwrap();
    }

    async fn hello(&mut self, name: &str, stream_events: bool) -> Value {
        let hello = serde_json::to_value(create_hello(1, name, stream_events)).unwrap();
        self.send(&hello).await;
        self.read_until(|v| v["type"] == "welcome").await
    }

    async fn read(&mut self) -> Option<Value> {
        tokio::time::timeout(Duration::from_secs(3), self.lines.next_line())
            .await
            .expect("timeout waiting for line")
            .expect("io error")
            .map(|line| serde_json::from_str(&line).expect("server sent invalid json"))
    }

    /// Read until an `ack` and a message matching `pred` both arrived, in any order
    async fn read_ack_and(&mut self, pred: impl Fn(&Value) -> bool) -> (Value, Value) {
        let (mut ack, mut other) = (None, None);
        while ack.is_none() || other.is_none() {
            let v = self.read().await.expect("connection closed");
            if v["type"] == "ack" {
                ack = Some(v);
            } else if pred(&v) {
                other = Some(v);
            }
        }
        (ack.unwrap(), other.unwrap())
    }

    /// Skip streamed messages until one matches
    async fn read_until(&mut self, pred: impl Fn(&Value) -> bool) -> Value {
        loop {
            let v = self.read().await.expect("connection closed");
            if pred(&v) {
                return v;
            }
        }
    }
}

async fn start(handle: GameHandle, clear_gate: ClearGateName) -> (SocketAddr, JoinHandle<()>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        clear_gate,
        ..ServerConfig::default()
    };
    let (ready_tx, ready_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        let _ = run_server(config, handle, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");
    (addr, server_handle)
}

#[tokio::test]
async fn adapter_hello_command_ack_and_observation() {
    let (handle, _game) = spawn(LoopConfig::default());
    let (addr, server_handle) = start(handle, ClearGateName::Auto).await;

    let mut client = Client::connect(addr).await;
    let welcome = client.hello("e2e-test", true).await;
    assert_eq!(welcome["seq"], 1);
    assert_eq!(welcome["role"], "controller");
    assert_eq!(welcome["controller_id"], welcome["client_id"]);
    assert_eq!(welcome["game_id"], "tetricus");
    assert_eq!(welcome["capabilities"]["clear_gate"], "auto");

    let obs = client.read_until(|v| v["type"] == "observation").await;
    assert_eq!(obs["phase"], "playing");
    assert_eq!(obs["playable"], true);
    assert_eq!(obs["board"]["width"], COLS);
    assert_eq!(obs["board"]["height"], LOGICAL_ROWS);
    assert_eq!(obs["state_hash"].as_str().unwrap().len(), 16);
    let x0 = obs["current"]["x"].as_i64().unwrap();

    client
        .send(&json!({"type": "command", "seq": 2, "ts": 1, "actions": ["moveRight"]}))
        .await;
    // Gravity may move the block too; look for the sideways move.
    let (ack, moved) = client
        .read_ack_and(|v| {
            v["type"] == "event"
                && v["event"]["kind"] == "block-moved"
                && v["event"]["block"]["x"] != x0
        })
        .await;
    assert_eq!(moved["event"]["block"]["x"].as_i64().unwrap(), x0 + 1);
    assert_eq!(ack["seq"], 2);
    assert_eq!(ack["status"], "ok");

    server_handle.abort();
}

#[tokio::test]
async fn adapter_rejects_bad_commands() {
    let (handle, _game) = spawn(LoopConfig::default());
    let (addr, server_handle) = start(handle, ClearGateName::Auto).await;

    let mut client = Client::connect(addr).await;

    // Command before hello.
    client
        .send(&json!({"type": "command", "seq": 1, "ts": 1, "actions": ["drop"]}))
        .await;
    let err = client.read().await.unwrap();
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "handshake_required");

    client.hello("e2e-test", false).await;

    client
        .send(&json!({"type": "command", "seq": 2, "ts": 1, "actions": ["hold"]}))
        .await;
    let err = client.read().await.unwrap();
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 2);

    // Replayed seq.
    client
        .send(&json!({"type": "command", "seq": 1, "ts": 1, "actions": ["drop"]}))
        .await;
    let err = client.read().await.unwrap();
    assert_eq!(err["code"], "invalid_command");

    // Input while paused is rejected; the batch stops at the first failure.
    client
        .send(&json!({"type": "command", "seq": 3, "ts": 1, "actions": ["pause", "moveLeft"]}))
        .await;
    let err = client.read().await.unwrap();
    assert_eq!(err["code"], "rejected");
    assert!(err["message"].as_str().unwrap().starts_with("moveLeft"));

    client
        .send(&json!({"type": "continue", "seq": 4, "ts": 1, "token": 99}))
        .await;
    let err = client.read().await.unwrap();
    assert_eq!(err["code"], "rejected");

    client
        .send(&json!({"type": "control", "seq": 5, "ts": 1, "action": "claim"}))
        .await;
    let err = client.read().await.unwrap();
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 5);

    server_handle.abort();
}

#[tokio::test]
async fn adapter_protocol_mismatch_closes_connection() {
    let (handle, _game) = spawn(LoopConfig::default());
    let (addr, server_handle) = start(handle, ClearGateName::Auto).await;

    let mut client = Client::connect(addr).await;
    let mut hello = serde_json::to_value(create_hello(1, "old", false)).unwrap();
    hello["protocol_version"] = json!("0.9.0");
    client.send(&hello).await;

    let err = client.read().await.unwrap();
    assert_eq!(err["code"], "protocol_mismatch");
    assert!(client.read().await.is_none());

    server_handle.abort();
}

#[tokio::test]
async fn adapter_observer_cannot_command() {
    let (handle, _game) = spawn(LoopConfig::default());
    let (addr, server_handle) = start(handle, ClearGateName::Auto).await;

    let mut controller = Client::connect(addr).await;
    let welcome = controller.hello("ctrl", false).await;
    assert_eq!(welcome["role"], "controller");

    let mut observer = Client::connect(addr).await;
    let welcome = observer.hello("watch", false).await;
    assert_eq!(welcome["role"], "observer");
    assert_ne!(welcome["client_id"], welcome["controller_id"]);

    observer
        .send(&json!({"type": "command", "seq": 2, "ts": 1, "actions": ["drop"]}))
        .await;
    let err = observer.read().await.unwrap();
    assert_eq!(err["code"], "not_controller");

    server_handle.abort();
}

#[tokio::test]
async fn adapter_external_clear_gate_waits_for_continue() {
    let mut state = GameState::with_catalog(Catalog::new(vec![STANDARD_TEMPLATES[0]]), 1);
    state.new_game();
    let bar = *state.current().unwrap();
    let floor = LOGICAL_ROWS as i8 - 1;
    for z in 0..COLS as i8 {
        for x in 0..COLS as i8 {
            if !(z == bar.z && (bar.x..bar.x + 4).contains(&x)) {
                state.board_mut().set(x, floor, z, 1);
            }
        }
    }

    let config = LoopConfig {
        clear_gate: ClearGate::External,
        ..LoopConfig::default()
    };
    let (handle, _game) = spawn_with_state(&config, state);
    let (addr, server_handle) = start(handle, config.clear_gate.into()).await;

    let mut client = Client::connect(addr).await;
    let welcome = client.hello("clearer", true).await;
    assert_eq!(welcome["capabilities"]["clear_gate"], "external");

    client
        .send(&json!({"type": "command", "seq": 2, "ts": 1, "actions": ["drop"]}))
        .await;
    client.read_until(|v| v["type"] == "ack").await;

    // The next gravity tick freezes the bar and completes the whole floor.
    let pending = client
        .read_until(|v| v["type"] == "event" && v["event"]["kind"] == "clear-pending")
        .await;
    assert_eq!(pending["event"]["lines"], 2 * COLS as u32);
    let token = pending["event"]["token"].as_u64().unwrap();

    let obs = client.read_until(|v| v["type"] == "observation").await;
    assert_eq!(obs["phase"], "clear_pending");
    assert_eq!(obs["clear_token"], token);

    client
        .send(&json!({"type": "continue", "seq": 3, "ts": 1, "token": token}))
        .await;
    let (ack, committed) = client
        .read_ack_and(|v| v["type"] == "event" && v["event"]["kind"] == "clear-committed")
        .await;
    assert_eq!(ack["seq"], 3);
    assert_eq!(committed["event"]["lines"], 2 * COLS as u32);
    assert_eq!(committed["event"]["level"], 2);

    // The token is spent.
    client
        .send(&json!({"type": "continue", "seq": 4, "ts": 1, "token": token}))
        .await;
    let err = client.read_until(|v| v["type"] == "error").await;
    assert_eq!(err["code"], "rejected");

    server_handle.abort();
}
