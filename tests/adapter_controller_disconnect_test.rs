use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use tetricus::adapter::protocol::create_hello;
use tetricus::adapter::server::{run_server, ServerConfig};
use tetricus::engine::{spawn, LoopConfig};

async fn read_line(
    lines: &mut tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
) -> String {
    tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timeout waiting for line")
        .expect("io error")
        .expect("expected line")
}

#[tokio::test]
async fn controller_disconnect_promotes_waiting_observer() {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    };

    let (handle, _game) = spawn(LoopConfig::default());
    let (ready_tx, ready_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        let _ = run_server(config, handle, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();

    // Client 1 becomes controller on hello.
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let hello = create_hello(1, "ctrl1", false);
    write_half
        .write_all(serde_json::to_string(&hello).unwrap().as_bytes())
        .await
        .unwrap();
    write_half.write_all(b"\n").await.unwrap();
    write_half.flush().await.unwrap();

    let welcome: serde_json::Value = serde_json::from_str(&read_line(&mut lines).await).unwrap();
    assert_eq!(welcome["role"], "controller");

    // Client 2 waits as observer.
    let stream2 = TcpStream::connect(addr).await.unwrap();
    let (read_half2, mut write_half2) = stream2.into_split();
    let mut lines2 = BufReader::new(read_half2).lines();

    let hello = create_hello(1, "ctrl2", false);
    write_half2
        .write_all(serde_json::to_string(&hello).unwrap().as_bytes())
        .await
        .unwrap();
    write_half2.write_all(b"\n").await.unwrap();
    write_half2.flush().await.unwrap();

    let welcome: serde_json::Value = serde_json::from_str(&read_line(&mut lines2).await).unwrap();
    assert_eq!(welcome["role"], "observer");

    // Send an invalid UTF-8 line to force a server-side read error in the line reader.
    // This exercises the disconnect/cleanup path even when the socket ends with an I/O error
    // (not just a clean EOF).
    write_half.write_all(&[0xFF, b'\n']).await.unwrap();
    let _ = write_half.flush().await;
    drop(lines);
    drop(write_half);

    // Give the server a moment to observe the disconnect and run cleanup.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let cmd = serde_json::json!({
        "type": "command",
        "seq": 2,
        "ts": 1,
        "actions": ["moveDown"]
    });
    write_half2
        .write_all(serde_json::to_string(&cmd).unwrap().as_bytes())
        .await
        .unwrap();
    write_half2.write_all(b"\n").await.unwrap();
    write_half2.flush().await.unwrap();

    let resp: serde_json::Value = serde_json::from_str(&read_line(&mut lines2).await).unwrap();
    assert_eq!(resp["type"], "ack", "expected ack, got {resp}");
    assert_eq!(resp["seq"], 2);

    server_handle.abort();
}
