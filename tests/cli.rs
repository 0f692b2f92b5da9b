//! End-to-end runs of the built binary against stub WebSocket servers.

use std::future::Future;
use std::process::Output;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

const BIN: &str = env!("CARGO_BIN_EXE_command-client");

/// Accept a single connection and hand the upgraded stream to `handler`.
async fn spawn_server<F, Fut>(handler: F) -> u16
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        handler(ws).await;
    });
    port
}

/// Echo server: returns the first text frame verbatim and reports it.
async fn echo_server() -> (u16, oneshot::Receiver<String>) {
    let (tx, rx) = oneshot::channel();
    let port = spawn_server(move |mut ws| async move {
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let _ = tx.send(text.as_str().to_owned());
                let _ = ws.send(Message::Text(text)).await;
                break;
            }
        }
        // Drain until the client closes.
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;
    (port, rx)
}

async fn run(args: &[&str]) -> Output {
    tokio::process::Command::new(BIN)
        .args(args)
        .env_remove("COMMAND_CLIENT_URL")
        .env_remove("RUST_LOG")
        .output()
        .await
        .unwrap()
}

fn stdout_json(out: &Output) -> Value {
    serde_json::from_slice(&out.stdout).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn every_command_round_trips_through_echo() {
    let cases: [(&[&str], Value); 3] = [
        (
            &["--command", "open-project", "--id", "test1234", "--name", "Place1"],
            json!({"type": "cli", "command": "open-project", "id": "test1234", "args": {"name": "Place1"}}),
        ),
        (
            &["--command", "close-project", "--id", "test1234"],
            json!({"type": "cli", "command": "close-project", "id": "test1234"}),
        ),
        (
            &["--command", "status"],
            json!({"type": "cli", "command": "status"}),
        ),
    ];

    for (flags, expected) in cases {
        let (port, received) = echo_server().await;
        let port_s = port.to_string();
        let mut argv: Vec<&str> = vec!["--host", "127.0.0.1", "--port", port_s.as_str()];
        argv.extend_from_slice(flags);

        let out = run(&argv).await;
        assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

        let sent = received.await.unwrap();
        assert_eq!(String::from_utf8(out.stdout.clone()).unwrap(), format!("{sent}\n"));
        assert_eq!(stdout_json(&out), expected);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn url_flag_reaches_server() {
    let (port, _received) = echo_server().await;
    let url = format!("ws://127.0.0.1:{port}");
    let out = run(&["--url", &url, "-c", "status"]).await;
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout_json(&out), json!({"type": "cli", "command": "status"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_exits_1_without_output() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port().to_string();
    drop(listener);

    let out = run(&["--host", "127.0.0.1", "--port", &port, "-c", "status"]).await;
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.matches("connection failed").count(), 1, "stderr: {stderr}");
    assert!(!stderr.contains('\x1b'), "piped stderr must be plain: {stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn silent_handshake_times_out_with_exit_3() {
    // Accept TCP but never answer the WebSocket upgrade.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port().to_string();
    tokio::spawn(async move {
        let (_sock, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let started = Instant::now();
    let out = run(&[
        "--host", "127.0.0.1", "--port", &port, "-c", "status", "--timeout", "1",
    ])
    .await;
    assert_eq!(out.status.code(), Some(3));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no response within 1s"));
    assert!(started.elapsed() < Duration::from_secs(8));
}

#[tokio::test(flavor = "multi_thread")]
async fn silent_server_times_out_with_exit_3() {
    let port = spawn_server(|mut ws| async move {
        // Read but never answer; hold the socket until the client leaves.
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await
    .to_string();

    let started = Instant::now();
    let out = run(&[
        "--host", "127.0.0.1", "--port", &port, "-c", "status", "--timeout", "1",
    ])
    .await;
    assert_eq!(out.status.code(), Some(3));
    assert!(out.stdout.is_empty());
    assert!(started.elapsed() < Duration::from_secs(8));
}

#[tokio::test(flavor = "multi_thread")]
async fn server_close_without_reply_exits_3() {
    let port = spawn_server(|mut ws| async move {
        let _ = ws.next().await;
        let _ = ws.close(None).await;
    })
    .await
    .to_string();

    let out = run(&["--host", "127.0.0.1", "--port", &port, "-c", "status"]).await;
    assert_eq!(out.status.code(), Some(3));
    assert!(out.stdout.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn non_utf8_binary_reply_exits_4() {
    let port = spawn_server(|mut ws| async move {
        let _ = ws.next().await;
        let _ = ws.send(Message::binary(vec![0xff, 0xfe, 0xfd])).await;
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await
    .to_string();

    let out = run(&["--host", "127.0.0.1", "--port", &port, "-c", "status"]).await;
    assert_eq!(out.status.code(), Some(4));
    assert!(out.stdout.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn open_project_without_name_exits_2_before_connecting() {
    // Nothing listens on port 1; a serialization failure must win.
    let out = run(&["--host", "127.0.0.1", "--port", "1", "-c", "open-project"]).await;
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("requires argument 'name'"));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_json_arg_exits_2() {
    let out = run(&["-c", "open-project", "--name", "P", "--arg-json", "depth={"]).await;
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn dry_run_prints_envelope_without_connecting() {
    let out = run(&[
        "--host", "127.0.0.1", "--port", "1", "-c", "open-project", "--id", "test1234",
        "--name", "Place1", "--arg-json", "readonly=true", "--dry-run",
    ])
    .await;
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        stdout_json(&out),
        json!({"type": "cli", "command": "open-project", "id": "test1234",
               "args": {"name": "Place1", "readonly": true}})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_url_scheme_exits_1() {
    let out = run(&["--url", "http://127.0.0.1:5000", "-c", "status"]).await;
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}
