#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use msgess_frame::{Connection, FrameError, JsonObject};
use msgess_transport::{Stream, UnixDomainSocket};
use serde_json::{json, Value};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/msgess-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn wait_for_connect(path: &Path, timeout: Duration) -> Stream {
    let start = Instant::now();
    loop {
        match UnixDomainSocket::connect(path) {
            Ok(stream) => return stream,
            Err(err) => {
                if start.elapsed() >= timeout {
                    panic!("connect timeout: {err}");
                }
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

fn msgess() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_msgess"));
    cmd.env_remove("MSGESS_NO_COMPRESS")
        .env_remove("MSGESS_MAX_MESSAGE_SIZE")
        .arg("--log-level")
        .arg("error");
    cmd
}

fn spawn_server(subcommand: &str, sock_path: &Path, extra: &[&str]) -> Child {
    msgess()
        .arg(subcommand)
        .arg(sock_path)
        .args(extra)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("server command should start")
}

fn object(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn stop(mut child: Child, dir: &Path) {
    let _ = child.kill();
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn echo_returns_messages_and_honours_close_request() {
    let dir = unique_temp_dir("echo");
    let sock_path = dir.join("echo.sock");
    let child = spawn_server("echo", &sock_path, &[]);

    let mut conn = Connection::new(wait_for_connect(&sock_path, Duration::from_secs(3)));

    conn.send_binary(vec![0x00, 0x01, 0x02], 789)
        .expect("binary should send");
    let (data, class) = conn.receive_binary().expect("binary should be echoed");
    assert_eq!(&data[..], &[0x00, 0x01, 0x02]);
    assert_eq!(class, 789);

    conn.send_text("grüße", 3).expect("text should send");
    assert_eq!(
        conn.receive_text().expect("text should be echoed"),
        ("grüße".to_string(), 3)
    );

    conn.send_json_object(object(json!({"i": 5, "close_connection": true})), 789)
        .expect("object should send");
    let (reply, class) = conn
        .receive_json_object()
        .expect("object should be echoed");
    assert_eq!(class, 789);
    assert_eq!(reply.get("i"), Some(&json!(5)));
    assert_eq!(reply.get("close_connection"), Some(&json!(true)));

    assert!(matches!(conn.receive(), Err(FrameError::ConnectionClosed)));

    stop(child, &dir);
}

#[test]
fn send_wait_prints_echoed_reply_as_json() {
    let dir = unique_temp_dir("send-wait");
    let sock_path = dir.join("echo.sock");
    let child = spawn_server("echo", &sock_path, &[]);
    drop(wait_for_connect(&sock_path, Duration::from_secs(3)));

    let output = msgess()
        .arg("--format")
        .arg("json")
        .arg("send")
        .arg(&sock_path)
        .arg("--class")
        .arg("789")
        .arg("--json")
        .arg(r#"{"i": 5, "close_connection": true}"#)
        .arg("--wait")
        .arg("--wait-timeout")
        .arg("3s")
        .output()
        .expect("send should run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let line: Value = serde_json::from_slice(&output.stdout).expect("reply should be json");
    assert_eq!(line["class"], json!(789));
    assert_eq!(line["kind"], json!("json-object"));
    assert_eq!(line["payload"]["i"], json!(5));

    stop(child, &dir);
}

#[test]
fn listen_prints_filtered_messages_then_exits() {
    let dir = unique_temp_dir("listen");
    let sock_path = dir.join("listen.sock");
    let child = spawn_server(
        "listen",
        &sock_path,
        &["--count", "1", "--class", "7", "--format", "json"],
    );

    drop(wait_for_connect(&sock_path, Duration::from_secs(3)));
    let mut conn = Connection::new(wait_for_connect(&sock_path, Duration::from_secs(3)));
    conn.send_text("filtered out", 1).expect("send should work");
    conn.send_text("hello", 7).expect("send should work");

    let output = child.wait_with_output().expect("listen should exit");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "stdout: {stdout}");
    let line: Value = serde_json::from_str(lines[0]).expect("listen should emit json");
    assert_eq!(line["class"], json!(7));
    assert_eq!(line["kind"], json!("text"));
    assert_eq!(line["payload"], json!("hello"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listen_drops_garbage_client_and_keeps_serving() {
    let dir = unique_temp_dir("listen-garbage");
    let sock_path = dir.join("listen.sock");
    let child = spawn_server("listen", &sock_path, &["--count", "1", "--format", "json"]);

    let mut garbage = wait_for_connect(&sock_path, Duration::from_secs(3));
    garbage
        .write_all(&[0x42; 64])
        .expect("garbage should be writable");

    let mut conn = Connection::new(wait_for_connect(&sock_path, Duration::from_secs(3)));
    conn.send_text("still here", 2).expect("send should work");

    let output = child.wait_with_output().expect("listen should exit");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let line: Value = serde_json::from_slice(&output.stdout).expect("listen should emit json");
    assert_eq!(line["payload"], json!("still here"));
    assert_eq!(line["class"], json!(2));
    drop(garbage);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_to_missing_socket_is_transport_error() {
    let dir = unique_temp_dir("missing");
    let output = msgess()
        .arg("send")
        .arg(dir.join("nobody.sock"))
        .arg("--class")
        .arg("1")
        .arg("--text")
        .arg("hello")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_rejects_scalar_json() {
    let output = msgess()
        .arg("send")
        .arg("/tmp/msgess-unused.sock")
        .arg("--class")
        .arg("1")
        .arg("--json")
        .arg("42")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("array or an object"));
}

#[test]
fn negative_max_message_size_is_usage_error() {
    let output = msgess()
        .arg("send")
        .arg("/tmp/msgess-unused.sock")
        .arg("--class")
        .arg("1")
        .arg("--text")
        .arg("x")
        .arg("--max-message-size")
        .arg("-1")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_package_version() {
    let output = msgess()
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("msgess {}", env!("CARGO_PKG_VERSION"))
    );
}
