//! Integration tests for CLI commands.

use serde_json::{json, Value};
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn three_events() -> Value {
    json!([
        {"entity_id": "e1", "event_type": "create", "timestamp": 1700000000, "details": {"amount": 1}},
        {"entity_id": "e2", "event_type": "update", "timestamp": 1700000001, "details": {"amount": 2}},
        {"entity_id": "e3", "event_type": "delete", "timestamp": 1700000002, "details": {}}
    ])
}

fn write_input(dir: &TempDir, name: &str, value: &Value) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
    path.to_string_lossy().to_string()
}

fn run_cli(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_tessera"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    (output.status.success(), stdout, stderr)
}

fn run_cli_stdin(args: &[&str], stdin: &str) -> (bool, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tessera"))
        .args(args)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    (
        output.status.success(),
        String::from_utf8(output.stdout).unwrap(),
    )
}

#[test]
fn test_merkle_root_matches_library() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_input(&temp_dir, "events.json", &three_events());

    let (success, stdout, _) = run_cli(&["merkle-root", &path]);
    assert!(success);

    let events = three_events().as_array().cloned().unwrap();
    let expected = tessera_consensus::merkle_root(&events).unwrap();
    assert_eq!(stdout.trim(), expected.as_str());
}

#[test]
fn test_merkle_root_of_empty_array() {
    let (success, stdout) = run_cli_stdin(&["merkle-root"], "[]");
    assert!(success);
    assert_eq!(
        stdout.trim(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_merkle_root_rejects_non_array() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_input(&temp_dir, "object.json", &json!({"a": 1}));
    let (success, _, stderr) = run_cli(&["merkle-root", &path]);
    assert!(!success);
    assert!(stderr.contains("Expected a JSON array"));
}

#[test]
fn test_block_hash_accepts_numeric_strings() {
    let temp_dir = TempDir::new().unwrap();
    let header = json!({
        "index": 1,
        "timestamp": 1700000000,
        "previous_hash": "0".repeat(64),
        "merkle_root": "a".repeat(64),
        "nonce": 23
    });
    let stringly = json!({
        "index": "1",
        "timestamp": "1700000000",
        "previous_hash": "0".repeat(64),
        "merkle_root": "A".repeat(64),
        "nonce": "23"
    });
    let a = write_input(&temp_dir, "a.json", &header);
    let b = write_input(&temp_dir, "b.json", &stringly);

    let (ok_a, hash_a, _) = run_cli(&["block-hash", &a]);
    let (ok_b, hash_b, _) = run_cli(&["block-hash", &b]);
    assert!(ok_a && ok_b);
    assert_eq!(hash_a.trim().len(), 64);
    assert_eq!(hash_a, hash_b);
}

#[test]
fn test_block_hash_missing_field_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_input(&temp_dir, "h.json", &json!({"index": 1, "nonce": 2}));
    let (success, _, stderr) = run_cli(&["block-hash", &path]);
    assert!(!success);
    assert!(stderr.starts_with("Error:"));
}

#[test]
fn test_validate_reports_bad_row() {
    let temp_dir = TempDir::new().unwrap();
    let mut records: Vec<Value> = (0..10)
        .map(|i| {
            json!({"entity_id": format!("e{}", i), "event_type": "create", "timestamp": 1700000000 + i})
        })
        .collect();
    records[7].as_object_mut().unwrap().remove("timestamp");
    let path = write_input(&temp_dir, "rows.json", &Value::Array(records));

    let (success, stdout, _) = run_cli(&["validate", &path, "--json"]);
    assert!(success);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["valid"], json!(false));
    assert_eq!(report["total"], json!(10));
    assert_eq!(report["rows"][7]["valid"], json!(false));
    assert_eq!(report["rows"][7]["field"], json!("timestamp"));
    assert_eq!(report["rows"][6]["valid"], json!(true));

    let (strict_success, _, _) = run_cli(&["validate", &path, "--strict"]);
    assert!(!strict_success);
}

#[test]
fn test_validate_all_present() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_input(&temp_dir, "rows.json", &three_events());
    let (success, stdout, _) = run_cli(&["validate", &path, "--strict"]);
    assert!(success);
    assert!(stdout.contains("batch valid"));
}

#[test]
fn test_hashes_one_per_item() {
    let (success, stdout) = run_cli_stdin(&["hashes"], &three_events().to_string());
    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.len() == 64));
    assert_ne!(lines[0], lines[1]);
}

#[test]
fn test_canonicalize_sorts_keys() {
    let (success, stdout) = run_cli_stdin(&["canonicalize"], r#"{"b": 1, "a": [1.0, "x"]}"#);
    assert!(success);
    assert_eq!(stdout.trim(), r#"{"a":[1,"x"],"b":1}"#);
}

#[test]
fn test_submit_to_running_server() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let addr = format!("127.0.0.1:{}", port);

    let mut server = Command::new(env!("CARGO_BIN_EXE_tessera"))
        .args(["serve", "--listen", &addr, "--capacity", "10"])
        .env("RUST_LOG", "warn")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to start server");

    let mut ready = false;
    for _ in 0..100 {
        if TcpStream::connect(&addr).is_ok() {
            ready = true;
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }

    let temp_dir = TempDir::new().unwrap();
    let good = write_input(&temp_dir, "good.json", &three_events());
    let bad = write_input(
        &temp_dir,
        "bad.json",
        &json!([{"entity_id": "e1", "event_type": "create"}]),
    );
    let outcome = ready.then(|| {
        (
            run_cli(&["submit", "--addr", &addr, &good]),
            run_cli(&["submit", "--addr", &addr, &bad]),
        )
    });

    server.kill().ok();
    server.wait().ok();

    let ((ok_success, ok_stdout, _), (bad_success, bad_stdout, _)) =
        outcome.expect("server did not start");
    assert!(ok_success);
    assert_eq!(ok_stdout.trim(), "OK");
    assert!(!bad_success);
    let payload: Value = serde_json::from_str(&bad_stdout).unwrap();
    assert_eq!(payload["error"], json!("validation"));
}
