//! End-to-end tests for the `mimo` binary

use assert_cmd::Command;
use mimo_protocol::{Request, Response};
use predicates::prelude::*;
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::thread;
use tempfile::TempDir;

/// Serves one connection, echoing method and params back as the result
fn spawn_echo_daemon(dir: &TempDir) -> PathBuf {
    let socket_path = dir.path().join("mimo.sock");
    let listener = UnixListener::bind(&socket_path).unwrap();

    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            let mut writer = stream.try_clone().unwrap();
            for line in BufReader::new(stream).lines() {
                let Ok(line) = line else { break };
                let req: Request = serde_json::from_str(&line).unwrap();
                let resp = Response::success(
                    Some(req.id),
                    json!({ "method": req.method, "params": req.params }),
                );
                if writer
                    .write_all(resp.to_json_line().unwrap().as_bytes())
                    .is_err()
                {
                    break;
                }
            }
        }
    });

    socket_path
}

fn mimo() -> Command {
    let mut cmd = Command::cargo_bin("mimo").unwrap();
    cmd.env_remove("MIMO_SOCKET").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_bdevs_prints_result_json() {
    let tmp = TempDir::new().unwrap();
    let socket = spawn_echo_daemon(&tmp);

    mimo()
        .arg("--socket")
        .arg(&socket)
        .args(["bdevs", "--name", "Malloc0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"method\": \"bdev_get_bdevs\""))
        .stdout(predicate::str::contains("\"name\": \"Malloc0\""));
}

#[test]
fn test_raid_create_sends_split_base_bdevs() {
    let tmp = TempDir::new().unwrap();
    let socket = spawn_echo_daemon(&tmp);

    let output = mimo()
        .arg("--socket")
        .arg(&socket)
        .args([
            "raid-create",
            "--name",
            "raid1",
            "--raid-level",
            "raid0",
            "--base-bdevs",
            "Malloc0 Malloc1",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["params"]["base_bdevs"], json!(["Malloc0", "Malloc1"]));
}

#[test]
fn test_missing_daemon_fails() {
    let tmp = TempDir::new().unwrap();
    let socket = tmp.path().join("nonexistent.sock");

    mimo()
        .arg("--socket")
        .arg(&socket)
        .arg("bdevs")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to connect RPC"));
}

#[test]
fn test_validation_failure_reported() {
    let tmp = TempDir::new().unwrap();
    let socket = tmp.path().join("unused.sock");

    mimo()
        .arg("--socket")
        .arg(&socket)
        .args(["malloc-create", "--size-mb", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "total_size and block_size must be positive",
        ));
}
