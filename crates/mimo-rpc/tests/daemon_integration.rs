//! Integration tests for BdevService against a fake daemon on a real Unix socket
//!
//! The fake daemon answers every request with `{"method": ..., "params": ...}` so tests
//! can check exactly what went over the wire. `bdev_slow` is answered after 100ms.

use mimo_protocol::{Request, Response, METHOD_NOT_FOUND};
use mimo_rpc::{BdevService, CreateRaidBdevRequest, ErrorKind, RpcConnection};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::task::JoinHandle;

struct TestDaemon {
    _temp_dir: TempDir,
    socket_path: PathBuf,
    accepted: Arc<AtomicUsize>,
    _handle: JoinHandle<()>,
}

impl TestDaemon {
    fn start() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let socket_path = temp_dir.path().join("mimo.sock");
        let listener = UnixListener::bind(&socket_path).expect("Failed to bind socket");
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = accepted.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let (read, mut write) = stream.into_split();
                    let mut lines = BufReader::new(read).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        let req: Request = serde_json::from_str(&line).unwrap();
                        if req.method == "bdev_slow" {
                            tokio::time::sleep(Duration::from_millis(100)).await;
                        }
                        let resp = handle_request(req);
                        let out = resp.to_json_line().unwrap();
                        if write.write_all(out.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        Self {
            _temp_dir: temp_dir,
            socket_path,
            accepted,
            _handle: handle,
        }
    }

    fn connection_count(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

fn handle_request(req: Request) -> Response {
    match req.method.as_str() {
        "bdev_unknown" => Response::error(Some(req.id), METHOD_NOT_FOUND, "Method not found"),
        _ => Response::success(
            Some(req.id),
            json!({ "method": req.method, "params": req.params }),
        ),
    }
}

fn service_for(daemon: &TestDaemon) -> (Arc<RpcConnection>, BdevService) {
    let conn = Arc::new(RpcConnection::new(&daemon.socket_path));
    let svc = BdevService::new(conn.clone());
    (conn, svc)
}

#[tokio::test]
async fn test_get_bdevs_round_trip() {
    let daemon = TestDaemon::start();
    let (_conn, svc) = service_for(&daemon);

    let result = svc.get_bdevs(None, Some(0)).await.unwrap();
    assert_eq!(result, json!({"method": "bdev_get_bdevs", "params": {}}));

    let result = svc.get_bdevs(Some("Malloc0"), None).await.unwrap();
    assert_eq!(result["params"], json!({"name": "Malloc0"}));
}

#[tokio::test]
async fn test_raid_create_normalizes_on_the_wire() {
    let daemon = TestDaemon::start();
    let (_conn, svc) = service_for(&daemon);

    let req = CreateRaidBdevRequest {
        name: "raid1".into(),
        raid_level: "raid10".into(),
        base_bdevs: vec!["bdev1 bdev2 bdev3 bdev4".into()],
        strip_size_kb: Some(64),
        uuid: None,
        superblock: true,
    };
    let result = svc.create_raid_bdev(&req).await.unwrap();
    assert_eq!(
        result["params"],
        json!({
            "name": "raid1",
            "raid_level": "raid10",
            "base_bdevs": ["bdev1", "bdev2", "bdev3", "bdev4"],
            "strip_size_kb": 64,
            "superblock": true
        })
    );
}

#[tokio::test]
async fn test_concurrent_calls_share_one_socket() {
    let daemon = TestDaemon::start();
    let (_conn, svc) = service_for(&daemon);

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let svc = svc.clone();
            tokio::spawn(async move {
                let name = format!("Malloc{i}");
                let result = svc.get_bdevs(Some(&name), None).await.unwrap();
                (name, result)
            })
        })
        .collect();

    for handle in handles {
        let (name, result) = handle.await.unwrap();
        assert_eq!(result["params"]["name"], Value::String(name));
    }
    assert_eq!(daemon.connection_count(), 1);
}

#[tokio::test]
async fn test_remote_error_reported_as_call_error() {
    let daemon = TestDaemon::start();
    let conn = Arc::new(RpcConnection::new(&daemon.socket_path));

    let err = conn
        .invoke("bdev_unknown", Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Call);
    assert_eq!(err.rpc_error().unwrap().code, METHOD_NOT_FOUND);

    // The session survives a remote error
    let ok = conn.invoke("bdev_get_bdevs", Default::default()).await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn test_missing_socket_fails_with_connection_error() {
    let tmp = TempDir::new().unwrap();
    let conn = Arc::new(RpcConnection::new(tmp.path().join("nonexistent.sock")));
    let svc = BdevService::new(conn);

    let err = svc.get_bdevs(None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.source.to_string().contains("nonexistent.sock"));

    let err = svc.delete_malloc_bdev("Malloc0").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn test_shutdown_closes_session() {
    let daemon = TestDaemon::start();
    let (conn, svc) = service_for(&daemon);

    svc.wipe_superblock("Malloc0", 0).await.unwrap();
    assert!(conn.is_connected());

    conn.shutdown().await;
    conn.shutdown().await;
    assert!(!conn.is_connected());

    let err = svc.wipe_superblock("Malloc0", 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(daemon.connection_count(), 1);
}

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_call() {
    let daemon = TestDaemon::start();
    let (conn, svc) = service_for(&daemon);
    svc.get_bdevs(None, None).await.unwrap();

    let in_flight = {
        let conn = conn.clone();
        tokio::spawn(async move { conn.invoke("bdev_slow", Default::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    conn.shutdown().await;

    // The call that already held the socket still gets its reply
    let bytes = in_flight.await.unwrap().unwrap();
    let result: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(result["method"], "bdev_slow");

    let err = svc.get_bdevs(None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}
