//! Socket transport to the storage daemon
//!
//! A [`Transport`] is one live session; a [`Connector`] creates it. The production pair
//! speaks newline-delimited JSON-RPC 2.0 over a Unix socket.

use async_trait::async_trait;
use mimo_protocol::{Request, RequestId, Response};
use serde_json::Value;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::CallFailure;

/// One established session to the daemon
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `method` and return the response's `result` member
    async fn call(&self, method: &str, params: Value) -> Result<Value, CallFailure>;

    /// Release the session. Calls made afterwards fail.
    async fn close(&self);
}

/// Opens sessions to the daemon
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, path: &Path) -> io::Result<Arc<dyn Transport>>;
}

/// Connects over a Unix domain socket
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixConnector;

#[async_trait]
impl Connector for UnixConnector {
    async fn connect(&self, path: &Path) -> io::Result<Arc<dyn Transport>> {
        let transport = UnixTransport::connect(path).await?;
        Ok(Arc::new(transport))
    }
}

struct Stream {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// JSON-RPC over a single Unix socket connection
///
/// One round trip holds the stream lock from write to read. Ids only grow, so a
/// response carrying a lower id belongs to a call that was dropped before its reply
/// arrived and is skipped.
pub struct UnixTransport {
    stream: Mutex<Option<Stream>>,
    next_id: AtomicU64,
}

impl UnixTransport {
    pub async fn connect(path: &Path) -> io::Result<Self> {
        let stream = UnixStream::connect(path).await?;
        let (read, write) = stream.into_split();
        debug!(path = %path.display(), "Connected to daemon socket");

        Ok(Self {
            stream: Mutex::new(Some(Stream {
                reader: BufReader::new(read),
                writer: write,
            })),
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl Transport for UnixTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, CallFailure> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = Request::new(id, method, params);
        let line = request
            .to_json_line()
            .map_err(|e| CallFailure::Encode(Arc::new(e)))?;

        trace!(method, id, "Sending request");
        let start = Instant::now();

        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(CallFailure::Closed)?;

        stream.writer.write_all(line.as_bytes()).await?;
        stream.writer.flush().await?;

        let expected = RequestId::Number(id);
        let response = loop {
            let mut response_line = String::new();
            let bytes_read = stream.reader.read_line(&mut response_line).await?;
            if bytes_read == 0 {
                return Err(CallFailure::Closed);
            }

            let response: Response = serde_json::from_str(&response_line)
                .map_err(|e| CallFailure::InvalidResponse(Arc::new(e)))?;

            if response.id.as_ref() == Some(&expected) {
                break response;
            }
            match &response.id {
                // Late reply to an earlier request whose caller gave up
                Some(RequestId::Number(stale)) if *stale < id => {
                    debug!(method, id, stale, "Discarding response to abandoned request");
                }
                other => {
                    return Err(CallFailure::IdMismatch {
                        expected,
                        actual: other
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "null".to_string()),
                    })
                }
            }
        };
        drop(guard);

        debug!(
            method,
            id,
            elapsed_ms = start.elapsed().as_micros() as f64 / 1000.0,
            "RPC round trip"
        );

        response.into_result().map_err(CallFailure::Remote)
    }

    async fn close(&self) {
        if let Some(mut stream) = self.stream.lock().await.take() {
            let _ = stream.writer.shutdown().await;
        }
    }
}
