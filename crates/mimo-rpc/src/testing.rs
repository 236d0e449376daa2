//! In-memory transport and connector for tests
//!
//! Enabled for this crate's own tests and, for dependants, with the `test-utils` feature.

use async_trait::async_trait;
use mimo_protocol::RpcError;
use parking_lot::Mutex;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::CallFailure;
use crate::transport::{Connector, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Result(Value),
    Remote(RpcError),
}

/// Records every call and answers with a fixed reply
#[derive(Debug)]
pub struct FakeTransport {
    reply: Reply,
    calls: Mutex<Vec<(String, Value)>>,
    closed: AtomicUsize,
}

impl FakeTransport {
    pub fn replying(result: Value) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Result(result),
            calls: Mutex::new(Vec::new()),
            closed: AtomicUsize::new(0),
        })
    }

    pub fn remote_error(code: i32, message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Remote(RpcError {
                code,
                message: message.to_string(),
                data: None,
            }),
            calls: Mutex::new(Vec::new()),
            closed: AtomicUsize::new(0),
        })
    }

    /// `(method, params)` for every call received, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Params of the most recent call
    pub fn last_params(&self) -> Option<Value> {
        self.calls.lock().last().map(|(_, params)| params.clone())
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, CallFailure> {
        self.calls.lock().push((method.to_string(), params));
        match &self.reply {
            Reply::Result(value) => Ok(value.clone()),
            Reply::Remote(err) => Err(CallFailure::Remote(err.clone())),
        }
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Counts connection attempts; either hands out one transport or always fails
#[derive(Debug)]
pub struct FakeConnector {
    transport: Option<Arc<FakeTransport>>,
    attempts: AtomicUsize,
    paths: Mutex<Vec<PathBuf>>,
    delay_ms: AtomicU64,
}

impl FakeConnector {
    pub fn ok(transport: Arc<FakeTransport>) -> Arc<Self> {
        Arc::new(Self {
            transport: Some(transport),
            attempts: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
            delay_ms: AtomicU64::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            transport: None,
            attempts: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
            delay_ms: AtomicU64::new(0),
        })
    }

    /// Sleep inside `connect`, widening the window for racing callers
    pub fn with_delay_ms(self: Arc<Self>, ms: u64) -> Arc<Self> {
        self.delay_ms.store(ms, Ordering::SeqCst);
        self
    }

    pub fn connect_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn connected_paths(&self) -> Vec<PathBuf> {
        self.paths.lock().clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, path: &Path) -> io::Result<Arc<dyn Transport>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().push(path.to_path_buf());

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        match &self.transport {
            Some(transport) => Ok(transport.clone()),
            None => Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
        }
    }
}
