//! Shared connection to the daemon
//!
//! [`RpcConnection`] owns at most one session for its whole lifetime. The session is
//! opened on the first [`RpcConnection::invoke`]; concurrent first callers wait on the
//! same initializer and share its outcome. A failed connect is cached and returned to
//! every later caller.

use parking_lot::Mutex;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::params::Params;
use crate::transport::{Connector, Transport, UnixConnector};

type Session = std::result::Result<Arc<dyn Transport>, ClientError>;

struct Address {
    path: PathBuf,
    /// Set once the initializer has read `path`
    frozen: bool,
}

pub struct RpcConnection {
    address: Mutex<Address>,
    connector: Arc<dyn Connector>,
    session: OnceCell<Session>,
    closed: AtomicBool,
    /// Set once the transport has been closed
    released: AtomicBool,
}

impl std::fmt::Debug for RpcConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConnection")
            .field("socket_path", &self.socket_path())
            .field("connected", &self.is_connected())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for RpcConnection {
    fn default() -> Self {
        Self::new(mimo_protocol::socket_path())
    }
}

impl RpcConnection {
    /// Connection over the Unix socket at `path`. Nothing is opened until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_connector(path, Arc::new(UnixConnector))
    }

    /// Connection using a custom [`Connector`]
    pub fn with_connector(path: impl Into<PathBuf>, connector: Arc<dyn Connector>) -> Self {
        Self {
            address: Mutex::new(Address {
                path: path.into(),
                frozen: false,
            }),
            connector,
            session: OnceCell::new(),
            closed: AtomicBool::new(false),
            released: AtomicBool::new(false),
        }
    }

    pub fn socket_path(&self) -> PathBuf {
        self.address.lock().path.clone()
    }

    /// Change the socket used by the first connection.
    ///
    /// Fails with [`ClientError::AlreadyConnected`] once a connection attempt has
    /// started; the address in use is left unchanged.
    pub fn configure(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut address = self.address.lock();
        if address.frozen {
            warn!(
                current = %address.path.display(),
                requested = %path.as_ref().display(),
                "Ignoring socket change after connection was initialized"
            );
            return Err(ClientError::AlreadyConnected {
                address: address.path.display().to_string(),
            });
        }
        address.path = path.as_ref().to_path_buf();
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst) && matches!(self.session.get(), Some(Ok(_)))
    }

    /// Invoke `method` and return its result as indented JSON bytes
    pub async fn invoke(&self, method: &str, params: Params) -> Result<Vec<u8>> {
        let transport = self.transport().await?;

        let result = transport
            .call(method, Value::Object(params))
            .await
            .map_err(|source| ClientError::Call {
                method: method.to_string(),
                source,
            })?;

        serde_json::to_vec_pretty(&result).map_err(|e| ClientError::Serialization(Arc::new(e)))
    }

    /// Close the session if one is open. Later invocations fail with a connection error.
    ///
    /// A connect still in progress is closed by the caller waiting on it once it
    /// completes.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(Ok(transport)) = self.session.get() {
            self.release(transport).await;
        }
    }

    async fn transport(&self) -> Result<Arc<dyn Transport>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.closed_error());
        }

        let session = self.session.get_or_init(|| self.establish()).await;

        if self.closed.load(Ordering::SeqCst) {
            if let Ok(transport) = session {
                self.release(transport).await;
            }
            return Err(self.closed_error());
        }
        session.clone()
    }

    async fn release(&self, transport: &Arc<dyn Transport>) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        transport.close().await;
        info!(path = %self.socket_path().display(), "RPC connection closed");
    }

    async fn establish(&self) -> Session {
        let path = {
            let mut address = self.address.lock();
            address.frozen = true;
            address.path.clone()
        };

        debug!(path = %path.display(), "Connecting to daemon");
        match self.connector.connect(&path).await {
            Ok(transport) => Ok(transport),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to connect to daemon");
                Err(ClientError::Connection {
                    address: path.display().to_string(),
                    source: Arc::new(e),
                })
            }
        }
    }

    fn closed_error(&self) -> ClientError {
        ClientError::Connection {
            address: self.socket_path().display().to_string(),
            source: Arc::new(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection has been shut down",
            )),
        }
    }
}
