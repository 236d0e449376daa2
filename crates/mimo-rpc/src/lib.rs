//! Client library for the mimo storage daemon
//!
//! The daemon exposes a JSON-RPC 2.0 control plane on a Unix socket. This crate keeps a
//! single shared session to it and offers typed, validated block device operations on
//! top.
//!
//! ```text
//! BdevService ──> build_params ──> RpcConnection ──> Transport ──> Unix socket ──> daemon
//! (validation)    (omission)       (one-shot session)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mimo_rpc::{BdevService, RpcConnection};
//!
//! let conn = Arc::new(RpcConnection::new("/var/tmp/mimo.sock"));
//! let bdevs = BdevService::new(conn.clone());
//!
//! let all = bdevs.get_bdevs(None, None).await?;
//! conn.shutdown().await;
//! ```

pub mod bdev;
mod connection;
mod error;
pub mod params;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use bdev::{BdevService, CreateRaidBdevRequest, DEFAULT_NVME_TRTYPE};
pub use connection::RpcConnection;
pub use error::{BdevError, CallFailure, ClientError, ErrorKind, Result};
pub use params::{build_params, IntoParam, ParamValue, Params};
pub use transport::{Connector, Transport, UnixConnector, UnixTransport};

pub use mimo_protocol::{socket_path, RpcError, DEFAULT_SOCKET_PATH};
