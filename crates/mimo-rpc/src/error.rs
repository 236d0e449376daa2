//! Error types for the RPC client

use mimo_protocol::{RequestId, RpcError};
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for connection-level operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Coarse classification of a [`ClientError`], for callers that branch on failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Validation,
    Call,
    Serialization,
    Decode,
    Configuration,
}

/// Errors produced by the transport and the request builders
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The session to the daemon could not be established or has been shut down
    #[error("failed to connect RPC ({address})")]
    Connection {
        address: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// Caller arguments rejected before any network activity
    #[error("{reason}")]
    Validation {
        fields: Vec<&'static str>,
        reason: String,
    },

    /// The remote call failed
    #[error("RPC call failed ({method})")]
    Call {
        method: String,
        #[source]
        source: CallFailure,
    },

    /// The result value could not be re-encoded
    #[error("marshal failed")]
    Serialization(#[source] Arc<serde_json::Error>),

    /// The result payload could not be decoded
    #[error("unmarshal result failed")]
    Decode(#[source] Arc<serde_json::Error>),

    /// The socket address was changed after the connection was attempted
    #[error("RPC connection to {address} already initialized; socket address can no longer change")]
    AlreadyConnected { address: String },
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Connection { .. } => ErrorKind::Connection,
            ClientError::Validation { .. } => ErrorKind::Validation,
            ClientError::Call { .. } => ErrorKind::Call,
            ClientError::Serialization(_) => ErrorKind::Serialization,
            ClientError::Decode(_) => ErrorKind::Decode,
            ClientError::AlreadyConnected { .. } => ErrorKind::Configuration,
        }
    }

    pub(crate) fn validation(fields: Vec<&'static str>, reason: impl Into<String>) -> Self {
        ClientError::Validation {
            fields,
            reason: reason.into(),
        }
    }

    /// Daemon-reported error object, if this is a remote failure
    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            ClientError::Call {
                source: CallFailure::Remote(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}

/// Why a single round trip failed
#[derive(Debug, Clone, Error)]
pub enum CallFailure {
    /// The daemon answered with a JSON-RPC error object
    #[error("daemon returned an error")]
    Remote(#[source] RpcError),

    /// Socket I/O failed mid-call
    #[error("socket I/O failed")]
    Io(#[source] Arc<io::Error>),

    /// The request could not be encoded
    #[error("failed to encode request")]
    Encode(#[source] Arc<serde_json::Error>),

    /// The daemon sent something that is not a valid response
    #[error("invalid response")]
    InvalidResponse(#[source] Arc<serde_json::Error>),

    /// The daemon answered a different request
    #[error("response id mismatch: expected {expected}, got {actual}")]
    IdMismatch {
        expected: RequestId,
        actual: String,
    },

    /// The daemon closed the socket before answering
    #[error("connection closed by daemon")]
    Closed,
}

impl From<io::Error> for CallFailure {
    fn from(err: io::Error) -> Self {
        CallFailure::Io(Arc::new(err))
    }
}

/// A facade operation failed; `source` carries the underlying kind and message
#[derive(Debug, Clone, Error)]
#[error("{operation} failed")]
pub struct BdevError {
    pub operation: &'static str,
    #[source]
    pub source: ClientError,
}

impl BdevError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}
