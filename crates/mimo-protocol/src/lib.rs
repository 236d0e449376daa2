mod lifecycle;
mod protocol;

pub use lifecycle::{socket_env_override, socket_path, DEFAULT_SOCKET_PATH, SOCKET_ENV};
pub use protocol::{Request, RequestId, Response, RpcError, METHOD_NOT_FOUND};
