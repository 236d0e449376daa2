use std::path::PathBuf;

/// Well-known socket the storage daemon listens on
pub const DEFAULT_SOCKET_PATH: &str = "/var/tmp/mimo.sock";

/// Environment variable overriding [`DEFAULT_SOCKET_PATH`]
pub const SOCKET_ENV: &str = "MIMO_SOCKET";

/// Socket named by `MIMO_SOCKET`, if set and non-empty
pub fn socket_env_override() -> Option<PathBuf> {
    std::env::var(SOCKET_ENV)
        .ok()
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}

/// Get the socket path for the daemon
///
/// Priority:
/// 1. `MIMO_SOCKET` environment variable (if set and non-empty)
/// 2. `/var/tmp/mimo.sock`
pub fn socket_path() -> PathBuf {
    socket_env_override().unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH))
}
