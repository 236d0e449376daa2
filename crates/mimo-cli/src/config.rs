use anyhow::{Context, Result};
use mimo_protocol::{socket_env_override, DEFAULT_SOCKET_PATH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::LogLevel;

/// CLI configuration
///
/// ```toml
/// socket_path = "/var/tmp/mimo.sock"
/// log_level = "info"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Daemon RPC socket
    pub socket_path: Option<PathBuf>,

    /// Log level used when none is given on the command line
    pub log_level: Option<LogLevel>,
}

impl CliConfig {
    /// `$XDG_CONFIG_HOME/mimo/config.toml` (or the platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mimo").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is read if present
    /// and built-in defaults are used otherwise.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(&path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Socket to connect to.
    ///
    /// Priority: command line, `MIMO_SOCKET`, config file, built-in default.
    pub fn resolve_socket(&self, cli_socket: Option<PathBuf>) -> PathBuf {
        cli_socket
            .or_else(socket_env_override)
            .or_else(|| self.socket_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH))
    }
}
