use clap::{Parser, Subcommand, ValueEnum};
use mimo_rpc::DEFAULT_NVME_TRTYPE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors (default)
    Warn,
    /// Informational messages
    Info,
    /// Debug messages, including per-call timing
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "mimo")]
#[command(about = "mimo - manage block devices through the mimo storage daemon")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value or defaults to 'warn'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/mimo/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Daemon RPC socket (overrides MIMO_SOCKET and the config file)
    #[arg(short = 's', long, global = true)]
    pub socket: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List block devices
    Bdevs {
        /// Only show this bdev
        #[arg(short, long)]
        name: Option<String>,

        /// How long the daemon waits for the bdev to appear (0 = no wait)
        #[arg(short, long, default_value = "0")]
        timeout_ms: u64,
    },

    /// Attach an NVMe controller
    NvmeAttach {
        /// Controller name
        name: String,

        /// Transport address (e.g. PCI address 0000:5e:00.0)
        #[arg(short = 'a', long)]
        traddr: String,

        /// Transport type
        #[arg(short = 't', long, default_value = DEFAULT_NVME_TRTYPE)]
        trtype: String,
    },

    /// Detach an NVMe controller
    NvmeDetach {
        /// Controller name
        name: String,

        #[arg(short = 't', long)]
        trtype: Option<String>,

        #[arg(short = 'a', long)]
        traddr: Option<String>,
    },

    /// Create a memory-backed bdev
    MallocCreate {
        /// Total size in MiB
        #[arg(long = "size-mb")]
        total_size_mb: f64,

        /// Block size in bytes
        #[arg(short, long, default_value = "512")]
        block_size: u32,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        uuid: Option<String>,
    },

    /// Delete a malloc bdev
    MallocDelete { name: String },

    /// Create a RAID bdev
    RaidCreate {
        /// RAID bdev name
        #[arg(short, long)]
        name: String,

        /// RAID level (raid0, raid1, raid5f, concat, ...)
        #[arg(short = 'r', long = "raid-level")]
        raid_level: String,

        /// Member bdevs; a single quoted, space-separated list is also accepted
        #[arg(short, long = "base-bdevs", required = true, num_args = 1..)]
        base_bdevs: Vec<String>,

        /// Strip size in KiB
        #[arg(short = 'z', long)]
        strip_size_kb: Option<u32>,

        #[arg(short, long)]
        uuid: Option<String>,

        /// Store RAID metadata on the member bdevs
        #[arg(long)]
        superblock: bool,
    },

    /// Delete a RAID bdev
    RaidDelete { name: String },

    /// Add a member bdev to a RAID bdev
    RaidAddBase {
        /// RAID bdev name
        raid_bdev: String,
        /// Bdev to add
        base_bdev: String,
    },

    /// Remove a member bdev from its RAID bdev
    RaidRemoveBase { name: String },

    /// Wipe the superblock of a bdev
    WipeSuperblock {
        name: String,

        /// Bytes to wipe (0 = daemon default of 1 MiB)
        #[arg(long, default_value = "0")]
        size: u64,
    },
}
