use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use mimo_cli::cli::{Cli, LogLevel};
use mimo_cli::commands;
use mimo_cli::config::CliConfig;
use mimo_rpc::{BdevService, RpcConnection};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;

    // Explicit --log-level wins over --verbose, which wins over the config file
    let level = cli
        .log_level
        .or(cli.verbose.then_some(LogLevel::Debug))
        .or(config.log_level)
        .unwrap_or(LogLevel::Warn);

    // Logs go to stderr; stdout carries only the JSON result
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from(level).into())
                .from_env_lossy(),
        )
        .init();

    let socket = config.resolve_socket(cli.socket);
    debug!(socket = %socket.display(), "Using daemon socket");

    let conn = Arc::new(RpcConnection::new(socket));
    let svc = BdevService::new(conn.clone());

    let result = commands::execute(&svc, cli.command).await;
    conn.shutdown().await;

    println!("{}", commands::render(&result?)?);
    Ok(())
}
