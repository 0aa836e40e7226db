//! Git smart-HTTP proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │               GIT OVERLOAD PROXY              │
//!   git push / fetch   │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!   ───────────────────┼─▶│  http   │───▶│ backend  │───▶│ Git RPC │──┼──▶ Backend
//!                      │  │ server  │    │  client  │    │ status  │  │
//!                      │  └────┬────┘    └──────────┘    └────┬────┘  │
//!                      │       │                              │       │
//!                      │       │  overloaded?  ◀──────────────┘       │
//!                      │       ▼                                      │
//!   busy response      │  ┌─────────────────────────────┐             │
//!   ◀──────────────────┼──│ git: overload → busy → pkt  │             │
//!                      │  └─────────────────────────────┘             │
//!                      │  config · observability · lifecycle          │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use git_overload_proxy::config::{load_config, ProxyConfig};
use git_overload_proxy::lifecycle::signals::forward_signals;
use git_overload_proxy::observability::{logging, metrics};
use git_overload_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "git-overload-proxy")]
#[command(about = "Git smart-HTTP proxy with graceful overload responses", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("git-overload-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();

    let signals = shutdown.clone();
    tokio::spawn(async move { forward_signals(&signals).await });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
