//! # gatehouse-daemon
//!
//! Gatehouse MCP server daemon.
//!
//! Starts an MCP server on stdio that an agent client connects to. Every
//! side-effecting tracker operation the agent proposes is held as a
//! pending operation until the operator confirms, cancels, or revises it.
//!
//! ## Usage
//!
//! Typically started automatically by the MCP client via `.mcp.json`:
//! ```json
//! {
//!   "mcpServers": {
//!     "gatehouse": {
//!       "type": "stdio",
//!       "command": "cargo",
//!       "args": ["run", "-p", "gatehouse-daemon"]
//!     }
//!   }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use gatehouse_gateway::{GateConfig, GateServer};

/// Gatehouse MCP server.
#[derive(Parser)]
#[command(name = "gatehouse-daemon", about = "Gatehouse confirmation gateway MCP server")]
struct Cli {
    /// Path to a gatehouse.toml config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the in-memory tracker instead of the HTTP tracker.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they don't interfere with MCP on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("gatehouse_gateway=info".parse()?)
                .add_directive("gatehouse_ops=info".parse()?)
                .add_directive("gatehouse_daemon=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GateConfig::from_file(path)?,
        None => GateConfig::default(),
    };

    tracing::info!("Starting Gatehouse MCP server");
    tracing::info!(
        ttl_secs = config.ttl_secs,
        offline = cli.offline,
        "pending operations expire after the configured TTL"
    );

    let sweep_interval = Duration::from_secs(config.sweep_interval_secs.max(1));
    let server = if cli.offline {
        GateServer::offline(config)
    } else {
        GateServer::new(config)?
    };

    // Background sweep keeps memory bounded; expiry itself is already
    // enforced lazily on every registry read.
    let sweep_state = server.state().clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.tick().await; // first tick completes immediately
        loop {
            ticker.tick().await;
            match sweep_state.lock() {
                Ok(mut state) => {
                    state.registry.sweep();
                }
                Err(e) => tracing::error!("sweep skipped, lock poisoned: {}", e),
            }
        }
    });

    tracing::info!("MCP server ready, waiting for client connection");

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .inspect_err(|e| tracing::error!("serving error: {:?}", e))?;

    service.waiting().await?;

    tracing::info!("MCP server shutting down");
    Ok(())
}
