//! # Parlor Server
//!
//! HTTP chat relay with presence tracking.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! parlor
//!
//! # Run with custom config
//! parlor --config /path/to/parlor.toml
//!
//! # Run with environment variables
//! PARLOR_PORT=5000 PARLOR_PRESENCE__TIMEOUT_MS=20000 parlor
//! ```

mod config;
mod handlers;
mod metrics;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "parlor", version, about = "HTTP chat relay with presence tracking")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parlor=debug,parlor_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Load configuration
    let config = config::Config::load(args.config.as_deref())?;

    tracing::info!(
        timeout_ms = config.presence.timeout_ms,
        sweep_interval_ms = config.presence.sweep_interval_ms,
        "Starting Parlor server on {}:{}",
        config.host,
        config.port
    );

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
