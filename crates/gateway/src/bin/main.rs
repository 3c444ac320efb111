//! Parley gateway binary entry point.
//!
//! Resolves the config directory, scaffolds a default config on first run,
//! and serves until ctrl-c.

use anyhow::{Context, Result};
use clap::Parser;
use parley_gateway::{
    GatewayConfig,
    config::{self, CONFIG_FILE},
    serve_with_config,
};
use std::path::PathBuf;
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// Parley chat gateway.
#[derive(Debug, Parser)]
#[command(name = "parley-gateway", version, about)]
struct Cli {
    /// Path to gateway.toml. Defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to bind, overriding `[server] bind`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing from RUST_LOG (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let (config_dir, config_path) = match cli.config {
        Some(path) => {
            let dir = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            (dir, path)
        }
        None => {
            let dir = config::global_config_dir().context("no platform config directory")?;
            let path = dir.join(CONFIG_FILE);
            if !path.exists() {
                config::scaffold_config_dir(&dir)?;
                tracing::info!("scaffolded default config at {}", path.display());
            }
            (dir, path)
        }
    };

    let config = GatewayConfig::load(&config_path)?;
    tracing::info!("loaded configuration from {}", config_path.display());
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());

    let handle = serve_with_config(&config, &config_dir, &bind).await?;
    shutdown_signal().await;
    handle.shutdown().await
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
    }
}
