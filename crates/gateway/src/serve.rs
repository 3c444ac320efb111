//! Shared gateway serve entrypoint, used by the binary and tests.

use crate::{
    GatewayConfig, auth::Authenticator, builder::build_gateway, config::CONFIG_FILE, hook::Hook,
    routes::router, state::Gateway,
};
use anyhow::Result;
use std::path::Path;
use tokio::sync::oneshot;

/// Handle returned by [`serve`], holding the bound port and shutdown trigger.
pub struct ServeHandle {
    /// The port the gateway is listening on.
    pub port: u16,
    /// Send a value to trigger graceful shutdown.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Join handle for the server task.
    join: Option<tokio::task::JoinHandle<Result<(), std::io::Error>>>,
}

impl ServeHandle {
    /// Trigger graceful shutdown and wait for the server to stop.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            join.await??;
        }
        Ok(())
    }
}

/// Load config from `config_dir`, build the gateway, and start serving.
pub async fn serve(config_dir: &Path, bind: &str) -> Result<ServeHandle> {
    let config_path = config_dir.join(CONFIG_FILE);
    let config = GatewayConfig::load(&config_path)?;
    tracing::info!("loaded configuration from {}", config_path.display());
    serve_with_config(&config, config_dir, bind).await
}

/// Serve with an already-loaded config.
pub async fn serve_with_config(
    config: &GatewayConfig,
    config_dir: &Path,
    bind: &str,
) -> Result<ServeHandle> {
    let gateway = build_gateway(config, config_dir)?;
    serve_gateway(gateway, bind).await
}

/// Bind the axum server for an already-built gateway.
///
/// The server runs in a spawned task; call [`ServeHandle::shutdown`] to
/// stop it.
pub async fn serve_gateway<H: Hook, A: Authenticator>(
    gateway: Gateway<H, A>,
    bind: &str,
) -> Result<ServeHandle> {
    let app = router(gateway);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    let port = listener.local_addr()?.port();
    tracing::info!("gateway listening on {bind} (port {port})");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("received shutdown signal");
            })
            .await
    });

    Ok(ServeHandle {
        port,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}
