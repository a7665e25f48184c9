//! Signal handling for graceful shutdown and config reload.

use crate::config::ConfigLoader;
use ogsn_core::config::{ConfigStore, FilterSettings};
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C).
pub async fn shutdown_signal() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT, initiating graceful shutdown");
        }
    }
    Ok(())
}

/// Resolves once the shutdown flag is raised or its sender is gone.
pub async fn shutdown_requested(mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow_and_update() {
            return;
        }
        if shutdown_rx.changed().await.is_err() {
            return;
        }
    }
}

/// Spawns a task that reloads the filter settings on SIGHUP.
///
/// The new settings are swapped in atomically; the poll loop picks them up
/// at the start of its next cycle. Connection and poll settings need a
/// restart.
pub fn spawn_config_reload_handler(
    config_loader: Arc<ConfigLoader>,
    settings: ConfigStore<FilterSettings>,
    shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    let mut sighup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        let shutdown = shutdown_requested(shutdown_rx);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!("Received SIGHUP, reloading configuration");
                    match config_loader.reload() {
                        Ok(loaded_config) => {
                            let version = settings.update(loaded_config.filter).await;
                            tracing::info!(
                                version,
                                settings = ?loaded_config.filter,
                                "Filter settings reloaded"
                            );
                        }
                        Err(e) => {
                            tracing::error!("Failed to reload configuration: {}", e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    tracing::debug!("Config reload handler shutting down");
                    break;
                }
            }
        }
    }))
}
