//! Axum server setup and router configuration.

use crate::api;
use crate::shutdown::shutdown_requested;
use crate::state::AppState;
use axum::{Json, Router, response::IntoResponse, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Build the status router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(api::router())
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Serve until the shutdown flag is raised.
pub async fn run_server(
    router: Router,
    addr: SocketAddr,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Status server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_requested(shutdown_rx))
        .await
}
