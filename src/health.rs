//! Liveness endpoint for process supervisors.

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{AppError, Result};

/// Handler for `GET /health`: returns 200 OK with a plain-text body.
async fn health() -> &'static str {
    "ok"
}

/// Router exposing the health endpoint.
#[must_use]
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Serve the health endpoint on `port` until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the port cannot be bound or the server fails.
pub async fn serve_health(port: u16, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Io(format!("failed to bind health endpoint on {bind}: {err}")))?;

    info!(%bind, "starting health endpoint");
    serve_listener(listener, ct).await
}

/// Serve the health endpoint on an already-bound listener until `ct` is
/// cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the server fails.
pub async fn serve_listener(listener: TcpListener, ct: CancellationToken) -> Result<()> {
    axum::serve(listener, router())
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Io(format!("health server error: {err}")))?;

    info!("health endpoint shut down");
    Ok(())
}
