//! HTTP server lifecycle.
//!
//! Binds the listener, serves [`api_routes`] and shuts down gracefully once
//! the cancellation token fires. In-flight requests finish first.

use super::api::api_routes;
use crate::services::ReviewService;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

/// Full application router: API routes plus cross-cutting layers.
pub fn app(service: ReviewService) -> Router {
    api_routes(service).layer(CorsLayer::permissive())
}

/// Bind `addr`, returning the listener and the address actually bound.
///
/// Port `0` picks a free port.
pub async fn bind(addr: SocketAddr) -> Result<(TcpListener, SocketAddr), String> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;
    let local = listener
        .local_addr()
        .map_err(|e| format!("Failed to read bound address: {}", e))?;
    Ok((listener, local))
}

/// Serve requests on `listener` until `cancel` is triggered.
pub async fn serve(
    listener: TcpListener,
    service: ReviewService,
    cancel: CancellationToken,
) -> Result<(), String> {
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to read bound address: {}", e))?;

    log::info!("[http] Server listening on http://{}", addr);

    axum::serve(listener, app(service))
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    log::info!("[http] Server stopped");
    Ok(())
}
