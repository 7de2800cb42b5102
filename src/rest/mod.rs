//! Dev options server.
//!
//! Serves the option sets the wizard fetches, so the TUI can run without an
//! external backend. Also used by the integration tests on an ephemeral port.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use state::OptionsServerState;

/// Build the router with all routes
pub fn build_router(state: OptionsServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Option sets
        .route("/api/colors", get(routes::options::colors))
        // Health endpoints
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/status", get(routes::health::status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve on an already bound listener until the task is dropped
pub async fn serve_listener(state: OptionsServerState, listener: TcpListener) -> Result<()> {
    let app = build_router(state);
    axum::serve(listener, app)
        .await
        .context("Options server stopped unexpectedly")?;
    Ok(())
}

/// Start the options server on all interfaces
pub async fn serve(state: OptionsServerState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Options server listening on http://{}", addr);

    serve_listener(state, listener).await
}
