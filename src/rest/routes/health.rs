//! Health check and status endpoints.

use axum::{extract::State, Json};

use crate::rest::dto::{HealthResponse, StatusResponse};
use crate::rest::state::OptionsServerState;

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Service status with request counters
pub async fn status(State(state): State<OptionsServerState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        option_count: state.colors.len(),
        requests_served: state.requests_served(),
    })
}
