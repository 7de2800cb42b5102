//! Data Transfer Objects for the options server.

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Status response with request counters
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub option_count: usize,
    pub requests_served: u64,
}

/// Query parameters accepted by option set routes
#[derive(Debug, Default, Deserialize)]
pub struct OptionsQuery {
    /// Override the configured latency for this request
    pub delay_ms: Option<u64>,
    /// Answer with HTTP 500 instead of the option set
    #[serde(default)]
    pub fail: bool,
}
