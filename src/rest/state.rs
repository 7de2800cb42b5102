//! Shared state for the options server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;

/// Shared state for the options server
#[derive(Clone)]
pub struct OptionsServerState {
    /// Values served from GET /api/colors
    pub colors: Arc<Vec<String>>,
    /// Latency applied when the request does not override it
    pub delay: Duration,
    requests_served: Arc<AtomicU64>,
}

impl OptionsServerState {
    pub fn new(colors: Vec<String>, delay: Duration) -> Self {
        Self {
            colors: Arc::new(colors),
            delay,
            requests_served: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.colors.clone(), Duration::from_millis(config.delay_ms))
    }

    /// Count one options request
    pub fn record_request(&self) -> u64 {
        self.requests_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = ServerConfig {
            port: 4000,
            colors: vec!["teal".to_string()],
            delay_ms: 250,
        };
        let state = OptionsServerState::from_config(&config);

        assert_eq!(*state.colors, vec!["teal".to_string()]);
        assert_eq!(state.delay, Duration::from_millis(250));
    }

    #[test]
    fn test_request_counter_is_shared_between_clones() {
        let state = OptionsServerState::new(vec![], Duration::ZERO);
        let clone = state.clone();

        assert_eq!(state.record_request(), 1);
        assert_eq!(clone.record_request(), 2);
        assert_eq!(state.requests_served(), 2);
    }
}
