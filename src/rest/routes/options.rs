//! Option set endpoints.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::rest::dto::OptionsQuery;
use crate::rest::error::ApiError;
use crate::rest::state::OptionsServerState;

/// Longest latency a request may ask for
const MAX_DELAY_MS: u64 = 30_000;

/// Favorite color choices
pub async fn colors(
    State(state): State<OptionsServerState>,
    Query(query): Query<OptionsQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let served = state.record_request();

    let delay = match query.delay_ms {
        Some(ms) if ms > MAX_DELAY_MS => {
            return Err(ApiError::BadRequest(format!(
                "delay_ms must be at most {}",
                MAX_DELAY_MS
            )));
        }
        Some(ms) => Duration::from_millis(ms),
        None => state.delay,
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if query.fail {
        tracing::debug!(request = served, "Failing colors request on demand");
        return Err(ApiError::InternalError("colors unavailable".to_string()));
    }

    tracing::debug!(request = served, count = state.colors.len(), "Serving colors");
    Ok(Json(state.colors.as_ref().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn state() -> OptionsServerState {
        OptionsServerState::new(vec!["red".to_string(), "green".to_string()], Duration::ZERO)
    }

    #[tokio::test]
    async fn test_colors_returns_configured_list() {
        let Json(colors) = colors(State(state()), Query(OptionsQuery::default()))
            .await
            .unwrap();
        assert_eq!(colors, vec!["red".to_string(), "green".to_string()]);
    }

    #[tokio::test]
    async fn test_colors_fail_on_demand() {
        let query = OptionsQuery {
            delay_ms: None,
            fail: true,
        };
        let err = colors(State(state()), Query(query)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_excessive_delay_rejected() {
        let query = OptionsQuery {
            delay_ms: Some(MAX_DELAY_MS + 1),
            fail: false,
        };
        let err = colors(State(state()), Query(query)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delay_override_is_applied() {
        let query = OptionsQuery {
            delay_ms: Some(40),
            fail: false,
        };
        let started = std::time::Instant::now();
        colors(State(state()), Query(query)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_each_request_is_counted() {
        let state = state();
        colors(State(state.clone()), Query(OptionsQuery::default()))
            .await
            .unwrap();
        colors(State(state.clone()), Query(OptionsQuery::default()))
            .await
            .unwrap();
        assert_eq!(state.requests_served(), 2);
    }
}
