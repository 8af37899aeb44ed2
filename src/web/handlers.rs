use axum::{extract::State, http::StatusCode, response::Json};
use std::time::Instant;

use super::{ApiResponse, AppState, HealthCheck, HealthResponse, WebError};
use crate::models::{CheckRecord, StockStateRow};

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let started = Instant::now();
    let database = match state.state.ping().await {
        Ok(()) => HealthCheck {
            name: "database".to_string(),
            status: "healthy".to_string(),
            message: None,
            duration_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(error = %e, "State store health check failed");
            HealthCheck {
                name: "database".to_string(),
                status: "unhealthy".to_string(),
                message: Some(e.to_string()),
                duration_ms: Some(started.elapsed().as_millis() as u64),
            }
        }
    };

    let uptime = (chrono::Utc::now() - state.started_at).num_seconds().max(0) as u64;
    let health = HealthResponse::from_checks(vec![database], uptime);
    let status = if health.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health))
}

/// Records from the most recent run.
pub async fn current_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CheckRecord>>>, WebError> {
    match state.snapshot.read().await {
        Ok(records) => {
            let meta = serde_json::json!({ "count": records.len() });
            Ok(Json(ApiResponse::success_with_meta(records, meta)))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read status snapshot");
            Err(WebError::internal("Failed to read status snapshot"))
        }
    }
}

/// Every persisted observation.
pub async fn state_dump(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<StockStateRow>>>, WebError> {
    match state.state.dump().await {
        Ok(rows) => {
            let meta = serde_json::json!({ "count": rows.len() });
            Ok(Json(ApiResponse::success_with_meta(rows, meta)))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to dump state store");
            Err(WebError::unavailable("State store unavailable"))
        }
    }
}
