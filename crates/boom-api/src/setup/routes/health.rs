//! Liveness and readiness endpoints.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

const READINESS_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness check - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness check - the record store answers within the timeout.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match tokio::time::timeout(READINESS_TIMEOUT, state.db.records.ping()).await {
        Ok(Ok(())) => "ready".to_string(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database readiness check failed");
            format!("not_ready: {}", e)
        }
        Err(_) => {
            tracing::error!("Database readiness check timed out");
            "timeout".to_string()
        }
    };

    let (status_code, status) = if database == "ready" {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": status,
            "database": database,
        })),
    )
}
