//! Health Routes
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /api/v1/health - Ping CnosDB through the datasource

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::datasource::HealthStatus;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /api/v1/health
///
/// 200 when CnosDB answers its ping, 503 otherwise.
pub async fn datasource_health(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let health = state.datasource.check_health().await;

    let status = match health.status {
        HealthStatus::Ok => StatusCode::OK,
        HealthStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        status,
        Json(HealthResponse {
            status: health.status,
            message: health.message,
            details: health.details,
            uptime_seconds: state.uptime_seconds(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
