//! Query Routes
//!
//! - POST /api/v1/query - Run a batch of queries against CnosDB

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::datasource::{QueryDataRequest, QueryDataResponse};

/// POST /api/v1/query
///
/// Per-query failures are reported inside the response, so this only
/// fails for malformed batches.
pub async fn query_data(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryDataRequest>,
) -> ApiResult<Json<QueryDataResponse>> {
    if req.queries.is_empty() {
        return Err(ApiError::Validation("queries cannot be empty".to_string()));
    }

    tracing::debug!(queries = req.queries.len(), "Running query batch");

    Ok(Json(state.datasource.query_data(req).await))
}
