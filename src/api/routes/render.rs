//! Render Routes
//!
//! - POST /api/v1/render - Compile a model to SQL without running it

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::RenderResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::datasource::DataQuery;

/// POST /api/v1/render
pub async fn render_query(
    State(state): State<Arc<AppState>>,
    Json(query): Json<DataQuery>,
) -> ApiResult<Json<RenderResponse>> {
    let compiled = state.datasource.render(&query)?;

    Ok(Json(RenderResponse {
        sql: compiled.sql,
        interval: compiled.interval,
        fill: compiled.fill,
    }))
}
