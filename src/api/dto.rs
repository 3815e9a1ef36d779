//! Data Transfer Objects
//!
//! Response types owned by the HTTP layer. Query batches travel as the
//! datasource's own [`QueryDataRequest`](crate::datasource::QueryDataRequest)
//! and [`QueryDataResponse`](crate::datasource::QueryDataResponse).

use crate::datasource::HealthStatus;
use serde::Serialize;

/// Compiled statement for a single model
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    /// SQL that would be sent to CnosDB
    pub sql: String,
    /// Resolved bucket width, empty when not bucketed
    pub interval: String,
    /// Effective fill policy, empty when no resampling applies
    pub fill: String,
}

/// Datasource health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub message: String,
    pub details: String,
    pub uptime_seconds: u64,
    pub version: String,
}
