//! CnosDB Datasource
//!
//! Serves query batches against a [`SqlBackend`]. Each query runs the full
//! pipeline on its own:
//!
//! ```text
//! model JSON → introspect → SQL → backend rows → columnar → (resample) → Frame
//! ```
//!
//! A failure anywhere in one query's pipeline is recorded on that query's
//! response and never touches its siblings. That includes decoding: batch
//! entries stay raw JSON until their own pipeline picks them up.
//!
//! Results are keyed by `refId`. An entry without one is stored under
//! `#<index>`; an entry repeating an earlier `refId` is not run and gets an
//! error under `<refId>#<index>`.

mod client;
mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{CnosClient, PingResponse, SqlBackend};
pub use error::{DatasourceError, DatasourceResult};

use crate::frame::{resample, ColumnarResult, FillPolicy, Frame, Notice, ResampleError};
use crate::query::{
    parse_interval, CompiledQuery, QueryCompiler, QueryContext, QueryModel, TimeRange,
};
use chrono::Duration;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Frame name used when the query has no alias
pub const DEFAULT_FRAME_NAME: &str = "response";

/// One query of a batch; the model fields sit beside the envelope fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    #[serde(default)]
    pub ref_id: String,
    pub time_range: TimeRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<i64>,
    #[serde(flatten)]
    pub model: Map<String, Value>,
}

impl DataQuery {
    /// Decode one batch entry
    pub fn from_value(raw: Value) -> DatasourceResult<Self> {
        serde_json::from_value(raw).map_err(|e| DatasourceError::InvalidQuery(e.to_string()))
    }

    /// Compile context for this query
    pub fn context(&self) -> QueryContext {
        let ctx = QueryContext::new(self.time_range);
        match self.interval_ms {
            Some(ms) => ctx.with_interval_ms(ms),
            None => ctx,
        }
    }

    /// Decode the model part of the query
    pub fn decode_model(&self) -> DatasourceResult<QueryModel> {
        Ok(QueryModel::from_json(Value::Object(self.model.clone()))?)
    }
}

/// A batch of queries, each entry decoded on its own
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryDataRequest {
    #[serde(default)]
    pub queries: Vec<Value>,
}

/// Outcome of one query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataResponse {
    pub frames: Vec<Frame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DataResponse {
    fn frame(frame: Frame) -> Self {
        Self {
            frames: vec![frame],
            error: None,
        }
    }

    fn failed(err: &DatasourceError) -> Self {
        Self {
            frames: Vec::new(),
            error: Some(err.to_string()),
        }
    }
}

/// Outcomes of a batch keyed by ref id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryDataResponse {
    pub results: BTreeMap<String, DataResponse>,
}

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Error,
}

/// Result of a health check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: String,
    pub details: String,
}

/// Query compiler and SQL backend bundled together
pub struct Datasource {
    backend: Arc<dyn SqlBackend>,
    compiler: QueryCompiler,
}

impl Datasource {
    /// Create a datasource over a backend
    pub fn new(backend: Arc<dyn SqlBackend>) -> Self {
        Self::with_compiler(backend, QueryCompiler::new())
    }

    /// Create a datasource with a custom compiler
    pub fn with_compiler(backend: Arc<dyn SqlBackend>, compiler: QueryCompiler) -> Self {
        Self { backend, compiler }
    }

    /// The compiler queries are built with
    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    /// Compile a query without executing it
    pub fn render(&self, query: &DataQuery) -> DatasourceResult<CompiledQuery> {
        let model = query.decode_model()?;
        Ok(self.compiler.compile(&model, &query.context())?)
    }

    /// Run every query of a batch concurrently
    pub async fn query_data(&self, request: QueryDataRequest) -> QueryDataResponse {
        let slots = result_slots(&request.queries);
        let pending = request
            .queries
            .into_iter()
            .zip(slots)
            .map(|(raw, slot)| async move {
                let response = match self.run_entry(raw, slot.duplicate).await {
                    Ok(response) => response,
                    Err(err) => {
                        error!(ref_id = %slot.key, error = %err, "Query failed");
                        DataResponse::failed(&err)
                    }
                };
                (slot.key, response)
            });

        QueryDataResponse {
            results: join_all(pending).await.into_iter().collect(),
        }
    }

    async fn run_entry(&self, raw: Value, duplicate: bool) -> DatasourceResult<DataResponse> {
        if duplicate {
            let ref_id = raw_ref_id(&raw).to_string();
            return Err(DatasourceError::DuplicateRefId(ref_id));
        }
        let query = DataQuery::from_value(raw)?;
        self.query(&query).await
    }

    async fn query(&self, query: &DataQuery) -> DatasourceResult<DataResponse> {
        let model = query.decode_model()?;
        debug!(ref_id = %query.ref_id, model = ?model, "Decoded query model");

        let ctx = query.context();
        let compiled = self.compiler.compile(&model, &ctx)?;
        debug!(ref_id = %query.ref_id, sql = %compiled.sql, "Built SQL");

        let rows = self.backend.execute_sql(&compiled.sql).await?;
        let table = ColumnarResult::from_rows(&rows)?;

        let name = if compiled.alias.is_empty() {
            DEFAULT_FRAME_NAME
        } else {
            compiled.alias.as_str()
        };

        if compiled.fill.is_empty() || table.is_empty() {
            return Ok(DataResponse::frame(Frame::from_columnar(name, &table)));
        }

        let interval = parse_interval(&compiled.interval);
        if interval == Duration::zero() {
            return Ok(DataResponse::frame(Frame::from_columnar(name, &table)));
        }

        let fill = match FillPolicy::parse(&compiled.fill) {
            Ok(fill) => fill,
            Err(err) => {
                error!(fill = %compiled.fill, error = %err, "Invalid fill value");
                let mut frame = Frame::from_columnar(name, &table);
                frame.append_notice(Notice::warning("Failed to convert fill value to float"));
                return Ok(DataResponse {
                    frames: vec![frame],
                    error: Some(DatasourceError::from(err).to_string()),
                });
            }
        };

        let frame = match resample(&table, interval, &ctx.time_range, fill) {
            Ok(resampled) => Frame::from_columnar(name, &resampled),
            Err(err) => resample_failed(name, &table, &err),
        };

        Ok(DataResponse::frame(frame))
    }

    /// Ping the backend and report whether it is usable
    pub async fn check_health(&self) -> HealthCheckResult {
        match self.backend.ping().await {
            Ok(ping) if ping.is_success() => HealthCheckResult {
                status: HealthStatus::Ok,
                message: "Data source is working".to_string(),
                details: ping.body,
            },
            Ok(ping) => {
                error!(status = ping.status, "Ping CnosDB returned an error");
                HealthCheckResult {
                    status: HealthStatus::Error,
                    message: "Ping CnosDB returned an error".to_string(),
                    details: ping.body,
                }
            }
            Err(err) => {
                error!(error = %err, "Ping CnosDB failed");
                HealthCheckResult {
                    status: HealthStatus::Error,
                    message: "Ping CnosDB returned an error".to_string(),
                    details: err.to_string(),
                }
            }
        }
    }
}

/// Result key of one batch entry
struct Slot {
    key: String,
    duplicate: bool,
}

fn raw_ref_id(raw: &Value) -> &str {
    raw.get("refId").and_then(Value::as_str).unwrap_or_default()
}

/// First occurrences of a ref id keep it; every other entry gets an unused
/// `<refId>#<index>` key.
fn result_slots(queries: &[Value]) -> Vec<Slot> {
    let ids: Vec<&str> = queries.iter().map(raw_ref_id).collect();

    let mut taken = HashSet::new();
    let owners: Vec<bool> = ids
        .iter()
        .map(|id| !id.is_empty() && taken.insert(id.to_string()))
        .collect();

    ids.iter()
        .zip(owners)
        .enumerate()
        .map(|(index, (id, owner))| {
            if owner {
                return Slot {
                    key: id.to_string(),
                    duplicate: false,
                };
            }

            let mut key = format!("{}#{}", id, index);
            while taken.contains(&key) {
                key.push('#');
            }
            taken.insert(key.clone());

            if !id.is_empty() {
                warn!(ref_id = %id, key = %key, "Duplicate refId in batch");
            }
            Slot {
                key,
                duplicate: !id.is_empty(),
            }
        })
        .collect()
}

fn resample_failed(name: &str, table: &ColumnarResult, err: &ResampleError) -> Frame {
    warn!(error = %err, "Failed to resample dataframe");
    let mut frame = Frame::from_columnar(name, table);
    frame.append_notice(Notice::warning("Failed to resample dataframe"));
    frame
}
