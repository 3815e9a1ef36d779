//! # CnosDB Datasource
//!
//! Backend for a visual query editor over CnosDB: turns editor query models
//! into SQL, runs them over CnosDB's HTTP API and shapes the rows into
//! frames, optionally resampled onto a fixed time grid.
//!
//! ## Modules
//!
//! - [`query`]: Renderer registry, model introspection and SQL building
//! - [`frame`]: Columnar decoding, resampling and response frames
//! - [`datasource`]: CnosDB client and the per-query pipeline
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cnosdb_datasource::query::{QueryCompiler, QueryContext, QueryModel, TimeRange};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = QueryModel::from_json(serde_json::json!({
//!         "table": "air",
//!         "select": [[{"type": "field", "params": ["temperature"]}, {"type": "avg"}]],
//!         "groupBy": [
//!             {"type": "time", "params": ["10 minutes"]},
//!             {"type": "fill", "params": ["previous"]}
//!         ]
//!     }))?;
//!
//!     let ctx = QueryContext::new(TimeRange::last(chrono::Duration::hours(6)));
//!     let compiled = QueryCompiler::new().compile(&model, &ctx)?;
//!
//!     println!("{}", compiled.sql);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod datasource;
pub mod frame;
pub mod query;

// Re-export top-level types for convenience
pub use query::{
    CompiledQuery, QueryCompiler, QueryContext, QueryError, QueryModel, RendererRegistry,
    ResolvedQuery, TimeRange,
};

pub use frame::{resample, ColumnarResult, FillPolicy, Frame, FrameError, ResampleError};

pub use datasource::{
    CnosClient, DataQuery, Datasource, DatasourceError, HealthCheckResult, QueryDataRequest,
    QueryDataResponse, SqlBackend,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{
    ApiConfig, Config, ConfigError, ConfigSource, DatasourceConfig, LoadedConfig, LoggingConfig,
};
