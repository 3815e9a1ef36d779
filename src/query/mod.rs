//! Query Model Compiler
//!
//! Turns the visual editor's query description into one SQL statement for
//! CnosDB:
//!
//! - **Model**: the decoded request ([`QueryModel`]) and its resolved form
//! - **Registry**: type tag to node-kind table ([`RendererRegistry`])
//! - **Builder**: clause assembly and macro substitution ([`SqlBuilder`])
//! - **Interval**: interval literal parsing ([`parse_interval`])
//!
//! # Example
//!
//! ```rust,ignore
//! use cnosdb_datasource::query::{QueryCompiler, QueryContext, QueryModel, TimeRange};
//!
//! let compiler = QueryCompiler::new();
//! let model = QueryModel::from_json(serde_json::json!({
//!     "table": "mq",
//!     "select": [[{"type": "field", "params": ["fa"]}, {"type": "avg"}]],
//!     "groupBy": [{"type": "time", "params": ["10 minutes"]}]
//! }))?;
//! let compiled = compiler.compile(&model, &QueryContext::new(TimeRange::last(chrono::Duration::hours(6))))?;
//! println!("{}", compiled.sql);
//! ```

mod builder;
mod context;
mod error;
mod interval;
mod model;
mod registry;

pub use builder::{
    render_tag_condition, render_time_filter, SqlBuilder, DEFAULT_LIMIT, INTERVAL_MACRO,
    TIME_FILTER_MACRO,
};
pub use context::{QueryContext, TimeRange};
pub(crate) use context::to_nanos;
pub use error::{QueryError, QueryResult};
pub use interval::{interval_from_millis, parse_interval};
pub use model::{QueryModel, ResolvedQuery, SelectNode, TagFilter};
pub use registry::{
    render_chain, render_time_column, AggregateFunc, NodeKind, ParamSpec, ParamType,
    RenderDefinition, RendererRegistry, ResolvedNode,
};

/// Output of compiling one query
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Statement to send to the backend
    pub sql: String,
    /// Bucket width literal, empty when the query is not bucketed
    pub interval: String,
    /// Fill policy literal, empty when no resampling is requested
    pub fill: String,
    /// Display name requested for the result frame
    pub alias: String,
}

/// Owns the renderer registry and compiles models against it
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    registry: RendererRegistry,
}

impl QueryCompiler {
    /// Create a compiler with the standard registry
    pub fn new() -> Self {
        Self::with_registry(RendererRegistry::new())
    }

    /// Create a compiler around an existing registry
    pub fn with_registry(registry: RendererRegistry) -> Self {
        Self { registry }
    }

    /// The registry nodes are resolved against
    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    /// Resolve a model against the registry
    pub fn introspect(&self, model: &QueryModel) -> QueryResult<ResolvedQuery> {
        model.introspect(&self.registry)
    }

    /// Introspect and build in one step
    pub fn compile(&self, model: &QueryModel, ctx: &QueryContext) -> QueryResult<CompiledQuery> {
        let resolved = self.introspect(model)?.bind_interval(ctx.interval_ms);
        let sql = SqlBuilder::build(&resolved, ctx);

        let fill = if resolved.wants_fill() {
            resolved.fill
        } else {
            String::new()
        };

        Ok(CompiledQuery {
            sql,
            interval: resolved.interval,
            fill,
            alias: resolved.alias,
        })
    }
}
