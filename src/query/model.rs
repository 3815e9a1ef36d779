//! Query Model
//!
//! The query description produced by the visual query editor, decoded from
//! request JSON, and the resolved form the SQL builder consumes.
//!
//! # Wire format
//!
//! ```text
//! {
//!   "table": "mq",
//!   "select": [[{"type": "field", "params": ["fa"]}, {"type": "avg"}]],
//!   "tags": [{"key": "host", "operator": "=", "value": "a"}],
//!   "groupBy": [{"type": "time", "params": ["10 minutes"]}, {"type": "fill", "params": ["null"]}],
//!   "orderByTime": "ASC",
//!   "limit": "50"
//! }
//! ```

use crate::query::error::QueryResult;
use crate::query::interval::interval_from_millis;
use crate::query::registry::{NodeKind, RendererRegistry, ResolvedNode};
use serde::{Deserialize, Deserializer, Serialize};

/// One typed step of a select or group-by expression chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectNode {
    /// Type tag naming the renderer
    #[serde(rename = "type")]
    pub kind: String,
    /// Renderer arguments, order-significant
    #[serde(default)]
    pub params: Vec<String>,
}

impl SelectNode {
    /// Create a node from a type tag and parameters
    pub fn new(kind: impl Into<String>, params: &[&str]) -> Self {
        Self {
            kind: kind.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A tag condition in the WHERE clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    pub key: String,
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default = "default_condition")]
    pub condition: String,
    #[serde(default)]
    pub value: String,
}

fn default_operator() -> String {
    "=".to_string()
}

fn default_condition() -> String {
    "AND".to_string()
}

impl TagFilter {
    /// Create an `=` filter joined with `AND`
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: default_operator(),
            condition: default_condition(),
            value: value.into(),
        }
    }

    /// Set the comparison operator
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    /// Set the boolean joiner used when this filter follows another
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }
}

/// A query as authored in the visual editor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryModel {
    pub table: String,
    pub select: Vec<Vec<SelectNode>>,
    pub tags: Vec<TagFilter>,
    pub raw_tags_expr: String,
    pub group_by: Vec<SelectNode>,
    /// Bucket width, normally derived from a `time` group-by node
    pub interval: String,
    /// Fill policy, normally derived from a `fill` group-by node
    pub fill: String,
    pub order_by_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub limit: String,
    pub tz: String,
    pub raw_query: bool,
    pub query_text: String,
    pub alias: String,
}

/// Accept `"50"` and `50` alike
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}

impl QueryModel {
    /// Decode a model from request JSON
    pub fn from_json(value: serde_json::Value) -> QueryResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Resolve every node against the registry and hoist the group-by
    /// interval and fill into top-level fields.
    ///
    /// The parsed model is left untouched, so calling this more than once
    /// yields the same result.
    pub fn introspect(&self, registry: &RendererRegistry) -> QueryResult<ResolvedQuery> {
        let select = self
            .select
            .iter()
            .map(|chain| {
                chain
                    .iter()
                    .map(|node| registry.resolve(node))
                    .collect::<QueryResult<Vec<_>>>()
            })
            .collect::<QueryResult<Vec<_>>>()?;

        let mut interval = self.interval.clone();
        let mut fill = self.fill.clone();
        let mut group_by = Vec::with_capacity(self.group_by.len());

        for node in &self.group_by {
            let resolved = registry.resolve(node)?;
            match resolved.kind {
                NodeKind::Time => interval = resolved.params[0].clone(),
                NodeKind::Fill => fill = resolved.params[0].clone(),
                _ => {}
            }
            group_by.push(resolved);
        }

        // Raw SQL never goes through the resampler
        if self.raw_query {
            fill.clear();
        }

        Ok(ResolvedQuery {
            table: self.table.clone(),
            select,
            tags: self.tags.clone(),
            raw_tags_expr: self.raw_tags_expr.clone(),
            group_by,
            interval,
            fill,
            order_by_time: self.order_by_time.clone(),
            limit: self.limit.clone(),
            raw_query: self.raw_query,
            query_text: self.query_text.clone(),
            alias: self.alias.clone(),
        })
    }
}

/// A model whose nodes are bound to renderers, ready for SQL generation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub table: String,
    pub select: Vec<Vec<ResolvedNode>>,
    pub tags: Vec<TagFilter>,
    pub raw_tags_expr: String,
    pub group_by: Vec<ResolvedNode>,
    pub interval: String,
    pub fill: String,
    pub order_by_time: String,
    pub limit: String,
    pub raw_query: bool,
    pub query_text: String,
    pub alias: String,
}

impl ResolvedQuery {
    /// Replace an `auto` interval with the caller's suggested bucket width
    pub fn bind_interval(mut self, interval_ms: Option<i64>) -> Self {
        if let Some(ms) = interval_ms.filter(|ms| *ms > 0) {
            if self.interval == "auto" || self.interval == "$__interval" {
                self.interval = interval_from_millis(ms);
            }
        }
        self
    }

    /// Whether the result should be resampled onto the interval grid
    pub fn wants_fill(&self) -> bool {
        !self.fill.is_empty() && !self.fill.eq_ignore_ascii_case("none")
    }
}
