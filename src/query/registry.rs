//! Renderer Registry
//!
//! Maps the type tag of an editor node (`"field"`, `"avg"`, `"alias"`, ...) to
//! the node kind that renders it. String tags only exist at the
//! deserialization boundary: [`RendererRegistry::resolve`] turns a parsed
//! [`SelectNode`] into a [`ResolvedNode`] carrying a [`NodeKind`], and all
//! rendering dispatches on that enum.
//!
//! | type | renders as |
//! |---|---|
//! | `field`, `tag` | `"name"` or `*` |
//! | `avg` `count` `min` `max` `sum` `stddev` `variance` | `type(inner, params...)` |
//! | `time` | `time` or `DATE_BIN(INTERVAL '<interval>', time, TIMESTAMP '1970-01-01T00:00:00Z')` |
//! | `fill` | nothing |
//! | `alias` | `inner AS "name"` |

use crate::query::error::{QueryError, QueryResult};
use crate::query::model::SelectNode;
use std::collections::HashMap;

/// Aggregate functions rendered as `name(args)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    /// Average of values
    Avg,
    /// Count of values
    Count,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Sum of values
    Sum,
    /// Standard deviation
    Stddev,
    /// Variance
    Variance,
}

impl AggregateFunc {
    /// All aggregate functions, in registration order
    pub const ALL: [AggregateFunc; 7] = [
        Self::Avg,
        Self::Count,
        Self::Min,
        Self::Max,
        Self::Sum,
        Self::Stddev,
        Self::Variance,
    ];

    /// The SQL function name, identical to the editor type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
            Self::Stddev => "stddev",
            Self::Variance => "variance",
        }
    }
}

impl std::fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of node kinds the compiler knows how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Quoted column reference
    Field,
    /// Quoted tag reference, rendered like a field
    Tag,
    /// Aggregate function call wrapping the inner expression
    Function(AggregateFunc),
    /// Time column, bucketed when the query has an interval
    Time,
    /// Fill policy marker, consumed during introspection
    Fill,
    /// Output column alias
    Alias,
}

impl NodeKind {
    /// The editor type tag for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Tag => "tag",
            Self::Function(func) => func.as_str(),
            Self::Time => "time",
            Self::Fill => "fill",
            Self::Alias => "alias",
        }
    }
}

/// Declared type of a node parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Time,
}

/// One declared parameter of a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    /// Renderers index required parameters directly
    pub required: bool,
}

impl ParamSpec {
    const fn required(name: &'static str, kind: ParamType) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    const fn optional(name: &'static str, kind: ParamType) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Registry entry: the kind to render with and its parameter shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderDefinition {
    pub kind: NodeKind,
    pub params: &'static [ParamSpec],
}

impl RenderDefinition {
    /// Number of leading parameters a node must carry
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }
}

const FIELD_PARAMS: &[ParamSpec] = &[ParamSpec::required("field", ParamType::String)];
const TAG_PARAMS: &[ParamSpec] = &[ParamSpec::required("tag", ParamType::String)];
const TIME_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("interval", ParamType::Time),
    ParamSpec::optional("offset", ParamType::Time),
];
const FILL_PARAMS: &[ParamSpec] = &[ParamSpec::required("fill", ParamType::String)];
const ALIAS_PARAMS: &[ParamSpec] = &[ParamSpec::required("name", ParamType::String)];

/// Read-only table of node renderers, built once and shared by reference
#[derive(Debug, Clone)]
pub struct RendererRegistry {
    definitions: HashMap<&'static str, RenderDefinition>,
}

impl RendererRegistry {
    /// Build the registry with every supported node kind
    pub fn new() -> Self {
        let mut definitions = HashMap::new();

        let mut register = |kind: NodeKind, params: &'static [ParamSpec]| {
            definitions.insert(kind.tag(), RenderDefinition { kind, params });
        };

        register(NodeKind::Field, FIELD_PARAMS);
        for func in AggregateFunc::ALL {
            register(NodeKind::Function(func), &[]);
        }
        register(NodeKind::Time, TIME_PARAMS);
        register(NodeKind::Fill, FILL_PARAMS);
        register(NodeKind::Tag, TAG_PARAMS);
        register(NodeKind::Alias, ALIAS_PARAMS);

        Self { definitions }
    }

    /// Look up the definition registered for a type tag
    pub fn get(&self, tag: &str) -> Option<&RenderDefinition> {
        self.definitions.get(tag)
    }

    /// Number of registered type tags
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Resolve a parsed node against the registry, validating required params
    pub fn resolve(&self, node: &SelectNode) -> QueryResult<ResolvedNode> {
        let definition = self
            .get(&node.kind)
            .ok_or_else(|| QueryError::UnknownRenderer(node.kind.clone()))?;

        let required = definition.required_params();
        if node.params.len() < required {
            return Err(QueryError::MissingParam {
                kind: node.kind.clone(),
                index: node.params.len(),
            });
        }

        Ok(ResolvedNode {
            kind: definition.kind,
            params: node.params.clone(),
        })
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A node bound to its renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    pub kind: NodeKind,
    pub params: Vec<String>,
}

impl ResolvedNode {
    /// Create a resolved node directly
    pub fn new(kind: NodeKind, params: Vec<String>) -> Self {
        Self { kind, params }
    }

    /// Render this node around the text produced by the previous node in its chain
    pub fn render(&self, interval: &str, inner: &str) -> String {
        let first = self.params.first().map(String::as_str).unwrap_or_default();
        match self.kind {
            NodeKind::Field | NodeKind::Tag => render_field(first),
            NodeKind::Function(func) => {
                let mut args: Vec<&str> = Vec::with_capacity(self.params.len() + 1);
                if !inner.is_empty() {
                    args.push(inner);
                }
                args.extend(self.params.iter().map(String::as_str));
                format!("{}({})", func, args.join(", "))
            }
            NodeKind::Time => render_time_column(interval),
            NodeKind::Fill => String::new(),
            NodeKind::Alias => format!("{} AS \"{}\"", inner, first),
        }
    }
}

fn render_field(name: &str) -> String {
    if name == "*" {
        "*".to_string()
    } else {
        format!("\"{}\"", name)
    }
}

/// The time column expression: bare `time`, or a fixed-origin bucket
pub fn render_time_column(interval: &str) -> String {
    if interval.is_empty() {
        "time".to_string()
    } else {
        format!(
            "DATE_BIN(INTERVAL '{}', time, TIMESTAMP '1970-01-01T00:00:00Z')",
            interval
        )
    }
}

/// Left-fold a select chain into one output expression
pub fn render_chain(chain: &[ResolvedNode], interval: &str) -> String {
    chain
        .iter()
        .fold(String::new(), |inner, node| node.render(interval, &inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: &str, params: &[&str]) -> SelectNode {
        SelectNode::new(kind, params)
    }

    #[test]
    fn test_registry_contents() {
        let registry = RendererRegistry::new();
        assert_eq!(registry.len(), 12);
        for tag in [
            "field", "avg", "count", "min", "max", "sum", "stddev", "variance", "time", "fill",
            "tag", "alias",
        ] {
            let def = registry.get(tag).unwrap();
            assert_eq!(def.kind.tag(), tag);
        }
        assert!(registry.get("median").is_none());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = RendererRegistry::new();
        let err = registry.resolve(&node("median", &[])).unwrap_err();
        assert_eq!(err, QueryError::UnknownRenderer("median".to_string()));
    }

    #[test]
    fn test_resolve_missing_param() {
        let registry = RendererRegistry::new();
        let err = registry.resolve(&node("alias", &[])).unwrap_err();
        assert!(matches!(err, QueryError::MissingParam { index: 0, .. }));

        // Function kinds accept any parameter list
        assert!(registry.resolve(&node("avg", &[])).is_ok());
        assert!(registry.resolve(&node("time", &["10 minutes"])).is_ok());
    }

    #[test]
    fn test_field_rendering() {
        let registry = RendererRegistry::new();
        let field = registry.resolve(&node("field", &["fa"])).unwrap();
        assert_eq!(field.render("", ""), "\"fa\"");

        let star = registry.resolve(&node("field", &["*"])).unwrap();
        assert_eq!(star.render("", ""), "*");

        let tag = registry.resolve(&node("tag", &["host"])).unwrap();
        assert_eq!(tag.render("", ""), "\"host\"");
    }

    #[test]
    fn test_function_rendering() {
        let registry = RendererRegistry::new();
        let avg = registry.resolve(&node("avg", &[])).unwrap();
        assert_eq!(avg.render("", "\"fa\""), "avg(\"fa\")");

        let count = registry.resolve(&node("count", &["1"])).unwrap();
        assert_eq!(count.render("", ""), "count(1)");
        assert_eq!(count.render("", "\"fa\""), "count(\"fa\", 1)");
    }

    #[test]
    fn test_time_rendering() {
        let registry = RendererRegistry::new();
        let time = registry.resolve(&node("time", &["10 minutes"])).unwrap();
        assert_eq!(time.render("", ""), "time");
        assert_eq!(
            time.render("10 minutes", ""),
            "DATE_BIN(INTERVAL '10 minutes', time, TIMESTAMP '1970-01-01T00:00:00Z')"
        );
    }

    #[test]
    fn test_chain_rendering() {
        let registry = RendererRegistry::new();
        let chain: Vec<ResolvedNode> = [
            node("field", &["fa"]),
            node("avg", &[]),
            node("alias", &["value"]),
        ]
        .iter()
        .map(|n| registry.resolve(n).unwrap())
        .collect();

        assert_eq!(render_chain(&chain, ""), "avg(\"fa\") AS \"value\"");
    }

    #[test]
    fn test_fill_renders_nothing() {
        let registry = RendererRegistry::new();
        let fill = registry.resolve(&node("fill", &["null"])).unwrap();
        assert_eq!(fill.render("1 minute", "anything"), "");
    }
}
