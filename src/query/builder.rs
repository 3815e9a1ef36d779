//! SQL Clause Builder
//!
//! Assembles one SQL statement from a [`ResolvedQuery`]:
//!
//! ```text
//! SELECT <time>, <chains...> FROM <table> WHERE [(raw) AND] [tags AND] $timeFilter
//! [GROUP BY ...] [ORDER BY time ASC|DESC] limit <n>
//! ```
//!
//! Raw queries skip assembly and use `queryText` verbatim. Both paths then
//! substitute `$timeFilter` and `$__interval`.

use crate::query::context::QueryContext;
use crate::query::model::{ResolvedQuery, TagFilter};
use crate::query::registry::{render_chain, render_time_column, NodeKind};

/// Limit applied when the model does not set one
pub const DEFAULT_LIMIT: u32 = 1000;

/// Macro replaced by the query's time-range predicate
pub const TIME_FILTER_MACRO: &str = "$timeFilter";

/// Macro replaced by the query's bucket width
pub const INTERVAL_MACRO: &str = "$__interval";

/// Stateless SQL renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlBuilder;

impl SqlBuilder {
    /// Render the full statement for a resolved query
    pub fn build(query: &ResolvedQuery, ctx: &QueryContext) -> String {
        let mut sql = if query.raw_query && !query.query_text.is_empty() {
            query.query_text.clone()
        } else {
            let mut sql = render_selectors(query);
            sql.push_str(&render_table(query));
            sql.push_str(&render_where(query));
            sql.push_str(&render_group_by(query));
            sql.push_str(&render_order_by(query));
            sql.push_str(&render_limit(query));
            sql
        };

        sql = sql.replace(TIME_FILTER_MACRO, &render_time_filter(ctx));
        sql.replace(INTERVAL_MACRO, &query.interval)
    }
}

/// `time >= <from_ns> and time <= <to_ns>`
pub fn render_time_filter(ctx: &QueryContext) -> String {
    format!(
        "time >= {} and time <= {}",
        ctx.time_range.from_nanos(),
        ctx.time_range.to_nanos()
    )
}

fn render_selectors(query: &ResolvedQuery) -> String {
    let mut columns = Vec::with_capacity(query.select.len() + 1);

    let time = render_time_column(&query.interval);
    if query.interval.is_empty() {
        columns.push(time);
    } else {
        columns.push(format!("{} AS time", time));
    }

    columns.extend(
        query
            .select
            .iter()
            .map(|chain| render_chain(chain, &query.interval)),
    );

    format!("SELECT {}", columns.join(", "))
}

fn render_table(query: &ResolvedQuery) -> String {
    format!(" FROM {}", query.table)
}

fn render_where(query: &ResolvedQuery) -> String {
    let mut clause = String::from(" WHERE ");

    if !query.raw_tags_expr.is_empty() {
        clause.push_str(&format!("({}) AND ", query.raw_tags_expr));
    }

    if !query.tags.is_empty() {
        let conditions: Vec<String> = query
            .tags
            .iter()
            .enumerate()
            .map(|(i, tag)| render_tag_condition(tag, i))
            .collect();
        let joined = conditions.join(" ");

        if query.tags.len() > 1 {
            clause.push_str(&format!("({}) AND ", joined));
        } else {
            clause.push_str(&format!("{} AND ", joined));
        }
    }

    clause.push_str(TIME_FILTER_MACRO);
    clause
}

/// Render one tag predicate; filters after the first carry their joiner
pub fn render_tag_condition(tag: &TagFilter, index: usize) -> String {
    let mut condition = String::new();
    if index > 0 {
        let joiner = if tag.condition.is_empty() {
            "AND"
        } else {
            tag.condition.as_str()
        };
        condition.push_str(joiner);
        condition.push(' ');
    }

    let operator = if tag.operator.is_empty() {
        "="
    } else {
        tag.operator.as_str()
    };

    // Numeric comparisons take the value unquoted
    let value = if operator == "<" || operator == ">" {
        tag.value.clone()
    } else {
        quote_value(&tag.value)
    };

    condition.push_str(&format!("\"{}\" {} {}", tag.key, operator, value));
    condition
}

fn quote_value(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

fn render_group_by(query: &ResolvedQuery) -> String {
    let parts: Vec<String> = query
        .group_by
        .iter()
        .filter(|node| node.kind != NodeKind::Fill)
        .map(|node| node.render(&query.interval, ""))
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!(" GROUP BY {}", parts.join(", "))
    }
}

fn render_order_by(query: &ResolvedQuery) -> String {
    if query.order_by_time.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY time {}", query.order_by_time)
    }
}

fn render_limit(query: &ResolvedQuery) -> String {
    if query.limit.is_empty() {
        format!(" limit {}", DEFAULT_LIMIT)
    } else {
        format!(" limit {}", query.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::context::TimeRange;
    use crate::query::model::QueryModel;
    use crate::query::registry::RendererRegistry;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ctx() -> QueryContext {
        QueryContext::new(TimeRange::new(
            Utc.with_ymd_and_hms(2022, 10, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2022, 10, 17, 0, 0, 0).unwrap(),
        ))
    }

    fn build(value: serde_json::Value) -> String {
        let registry = RendererRegistry::new();
        let resolved = QueryModel::from_json(value)
            .unwrap()
            .introspect(&registry)
            .unwrap();
        SqlBuilder::build(&resolved, &ctx())
    }

    const TIME_FILTER: &str = "time >= 1665360000000000000 and time <= 1665964800000000000";

    #[test]
    fn test_end_to_end_scenario() {
        let sql = build(json!({
            "table": "mq",
            "select": [[{"type": "field", "params": ["fa"]}, {"type": "avg"}]],
            "groupBy": [
                {"type": "time", "params": ["10 minutes"]},
                {"type": "fill", "params": ["null"]}
            ],
            "orderByTime": "ASC"
        }));

        assert_eq!(
            sql,
            format!(
                "SELECT DATE_BIN(INTERVAL '10 minutes', time, TIMESTAMP '1970-01-01T00:00:00Z') AS time, \
                 avg(\"fa\") FROM mq WHERE {} \
                 GROUP BY DATE_BIN(INTERVAL '10 minutes', time, TIMESTAMP '1970-01-01T00:00:00Z') \
                 ORDER BY time ASC limit 1000",
                TIME_FILTER
            )
        );
    }

    #[test]
    fn test_alias_chain() {
        let sql = build(json!({
            "table": "ma",
            "select": [[
                {"params": ["fa"], "type": "field"},
                {"params": [], "type": "avg"},
                {"params": ["value"], "type": "alias"}
            ]],
            "groupBy": [{"params": ["10 minutes"], "type": "time"}, {"params": ["10"], "type": "fill"}]
        }));

        assert!(sql.contains(", avg(\"fa\") AS \"value\" FROM ma WHERE "));
    }

    #[test]
    fn test_plain_select() {
        let sql = build(json!({
            "table": "cpu",
            "select": [[{"type": "field", "params": ["usage"]}], [{"type": "field", "params": ["idle"]}]]
        }));

        assert_eq!(
            sql,
            format!(
                "SELECT time, \"usage\", \"idle\" FROM cpu WHERE {} limit 1000",
                TIME_FILTER
            )
        );
    }

    #[test]
    fn test_limit() {
        let default = build(json!({"table": "t", "select": [[{"type": "field", "params": ["*"]}]]}));
        assert!(default.ends_with(" limit 1000"));

        let explicit = build(json!({
            "table": "t",
            "select": [[{"type": "field", "params": ["*"]}]],
            "limit": "50"
        }));
        assert!(explicit.ends_with(" limit 50"));
    }

    #[test]
    fn test_order_by() {
        let desc = build(json!({"table": "t", "orderByTime": "DESC"}));
        assert!(desc.ends_with(" ORDER BY time DESC limit 1000"));

        let none = build(json!({"table": "t"}));
        assert!(!none.contains("ORDER BY"));
    }

    #[test]
    fn test_where_raw_tags_and_filters() {
        let sql = build(json!({
            "table": "t",
            "rawTagsExpr": "host = 'a' OR host = 'b'",
            "tags": [
                {"key": "region", "value": "us-west"},
                {"key": "load", "operator": ">", "value": "5", "condition": "OR"}
            ]
        }));

        assert!(sql.contains(&format!(
            " WHERE (host = 'a' OR host = 'b') AND (\"region\" = 'us-west' OR \"load\" > 5) AND {}",
            TIME_FILTER
        )));
    }

    #[test]
    fn test_single_tag_unparenthesized() {
        let sql = build(json!({"table": "t", "tags": [{"key": "host", "value": "a"}]}));
        assert!(sql.contains(&format!(" WHERE \"host\" = 'a' AND {}", TIME_FILTER)));
    }

    #[test]
    fn test_tag_value_escaping() {
        let tag = TagFilter::new("path", r"C:\temp");
        assert_eq!(render_tag_condition(&tag, 0), r#""path" = 'C:\\temp'"#);

        let quoted = TagFilter::new("name", "o'brien").operator("!=");
        assert_eq!(render_tag_condition(&quoted, 0), r#""name" != 'o''brien'"#);

        let lt = TagFilter::new("load", "0.5").operator("<").condition("OR");
        assert_eq!(render_tag_condition(&lt, 1), r#"OR "load" < 0.5"#);
    }

    #[test]
    fn test_group_by_tags() {
        let sql = build(json!({
            "table": "t",
            "select": [[{"type": "field", "params": ["v"]}, {"type": "max"}]],
            "groupBy": [
                {"type": "time", "params": ["1 hour"]},
                {"type": "tag", "params": ["host"]},
                {"type": "fill", "params": ["previous"]}
            ]
        }));

        assert!(sql.contains(
            " GROUP BY DATE_BIN(INTERVAL '1 hour', time, TIMESTAMP '1970-01-01T00:00:00Z'), \"host\" limit"
        ));
    }

    #[test]
    fn test_group_by_fill_only() {
        let sql = build(json!({"table": "t", "groupBy": [{"type": "fill", "params": ["0"]}]}));
        assert!(!sql.contains("GROUP BY"));
    }

    #[test]
    fn test_raw_query_macros() {
        let sql = build(json!({
            "rawQuery": true,
            "queryText": "SELECT DATE_BIN(INTERVAL '$__interval', time, TIMESTAMP '1970-01-01T00:00:00Z') AS time, avg(v) FROM t WHERE $timeFilter",
            "groupBy": [{"type": "time", "params": ["5 minutes"]}]
        }));

        assert_eq!(
            sql,
            format!(
                "SELECT DATE_BIN(INTERVAL '5 minutes', time, TIMESTAMP '1970-01-01T00:00:00Z') AS time, avg(v) FROM t WHERE {}",
                TIME_FILTER
            )
        );
    }

    #[test]
    fn test_raw_query_without_text_falls_back() {
        let sql = build(json!({"rawQuery": true, "table": "t"}));
        assert!(sql.starts_with("SELECT time FROM t WHERE "));
    }

    #[test]
    fn test_build_is_deterministic() {
        let value = json!({
            "table": "mq",
            "select": [[{"type": "field", "params": ["fa"]}, {"type": "sum"}]],
            "tags": [{"key": "a", "value": "1"}, {"key": "b", "value": "2"}],
            "groupBy": [{"type": "time", "params": ["1 minute"]}]
        });
        assert_eq!(build(value.clone()), build(value));
    }
}
