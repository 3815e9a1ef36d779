//! Columnar Result
//!
//! Decodes CnosDB's JSON rows (`[{"time": "...", "col": value, ...}]`) into a
//! time column plus typed, nullable value columns. Column order is the order
//! in which names are first seen; a column's type is fixed by its first
//! non-null value.

use crate::frame::error::{FrameError, FrameResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// One backend row, keys in response order
pub type Row = serde_json::Map<String, Value>;

/// Name of the reserved time column
pub const TIME_COLUMN: &str = "time";

const LAYOUT_SECOND: &str = "%Y-%m-%d %H:%M:%S";
const LAYOUT_MILLISECOND: &str = "%Y-%m-%d %H:%M:%S%.3f";
const LAYOUT_MICROSECOND: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Parse a backend time string, choosing the layout by length
///
/// - `2006-01-02 15:04:05`
/// - `2006-01-02 15:04:05.000`
/// - `2006-01-02 15:04:05.000000`
pub fn parse_time_string(value: &str) -> FrameResult<DateTime<Utc>> {
    let layout = match value.len() {
        19 => LAYOUT_SECOND,
        23 => LAYOUT_MILLISECOND,
        _ => LAYOUT_MICROSECOND,
    };

    NaiveDateTime::parse_from_str(value, layout)
        .map(|ts| ts.and_utc())
        .map_err(|source| FrameError::TimeParse {
            value: value.to_string(),
            source,
        })
}

/// Typed storage for one value column; `None` marks a missing cell
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Number(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
}

impl ColumnValues {
    /// Number of cells
    pub fn len(&self) -> usize {
        match self {
            Self::Number(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the value type, as used in serialized frames
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Bool(_) => "boolean",
        }
    }
}

/// A named value column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A query result as a time column plus value columns of equal length
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnarResult {
    /// Row timestamps; `None` for rows without a `time` cell
    pub time: Vec<Option<DateTime<Utc>>>,
    /// Value columns in first-seen order
    pub columns: Vec<Column>,
}

impl ColumnarResult {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Decode backend rows
    ///
    /// An unparseable `time` cell fails the whole result. Cells whose JSON
    /// type differs from their column's type are dropped.
    pub fn from_rows(rows: &[Row]) -> FrameResult<Self> {
        let mut time = Vec::with_capacity(rows.len());
        let mut order: Vec<(&str, Vec<Option<&Value>>)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for (i, row) in rows.iter().enumerate() {
            let mut row_time = None;

            for (name, value) in row {
                if name == TIME_COLUMN {
                    row_time = match value {
                        Value::String(s) => Some(parse_time_string(s)?),
                        Value::Null => None,
                        other => return Err(FrameError::InvalidTimeValue(other.to_string())),
                    };
                    continue;
                }

                let slot = *index.entry(name.as_str()).or_insert_with(|| {
                    order.push((name.as_str(), vec![None; rows.len()]));
                    order.len() - 1
                });
                order[slot].1[i] = Some(value);
            }

            time.push(row_time);
        }

        let columns = order
            .into_iter()
            .map(|(name, cells)| Column::new(name, type_column(name, &cells)))
            .collect();

        Ok(Self { time, columns })
    }
}

/// Build a typed column from raw cells, typed by the first scalar value
fn type_column(name: &str, cells: &[Option<&Value>]) -> ColumnValues {
    let first = cells.iter().flatten().find_map(|v| match v {
        Value::Number(_) | Value::String(_) | Value::Bool(_) => Some(*v),
        _ => None,
    });

    let mut dropped = 0usize;
    let values = match first {
        Some(Value::String(_)) => ColumnValues::Text(
            cells
                .iter()
                .map(|cell| match cell {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Null) | None => None,
                    Some(_) => {
                        dropped += 1;
                        None
                    }
                })
                .collect(),
        ),
        Some(Value::Bool(_)) => ColumnValues::Bool(
            cells
                .iter()
                .map(|cell| match cell {
                    Some(Value::Bool(b)) => Some(*b),
                    Some(Value::Null) | None => None,
                    Some(_) => {
                        dropped += 1;
                        None
                    }
                })
                .collect(),
        ),
        _ => ColumnValues::Number(
            cells
                .iter()
                .map(|cell| match cell {
                    Some(Value::Number(n)) => n.as_f64(),
                    Some(Value::Null) | None => None,
                    Some(_) => {
                        dropped += 1;
                        None
                    }
                })
                .collect(),
        ),
    };

    if dropped > 0 {
        tracing::warn!(
            column = %name,
            column_type = values.type_name(),
            dropped,
            "Dropped cells with unexpected value type"
        );
    }

    values
}
