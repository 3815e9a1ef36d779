//! Result Frames
//!
//! Reshapes backend rows into the columnar frames returned to the caller:
//!
//! - **Columnar**: decode JSON rows into typed, nullable columns ([`ColumnarResult`])
//! - **Resample**: rebucket onto a fixed interval grid with gap filling ([`resample`])
//! - **Frame**: the serializable response shape ([`Frame`])

mod columnar;
mod error;
mod resample;

pub use columnar::{
    parse_time_string, Column, ColumnValues, ColumnarResult, Row, TIME_COLUMN,
};
pub use error::{FrameError, FrameResult, ResampleError};
pub use resample::{resample, FillPolicy, MAX_BUCKETS};

use serde::Serialize;

/// Severity of a frame notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Warning,
}

/// A message attached to a frame for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub text: String,
}

impl Notice {
    /// Create a warning notice
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Warning,
            text: text.into(),
        }
    }
}

/// Values of one frame field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValues {
    /// Milliseconds since the Unix epoch
    Time(Vec<Option<i64>>),
    Number(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
}

/// One named field of a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub values: FieldValues,
}

/// A serializable result table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub name: String,
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}

impl Frame {
    /// Build a frame from a columnar result; the time field comes first
    pub fn from_columnar(name: impl Into<String>, result: &ColumnarResult) -> Self {
        let mut fields = Vec::with_capacity(result.columns.len() + 1);

        fields.push(Field {
            name: TIME_COLUMN.to_string(),
            kind: "time",
            values: FieldValues::Time(
                result
                    .time
                    .iter()
                    .map(|t| t.map(|t| t.timestamp_millis()))
                    .collect(),
            ),
        });

        for column in &result.columns {
            let values = match &column.values {
                ColumnValues::Number(v) => FieldValues::Number(v.clone()),
                ColumnValues::Text(v) => FieldValues::Text(v.clone()),
                ColumnValues::Bool(v) => FieldValues::Bool(v.clone()),
            };
            fields.push(Field {
                name: column.name.clone(),
                kind: column.values.type_name(),
                values,
            });
        }

        Self {
            name: name.into(),
            fields,
            notices: Vec::new(),
        }
    }

    /// Attach a notice
    pub fn append_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.fields.first().map_or(0, |f| match &f.values {
            FieldValues::Time(v) => v.len(),
            FieldValues::Number(v) => v.len(),
            FieldValues::Text(v) => v.len(),
            FieldValues::Bool(v) => v.len(),
        })
    }
}
