//! Resampler
//!
//! Rebuckets a columnar result onto a fixed grid spanning the query's time
//! range and fills buckets that received no row.
//!
//! ```text
//! boundaries: from, from + step, from + 2*step, ... (<= to)
//! row at t  → bucket floor((t - from) / step), later rows overwrite earlier
//! empty     → fill policy, per column
//! ```

use crate::frame::columnar::{Column, ColumnValues, ColumnarResult};
use crate::frame::error::ResampleError;
use crate::query::{to_nanos, TimeRange};
use chrono::{Duration, TimeZone, Utc};
use std::str::FromStr;

/// Upper bound on generated buckets for a single result
pub const MAX_BUCKETS: usize = 1_000_000;

/// How to populate a bucket no row landed in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillPolicy {
    /// Carry the previous bucket's value forward
    Previous,
    /// Leave the cell missing
    Null,
    /// Use a constant (numeric columns only)
    Value(f64),
}

impl FillPolicy {
    /// Parse a fill literal: `previous`, `null`, or a number
    pub fn parse(literal: &str) -> Result<Self, ResampleError> {
        let trimmed = literal.trim();
        if trimmed.eq_ignore_ascii_case("previous") {
            Ok(Self::Previous)
        } else if trimmed.eq_ignore_ascii_case("null") {
            Ok(Self::Null)
        } else {
            trimmed
                .parse::<f64>()
                .map(Self::Value)
                .map_err(|source| ResampleError::InvalidFillValue {
                    value: literal.to_string(),
                    source,
                })
        }
    }
}

impl FromStr for FillPolicy {
    type Err = ResampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Resample `table` onto `interval`-wide buckets across `range`
///
/// The output has one row per bucket boundary in ascending order and the
/// same columns as the input. Rows outside the range or without a timestamp
/// are ignored.
pub fn resample(
    table: &ColumnarResult,
    interval: Duration,
    range: &TimeRange,
    fill: FillPolicy,
) -> Result<ColumnarResult, ResampleError> {
    let step = match interval.num_nanoseconds() {
        Some(step) if step > 0 => step,
        _ => return Err(ResampleError::InvalidInterval),
    };

    let from = range.from_nanos();
    let to = range.to_nanos();
    if to < from {
        return Err(ResampleError::InvalidTimeRange);
    }

    let span = (to as i128 - from as i128) / step as i128;
    let count = usize::try_from(span + 1)
        .ok()
        .filter(|count| *count <= MAX_BUCKETS)
        .ok_or(ResampleError::TooManyBuckets)?;

    // Row index occupying each bucket, last write wins
    let mut slots: Vec<Option<usize>> = vec![None; count];
    for (row, ts) in table.time.iter().enumerate() {
        let Some(ts) = ts else { continue };
        let t = to_nanos(*ts);
        if t < from || t > to {
            continue;
        }
        let bucket = ((t as i128 - from as i128) / step as i128) as usize;
        slots[bucket] = Some(row);
    }

    let time = (0..count)
        .map(|b| Some(Utc.timestamp_nanos(from + b as i64 * step)))
        .collect();

    let columns = table
        .columns
        .iter()
        .map(|column| {
            let values = match &column.values {
                ColumnValues::Number(src) => {
                    let constant = match fill {
                        FillPolicy::Value(v) => Some(v),
                        _ => None,
                    };
                    ColumnValues::Number(regrid(src, &slots, fill, constant))
                }
                ColumnValues::Text(src) => ColumnValues::Text(regrid(src, &slots, fill, None)),
                ColumnValues::Bool(src) => ColumnValues::Bool(regrid(src, &slots, fill, None)),
            };
            Column::new(column.name.clone(), values)
        })
        .collect();

    Ok(ColumnarResult { time, columns })
}

fn regrid<T: Clone>(
    src: &[Option<T>],
    slots: &[Option<usize>],
    fill: FillPolicy,
    constant: Option<T>,
) -> Vec<Option<T>> {
    let mut out: Vec<Option<T>> = Vec::with_capacity(slots.len());

    for slot in slots {
        let value = match slot {
            Some(row) => src.get(*row).cloned().flatten(),
            None => match fill {
                FillPolicy::Previous => out.last().cloned().flatten(),
                FillPolicy::Null => None,
                FillPolicy::Value(_) => constant.clone(),
            },
        };
        out.push(value);
    }

    out
}
