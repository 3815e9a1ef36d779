//! Request context
//!
//! The per-request values the compiler needs from the transport layer: the
//! absolute time window and the suggested interval for `auto` buckets.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An absolute time window, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the window
    pub from: DateTime<Utc>,
    /// End of the window
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Create a new time range
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// The window ending now and spanning the given duration
    pub fn last(span: Duration) -> Self {
        let to = Utc::now();
        Self { from: to - span, to }
    }

    /// Start as nanoseconds since the Unix epoch
    pub fn from_nanos(&self) -> i64 {
        to_nanos(self.from)
    }

    /// End as nanoseconds since the Unix epoch
    pub fn to_nanos(&self) -> i64 {
        to_nanos(self.to)
    }
}

/// Nanoseconds since the epoch, saturating outside the representable range
pub(crate) fn to_nanos(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt().unwrap_or(if ts.timestamp() < 0 {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Values supplied by the caller for one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    /// Absolute time window of the query
    pub time_range: TimeRange,
    /// Suggested bucket width in milliseconds, used for `auto` intervals
    pub interval_ms: Option<i64>,
}

impl QueryContext {
    /// Create a context for the given time range
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            interval_ms: None,
        }
    }

    /// Attach a suggested interval
    pub fn with_interval_ms(mut self, interval_ms: i64) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_nanos() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2022, 10, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2022, 10, 17, 0, 0, 0).unwrap(),
        );
        assert_eq!(range.from_nanos(), 1_665_360_000_000_000_000);
        assert_eq!(range.to_nanos(), 1_665_964_800_000_000_000);
    }

    #[test]
    fn test_last() {
        let range = TimeRange::last(Duration::hours(1));
        assert_eq!(range.to - range.from, Duration::hours(1));
    }

    #[test]
    fn test_time_range_serde() {
        let range: TimeRange = serde_json::from_str(
            r#"{"from": "2022-10-10T00:00:00Z", "to": "2022-10-17T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(range.from, Utc.with_ymd_and_hms(2022, 10, 10, 0, 0, 0).unwrap());
    }
}
