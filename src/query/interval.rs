//! Interval literals
//!
//! The visual editor expresses bucket widths as `"<integer> <unit>"`, e.g.
//! `"10 minutes"`. Units match by case-insensitive prefix against `second`,
//! `minute` and `hour`. Anything else parses to a zero duration, which the
//! datasource treats as "no resampling requested".

use chrono::Duration;

/// Parse an interval literal into a duration
pub fn parse_interval(literal: &str) -> Duration {
    let mut parts = literal.split(' ');
    let (Some(amount), Some(unit)) = (parts.next(), parts.next()) else {
        return Duration::zero();
    };

    let Ok(amount) = amount.parse::<i64>() else {
        return Duration::zero();
    };

    let unit = unit.to_lowercase();
    let duration = if unit.starts_with("second") {
        Duration::try_seconds(amount)
    } else if unit.starts_with("minute") {
        Duration::try_minutes(amount)
    } else if unit.starts_with("hour") {
        Duration::try_hours(amount)
    } else {
        None
    };

    // Amounts beyond the representable range count as malformed
    duration.unwrap_or_else(Duration::zero)
}

/// Render a request interval (milliseconds) as a whole-second literal
pub fn interval_from_millis(interval_ms: i64) -> String {
    let seconds = (interval_ms / 1000).max(1);
    format!("{} seconds", seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval_units() {
        assert_eq!(parse_interval("10 minute"), Duration::minutes(10));
        assert_eq!(parse_interval("10 seconds"), Duration::seconds(10));
        assert_eq!(parse_interval("10 hours"), Duration::hours(10));
        assert_eq!(parse_interval("1 Hour"), Duration::hours(1));
    }

    #[test]
    fn test_parse_interval_garbage() {
        assert_eq!(parse_interval("garbage"), Duration::zero());
        assert_eq!(parse_interval("ten minutes"), Duration::zero());
        assert_eq!(parse_interval("10 days"), Duration::zero());
        assert_eq!(parse_interval(""), Duration::zero());
    }

    #[test]
    fn test_parse_interval_out_of_range() {
        assert_eq!(parse_interval("9223372036854775807 hours"), Duration::zero());
        assert_eq!(parse_interval("9223372036854775807 seconds"), Duration::zero());
        assert_eq!(parse_interval("-9223372036854775808 minutes"), Duration::zero());
        assert_eq!(parse_interval("3000000000000 hours"), Duration::zero());
    }

    #[test]
    fn test_interval_from_millis() {
        assert_eq!(interval_from_millis(30_000), "30 seconds");
        assert_eq!(interval_from_millis(250), "1 seconds");
        assert_eq!(parse_interval(&interval_from_millis(60_000)), Duration::minutes(1));
    }
}
