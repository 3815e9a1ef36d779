//! Frame error types
//!
//! Errors raised while decoding backend rows and resampling the result.

use thiserror::Error;

/// Errors that can occur while decoding backend rows
#[derive(Error, Debug)]
pub enum FrameError {
    /// A `time` cell matched none of the fixed layouts
    #[error("failed to parse time {value:?}: {source}")]
    TimeParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A `time` cell was not a string
    #[error("time value is not a string: {0}")]
    InvalidTimeValue(String),
}

/// Errors that can occur while resampling a result onto a time grid
#[derive(Error, Debug)]
pub enum ResampleError {
    /// The fill literal is neither a policy name nor a number
    #[error("failed to convert fill value {value:?} to float: {source}")]
    InvalidFillValue {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// The bucket width is zero or negative
    #[error("resample interval must be positive")]
    InvalidInterval,

    /// The time range ends before it starts
    #[error("invalid time range: start must not be after end")]
    InvalidTimeRange,

    /// The range holds more buckets than a single frame may carry
    #[error("too many buckets (limit {})", crate::frame::resample::MAX_BUCKETS)]
    TooManyBuckets,
}

/// Result type for frame decoding
pub type FrameResult<T> = Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ResampleError::InvalidInterval;
        assert_eq!(err.to_string(), "resample interval must be positive");

        let source = "abc".parse::<f64>().unwrap_err();
        let err = ResampleError::InvalidFillValue {
            value: "abc".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("failed to convert fill value \"abc\" to float"));
    }
}
