//! Datasource error types

use crate::frame::{FrameError, ResampleError};
use crate::query::QueryError;
use thiserror::Error;

/// Errors that can occur while serving one query
#[derive(Error, Debug)]
pub enum DatasourceError {
    /// Transport-level failure talking to CnosDB
    #[error("request to CnosDB failed: {0}")]
    Http(#[from] reqwest::Error),

    /// CnosDB answered with a non-2xx status
    #[error("CnosDB returned error status: {status}. ({code}){message}")]
    Backend {
        status: u16,
        code: String,
        message: String,
    },

    /// The response body was not the expected JSON
    #[error("failed to decode CnosDB response: {0}")]
    Decode(String),

    /// A batch entry is not a well-formed query
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A batch entry reuses a ref id already taken by an earlier entry
    #[error("duplicate refId {0:?}")]
    DuplicateRefId(String),

    /// The query model could not be compiled
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The returned rows could not be decoded
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The fill value could not be parsed
    #[error(transparent)]
    Resample(#[from] ResampleError),
}

impl From<serde_json::Error> for DatasourceError {
    fn from(err: serde_json::Error) -> Self {
        DatasourceError::Decode(err.to_string())
    }
}

/// Result type for datasource operations
pub type DatasourceResult<T> = Result<T, DatasourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = DatasourceError::Backend {
            status: 422,
            code: "010001".to_string(),
            message: "table not found: mq".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "CnosDB returned error status: 422. (010001)table not found: mq"
        );
    }

    #[test]
    fn test_query_error_is_transparent() {
        let err: DatasourceError = QueryError::UnknownRenderer("median".to_string()).into();
        assert_eq!(err.to_string(), "missing query definition for \"median\"");
    }

    #[test]
    fn test_batch_entry_error_display() {
        let err = DatasourceError::DuplicateRefId("A".to_string());
        assert_eq!(err.to_string(), "duplicate refId \"A\"");

        let err = DatasourceError::InvalidQuery("missing field `timeRange`".to_string());
        assert_eq!(err.to_string(), "invalid query: missing field `timeRange`");
    }
}
