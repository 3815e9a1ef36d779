//! Query error types
//!
//! Defines the error conditions raised while decoding, resolving and
//! compiling a query model.

use thiserror::Error;

/// Errors that can occur while compiling a query model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// A select or group-by node names a type with no registered renderer
    #[error("missing query definition for {0:?}")]
    UnknownRenderer(String),

    /// A node is missing a parameter its renderer reads
    #[error("node {kind:?} is missing parameter #{index}")]
    MissingParam {
        /// Type tag of the offending node
        kind: String,
        /// Zero-based index of the missing parameter
        index: usize,
    },

    /// The request JSON could not be decoded into a query model
    #[error("invalid query model: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Decode(err.to_string())
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::UnknownRenderer("median".to_string());
        assert_eq!(err.to_string(), "missing query definition for \"median\"");

        let err = QueryError::MissingParam {
            kind: "alias".to_string(),
            index: 0,
        };
        assert_eq!(err.to_string(), "node \"alias\" is missing parameter #0");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: QueryError = json_err.into();
        assert!(matches!(err, QueryError::Decode(_)));
    }
}
