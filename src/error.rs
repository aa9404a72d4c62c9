//! Error types for index building and search

use crate::store::RecordId;
use thiserror::Error;

/// Failures that make a search or index build impossible to execute.
///
/// "Nothing matched" is never an error: an empty query or a query without
/// hits yields empty results instead.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Index not built: call create_index before searching")]
    IndexNotBuilt,
    #[error("Record not found: {0}")]
    NotFound(RecordId),
    #[error("Invalid records: {0}")]
    InvalidRecords(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Index snapshot error: {0}")]
    Snapshot(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Stable machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            SearchError::IndexNotBuilt => "index_not_built",
            SearchError::NotFound(_) => "not_found",
            SearchError::InvalidRecords(_) => "invalid_records",
            SearchError::InvalidConfig(_) => "invalid_config",
            SearchError::Snapshot(_) => "snapshot_error",
            SearchError::Io(_) => "io_error",
            SearchError::Json(_) => "json_error",
            SearchError::Internal(_) => "internal_error",
        }
    }

    /// Process exit code used by the CLI host
    pub fn exit_code(&self) -> i32 {
        match self {
            SearchError::InvalidRecords(_) | SearchError::InvalidConfig(_) => 1,
            SearchError::IndexNotBuilt | SearchError::NotFound(_) => 3,
            _ => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_error_display() {
        let error = SearchError::IndexNotBuilt;
        assert_eq!(
            error.to_string(),
            "Index not built: call create_index before searching"
        );

        let error = SearchError::NotFound(42);
        assert_eq!(error.to_string(), "Record not found: 42");

        let error = SearchError::InvalidRecords("duplicate id 7".to_string());
        assert_eq!(error.to_string(), "Invalid records: duplicate id 7");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(SearchError::IndexNotBuilt.error_code(), "index_not_built");
        assert_eq!(SearchError::NotFound(1).error_code(), "not_found");
        assert_eq!(
            SearchError::Snapshot("bad".to_string()).error_code(),
            "snapshot_error"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(SearchError::InvalidConfig("x".to_string()).exit_code(), 1);
        assert_eq!(SearchError::IndexNotBuilt.exit_code(), 3);
        assert_eq!(SearchError::Internal("x".to_string()).exit_code(), 5);
    }

    #[test]
    fn test_from_conversions() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: SearchError = io.into();
        assert!(matches!(error, SearchError::Io(_)));

        let json = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: SearchError = json.into();
        assert!(matches!(error, SearchError::Json(_)));
    }
}
