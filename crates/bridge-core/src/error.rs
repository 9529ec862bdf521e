//! Error types for the model catalog bridge.
//!
//! A single error enum covers the storage tier, the location service, the
//! catalog and client input. [`BridgeError::status_code`] maps every variant
//! onto the HTTP status the bridge servers answer with.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("{service} returned status {status}: {message}")]
    UpstreamStatus {
        service: String,
        status: u16,
        message: String,
    },

    // Storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Client input errors
    #[error("need a '{name}' parameter")]
    MissingParameter { name: String },

    #[error("bad key format: {key}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("error reading POST body: {message}")]
    InvalidBody { message: String },

    // Catalog errors
    #[error("parsing of import location return had an issue: {message}")]
    CatalogResponse { message: String },

    // Reconciliation
    #[error("{}", failures.join(";"))]
    Reconcile { failures: Vec<String> },
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for BridgeError {
    fn from(err: rusqlite::Error) -> Self {
        BridgeError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl BridgeError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        BridgeError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Helper to create a network error without a separate cause.
    pub fn network(message: impl Into<String>) -> Self {
        BridgeError::Network {
            message: message.into(),
            cause: None,
        }
    }

    /// Helper to create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        BridgeError::Storage {
            message: message.into(),
        }
    }

    /// Convert to the HTTP status code the bridge servers respond with.
    ///
    /// - 400: client input errors and unusable catalog import responses
    /// - upstream status: non-success answers from the location service
    /// - 500: storage, network and everything else
    pub fn status_code(&self) -> u16 {
        match self {
            BridgeError::MissingParameter { .. }
            | BridgeError::InvalidKey { .. }
            | BridgeError::InvalidBody { .. }
            | BridgeError::CatalogResponse { .. } => 400,

            BridgeError::UpstreamStatus { status, .. } if *status >= 400 => *status,
            BridgeError::UpstreamStatus { .. } => 502,

            // All other errors are internal errors
            _ => 500,
        }
    }

    /// Check if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Network { .. } => true,
            BridgeError::UpstreamStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::InvalidKey {
            key: "bogus".into(),
            reason: "expected at least two '_' separated segments".into(),
        };
        assert_eq!(
            err.to_string(),
            "bad key format: bogus: expected at least two '_' separated segments"
        );
    }

    #[test]
    fn test_reconcile_display_joins_failures() {
        let err = BridgeError::Reconcile {
            failures: vec!["ns_a: boom".into(), "ns_c: bang".into()],
        };
        assert_eq!(err.to_string(), "ns_a: boom;ns_c: bang");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            BridgeError::MissingParameter { name: "key".into() }.status_code(),
            400
        );
        assert_eq!(
            BridgeError::CatalogResponse {
                message: "no id".into()
            }
            .status_code(),
            400
        );
        assert_eq!(BridgeError::storage("down").status_code(), 500);
        assert_eq!(
            BridgeError::UpstreamStatus {
                service: "location service".into(),
                status: 503,
                message: String::new(),
            }
            .status_code(),
            503
        );
        assert_eq!(
            BridgeError::UpstreamStatus {
                service: "location service".into(),
                status: 302,
                message: String::new(),
            }
            .status_code(),
            502
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(BridgeError::network("connection refused").is_retryable());
        assert!(!BridgeError::MissingParameter { name: "key".into() }.is_retryable());
    }
}
