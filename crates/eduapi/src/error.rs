//! Error types for eduapi.
//!
//! This module defines all error types used throughout the eduapi crate.
//! Request failures keep the status and body the backend sent so call sites
//! can still react to them after the client has run its side effects.

use std::path::PathBuf;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// The main error type for eduapi operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Request Errors ===
    /// The backend answered with a non-success status.
    #[error("request to {path} failed with status {status}")]
    Status {
        /// Request path, relative to the base URL.
        path: String,
        /// Response status code.
        status: StatusCode,
        /// Response body, when the backend sent one.
        body: Option<Value>,
    },

    /// The request never produced a complete response (connect, timeout, body read).
    #[error("request to {path} failed: {source}")]
    Transport {
        /// Request path, relative to the base URL.
        path: String,
        /// Status code, if headers arrived before the failure.
        status: Option<StatusCode>,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// A URL could not be built from the configuration or a request path.
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    // === Store Errors ===
    /// Failed to open or create the session database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for eduapi operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create an invalid URL error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// The HTTP status attached to a request failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// The response body attached to a request failure, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Check if this error came from a dispatched request.
    #[must_use]
    pub fn is_request_failure(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Transport { .. })
    }

    /// Check if the backend rejected the session credential.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Check if the request timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status_error(status: StatusCode, body: Option<Value>) -> Error {
        Error::Status {
            path: "notes/".to_string(),
            status,
            body,
        }
    }

    #[test]
    fn test_status_error_display() {
        let err = status_error(StatusCode::NOT_FOUND, None);
        assert_eq!(
            err.to_string(),
            "request to notes/ failed with status 404 Not Found"
        );
    }

    #[test]
    fn test_status_accessor() {
        let err = status_error(StatusCode::FORBIDDEN, None);
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert!(Error::internal("x").status().is_none());
    }

    #[test]
    fn test_body_accessor() {
        let err = status_error(StatusCode::BAD_REQUEST, Some(json!({"detail": "bad"})));
        assert_eq!(err.body(), Some(&json!({"detail": "bad"})));
        assert!(status_error(StatusCode::BAD_REQUEST, None).body().is_none());
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(status_error(StatusCode::UNAUTHORIZED, None).is_unauthorized());
        assert!(!status_error(StatusCode::FORBIDDEN, None).is_unauthorized());
    }

    #[test]
    fn test_is_request_failure() {
        assert!(status_error(StatusCode::INTERNAL_SERVER_ERROR, None).is_request_failure());
        assert!(!Error::config_validation("bad").is_request_failure());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_invalid_url_display() {
        let err = Error::invalid_url("http//bad", "relative URL without a base");
        let msg = err.to_string();
        assert!(msg.contains("http//bad"));
        assert!(msg.contains("relative URL without a base"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("timeout_secs must be greater than 0");
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_open_error_display() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/session.db",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/path/session.db"),
                source: sqlite_err,
            };
            assert!(err.to_string().contains("/nonexistent/path/session.db"));
        }
    }
}
