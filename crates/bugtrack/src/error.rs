//! Error types for bugtrack operations.
//!
//! Only transport-level and configuration problems are errors. A missing
//! record is `Ok(None)` from the storage contracts, and a mutation blocked by
//! validation is a [`crate::guard::Refusal`], not an [`Error`].

use std::io;
use thiserror::Error;

/// The error type for bugtrack operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A storage backend failed while serving a contract call.
    #[error("{context}: {source}")]
    Backend {
        /// What was being attempted (e.g., "failed to add bug").
        context: String,
        /// The backend failure.
        #[source]
        source: BackendError,
    },
}

impl Error {
    /// Wrap a backend failure with the operation it interrupted.
    pub fn backend(context: impl Into<String>, source: impl Into<BackendError>) -> Self {
        Self::Backend {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Failures raised inside a concrete storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The remote API answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The HTTP request could not be sent or its response decoded.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The relational database rejected a statement.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Reading or rewriting a JSON data file failed.
    #[error("data file error: {0}")]
    File(#[from] bugtrack_json::Error),

    /// Unexpected internal failure (poisoned lock, join error).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.bugtrack/` directory was found.
    #[error("Not a bugtrack repository (or any parent). Run 'bugtrack init' first.")]
    NotInitialized,

    /// The repository already has a `.bugtrack/` directory.
    #[error("bugtrack is already initialized. Found existing '{0}'")]
    AlreadyInitialized(String),

    /// The configuration file could not be parsed or written.
    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A configuration value is invalid.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// A specialized Result type for bugtrack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Attach an operation description to backend failures.
pub(crate) trait BackendContext<T> {
    /// Convert the error into [`Error::Backend`] with the given context.
    fn context(self, context: &str) -> Result<T>;
}

impl<T, E> BackendContext<T> for std::result::Result<T, E>
where
    E: Into<BackendError>,
{
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|e| Error::backend(context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_message_carries_context_and_status() {
        let err = Error::backend(
            "failed to add bug",
            BackendError::Http {
                status: 500,
                body: "boom".to_string(),
            },
        );
        assert_eq!(err.to_string(), "failed to add bug: server returned 500: boom");
    }

    #[test]
    fn context_helper_wraps_database_errors() {
        let result: std::result::Result<(), rusqlite::Error> =
            Err(rusqlite::Error::QueryReturnedNoRows);
        let err = result.context("failed to update category").unwrap_err();
        assert!(matches!(
            err,
            Error::Backend {
                source: BackendError::Database(_),
                ..
            }
        ));
        assert!(err.to_string().starts_with("failed to update category: "));
    }
}
