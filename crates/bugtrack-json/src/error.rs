//! Error types for bugtrack-json operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for bugtrack-json operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file exists but does not hold a JSON array of the expected records.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Records could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A specialized Result type for bugtrack-json operations.
pub type Result<T> = std::result::Result<T, Error>;
