//! Error types for the persistence layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing CrazyOnes state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create directory {path:?}: {source}")]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, StoreError>;
