//! Error types for the monitor binary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Missing or malformed `config.json` / token, or an invalid `--interval`.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] crazyones_core::CoreError),

    #[error(transparent)]
    Store(#[from] crazyones_store::StoreError),

    /// An acquired instance lock or the data directory could not be set up.
    #[error("fatal startup error: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
