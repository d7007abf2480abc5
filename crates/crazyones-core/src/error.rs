//! Error types shared by the monitor and bot cores.

use thiserror::Error;

/// Errors produced by reconciliation, scraping, and translation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A locale page could not be fetched (timeout, DNS, non-2xx, 5xx).
    /// Retried at the next tick; never retried within the same tick.
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The releases table could not be located or its columns did not
    /// match the expected shape. The fingerprint must not be updated so
    /// the next tick retries.
    #[error("failed to parse releases table for {locale} at {url}")]
    ParseFailure { locale: String, url: String },

    /// Persistence layer error, passed through.
    #[error(transparent)]
    Store(#[from] crazyones_store::StoreError),

    /// Malformed configuration or translation data.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
