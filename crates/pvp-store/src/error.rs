//! Error types for record store operations.

use thiserror::Error;

/// Errors that can occur when reading or writing match records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// List column could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store cannot serve requests (poisoned lock, injected failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
