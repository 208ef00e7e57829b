//! Error types for the ingestion layer.
//!
//! Per-line problems (malformed JSON, missing fields) never surface here:
//! the pipeline drops those lines and counts them. What remains are the
//! failures that abort a run or reject a trigger.

use pvp_store::StoreError;
use thiserror::Error;

/// Errors that can occur during an import run.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// A batch could not be persisted. The run stops at this point.
    #[error("failed to persist batch from {file}: {source}")]
    Persist {
        file: String,
        #[source]
        source: StoreError,
    },

    /// Another run holds the import guard.
    #[error("an import run is already in progress")]
    ImportInProgress,

    /// The blocking import task panicked or was cancelled.
    #[error("import task failed: {0}")]
    Task(String),

    /// Configuration errors (e.g., unusable env values).
    #[error("config error: {0}")]
    Config(String),
}

impl From<tokio::task::JoinError> for IngestionError {
    #[inline]
    fn from(err: tokio::task::JoinError) -> Self {
        IngestionError::Task(err.to_string())
    }
}
