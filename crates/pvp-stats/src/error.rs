//! Error types for the aggregation engine.

use thiserror::Error;

/// Errors that can occur while computing or exporting aggregates.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Error from the record store.
    #[error("store error: {0}")]
    Store(#[from] pvp_store::StoreError),

    /// CSV rendering failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Unknown metric name.
    #[error("invalid metric: {0}")]
    InvalidMetric(String),

    /// Rendered output was not valid UTF-8 or could not be flushed.
    #[error("export error: {0}")]
    Export(String),
}
