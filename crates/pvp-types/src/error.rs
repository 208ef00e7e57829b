//! Error types for pvp-types.

use thiserror::Error;

/// Errors that can occur when converting raw events into records.
#[derive(Debug, Error)]
pub enum TypeError {
    /// A mandatory field was absent or null.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field was present but could not be coerced to an integer.
    #[error("invalid value for {field}: {value}")]
    InvalidField {
        /// Wire name of the offending field.
        field: &'static str,
        /// The raw value, rendered as JSON.
        value: String,
    },
}
