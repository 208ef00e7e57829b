//! API error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pvp_ingestion::IngestionError;
use pvp_stats::StatsError;
use serde::Serialize;
use thiserror::Error;

/// API errors that can be returned to clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Error from the aggregation engine.
    #[error("stats error: {0}")]
    Stats(#[from] StatsError),

    /// Error from an import run.
    #[error("import error: {0}")]
    Ingestion(#[from] IngestionError),
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            ApiError::Stats(StatsError::InvalidMetric(metric)) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                Some(format!("unknown metric {metric:?}")),
            ),
            ApiError::Stats(e) => {
                tracing::error!("Stats error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "stats_error",
                    Some(e.to_string()),
                )
            }
            ApiError::Ingestion(IngestionError::ImportInProgress) => (
                StatusCode::CONFLICT,
                "import_in_progress",
                Some("an import run is already active".to_string()),
            ),
            ApiError::Ingestion(e) => {
                tracing::error!("Import error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "import_error",
                    Some(e.to_string()),
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
