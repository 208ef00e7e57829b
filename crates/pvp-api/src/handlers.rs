//! Route handlers for the API endpoints.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use pvp_stats::Metric;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{
    DataResponse, DurationEntry, ExportParams, HealthResponse, ImportResponse, StatsParams,
    WinRateEntry,
};

/// GET /api/health - Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/stats/winrate - Grouped win-rate statistics.
pub async fn win_rate_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<DataResponse<WinRateEntry>>, ApiError> {
    let query = params.to_query()?;
    let engine = state.stats.clone();

    // The store blocks; keep it off the async workers.
    let rows = tokio::task::spawn_blocking(move || engine.win_rate(&query)).await??;

    Ok(Json(DataResponse {
        data: rows.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/stats/duration - Grouped match duration statistics.
pub async fn duration_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<DataResponse<DurationEntry>>, ApiError> {
    let query = params.to_query()?;
    let engine = state.stats.clone();

    let rows = tokio::task::spawn_blocking(move || engine.duration(&query)).await??;

    Ok(Json(DataResponse {
        data: rows.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/export/csv - Either aggregate as a CSV attachment.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(export): Query<ExportParams>,
    Query(params): Query<StatsParams>,
) -> Result<Response, ApiError> {
    let metric: Metric = export.metric.parse()?;
    let query = params.to_query()?;
    let engine = state.stats.clone();

    let body = tokio::task::spawn_blocking(move || engine.export_csv(metric, &query)).await??;

    let disposition = format!("attachment; filename=\"{}.csv\"", metric.as_str());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// POST /api/admin/import_once - Run one import now.
///
/// Responds 409 while another run (scheduled or manual) is active.
pub async fn import_once(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ImportResponse>, ApiError> {
    let report = state.coordinator.trigger().await?;
    tracing::info!("Manual import added {} rows", report.rows_imported);
    Ok(Json(report.into()))
}
