//! pvp-api: HTTP API layer for the match statistics service.
//!
//! This crate defines the REST API endpoints:
//! - GET /api/health
//! - GET /api/stats/winrate
//! - GET /api/stats/duration
//! - GET /api/export/csv
//! - POST /api/admin/import_once
//!
//! The stats endpoints share one set of filter parameters (see
//! [`StatsParams`]); the export endpoint adds `metric`.

mod error;
mod handlers;
mod state;
mod types;

pub use error::ApiError;
pub use state::AppState;
pub use types::{
    parse_int_list, DataResponse, DurationEntry, ExportParams, HealthResponse, ImportResponse,
    StatsParams, WinRateEntry,
};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/stats/winrate", get(handlers::win_rate_stats))
        .route("/api/stats/duration", get(handlers::duration_stats))
        .route("/api/export/csv", get(handlers::export_csv))
        .route("/api/admin/import_once", post(handlers::import_once))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
