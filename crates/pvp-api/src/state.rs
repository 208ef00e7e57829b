//! Application state for the API server.

use pvp_ingestion::ImportCoordinator;
use pvp_stats::StatsEngine;

/// Shared application state.
pub struct AppState {
    /// Aggregates over the record store.
    pub stats: StatsEngine,
    /// Guards on-demand import runs against the scheduler.
    pub coordinator: ImportCoordinator,
}

impl AppState {
    pub fn new(stats: StatsEngine, coordinator: ImportCoordinator) -> Self {
        Self { stats, coordinator }
    }
}
