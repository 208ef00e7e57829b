//! Aggregation entry point over a record store.

use crate::aggregate::{duration_rows, sort_rows, win_rate_rows, DurationRow, WinRateRow};
use crate::error::StatsError;
use crate::export::{duration_csv, win_rate_csv};
use crate::query::{Metric, StatsQuery};
use pvp_store::RecordStore;
use std::sync::Arc;

/// Computes aggregates from the current store contents.
///
/// Nothing is cached: every call reads the store again. The store does the
/// grouping; the engine merges server clusters and sorts. Calls block on
/// the store, so async callers should run them on a blocking thread.
#[derive(Clone)]
pub struct StatsEngine {
    store: Arc<dyn RecordStore>,
}

impl StatsEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Win-rate rows for `query`, sorted per its sort specification.
    pub fn win_rate(&self, query: &StatsQuery) -> Result<Vec<WinRateRow>, StatsError> {
        let tallies = self
            .store
            .win_tallies(&query.filter, query.group_by_opponent)?;
        let partials = tallies.len();
        let mut rows = win_rate_rows(tallies);
        sort_rows(&mut rows, &query.sort_keys(Metric::WinRate));
        tracing::debug!(
            "Win-rate query: {} partial groups merged into {}",
            partials,
            rows.len()
        );
        Ok(rows)
    }

    /// Duration rows for `query`, sorted per its sort specification.
    pub fn duration(&self, query: &StatsQuery) -> Result<Vec<DurationRow>, StatsError> {
        let counts = self
            .store
            .duration_counts(&query.filter, query.group_by_opponent)?;
        let partials = counts.len();
        let mut rows = duration_rows(counts);
        sort_rows(&mut rows, &query.sort_keys(Metric::Duration));
        tracing::debug!(
            "Duration query: {} partial groups merged into {}",
            partials,
            rows.len()
        );
        Ok(rows)
    }

    /// The `metric` aggregate for `query`, rendered as CSV.
    pub fn export_csv(&self, metric: Metric, query: &StatsQuery) -> Result<String, StatsError> {
        match metric {
            Metric::WinRate => win_rate_csv(&self.win_rate(query)?, query.group_by_opponent),
            Metric::Duration => duration_csv(&self.duration(query)?, query.group_by_opponent),
        }
    }
}
