//! pvp-stats: Grouped match statistics.
//!
//! This crate provides the [`StatsEngine`], which reads match records from a
//! [`RecordStore`](pvp_store::RecordStore) and computes two aggregates:
//!
//! - **Win rate**: wins, losses, matches and win rate per group
//! - **Duration**: average, maximum, minimum and discrete median duration
//!
//! Groups are keyed by canonical server (see [`canonical_server`]), own
//! class, own school and source type, optionally broken down by opponent
//! class and school.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pvp_stats::{StatsEngine, StatsQuery};
//! use pvp_store::{MemoryStore, RecordStore};
//! use pvp_types::{MatchRecord, RecordFilter};
//!
//! let store = Arc::new(MemoryStore::new());
//! let mut record = MatchRecord::new(8002, 1000, 50, 3, 1);
//! record.source_type = 1;
//! record.is_win = 1;
//! store.insert_batch(&[record]).unwrap();
//!
//! let engine = StatsEngine::new(store);
//! let rows = engine
//!     .win_rate(&StatsQuery::new(RecordFilter::new()).sorted_by("win_rate:desc"))
//!     .unwrap();
//!
//! // 8002 is reported under its cluster representative
//! assert_eq!(rows[0].server, 8001);
//! assert_eq!(rows[0].win_rate, Some(1.0));
//! ```

mod aggregate;
mod engine;
mod error;
mod export;
mod query;
mod server;

pub use aggregate::{
    aggregate_duration, aggregate_win_rate, discrete_median, duration_rows, sort_rows, win_rate,
    win_rate_rows, DurationRow, Sortable, WinRateRow,
};
pub use engine::StatsEngine;
pub use error::StatsError;
pub use export::{duration_csv, win_rate_csv};
pub use query::{parse_sort, Metric, SortColumn, SortKey, StatsQuery};
pub use server::canonical_server;
