//! pvp-store: Record store for persisted match rows.
//!
//! The ingestion pipeline writes [`MatchRecord`] batches into a
//! [`RecordStore`] and the aggregation engine reads them back through a
//! [`RecordFilter`]. Two implementations are provided:
//!
//! - [`SqliteStore`]: embedded SQLite database, one transaction per batch
//! - [`MemoryStore`]: in-process vector, for tests and demos
//!
//! # Example
//!
//! ```rust
//! use pvp_store::{MemoryStore, RecordStore};
//! use pvp_types::{MatchRecord, RecordFilter};
//!
//! let store = MemoryStore::new();
//! store.insert_batch(&[MatchRecord::new(8001, 1000, 50, 3, 1)]).unwrap();
//!
//! let rows = store.scan(&RecordFilter::new()).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

mod error;
mod group;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use group::{count_durations, tally_wins, DurationCounts, GroupFields, WinTally};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use pvp_types::{MatchRecord, RecordFilter};

/// Storage backend for match records.
///
/// Implementations must be shareable across threads: the ingestion run
/// writes from a blocking worker while HTTP handlers read concurrently.
///
/// ## Batches
///
/// [`insert_batch`](RecordStore::insert_batch) is all-or-nothing: on error
/// no row of the batch may be visible to later scans.
///
/// ## Grouped reads
///
/// [`win_tallies`](RecordStore::win_tallies) and
/// [`duration_counts`](RecordStore::duration_counts) return one partial
/// aggregate per raw group, in ascending [`GroupFields`] order. The default
/// implementations group the output of [`scan`](RecordStore::scan); stores
/// that can group natively should override them.
pub trait RecordStore: Send + Sync {
    /// Persist a batch of rows, returning the number written.
    fn insert_batch(&self, rows: &[MatchRecord]) -> Result<usize, StoreError>;

    /// Return every row satisfying `filter`, in insertion order.
    fn scan(&self, filter: &RecordFilter) -> Result<Vec<MatchRecord>, StoreError>;

    /// Win tallies of the rows satisfying `filter`.
    fn win_tallies(
        &self,
        filter: &RecordFilter,
        group_by_opponent: bool,
    ) -> Result<Vec<(GroupFields, WinTally)>, StoreError> {
        Ok(tally_wins(&self.scan(filter)?, group_by_opponent))
    }

    /// Duration histograms of the rows satisfying `filter`.
    fn duration_counts(
        &self,
        filter: &RecordFilter,
        group_by_opponent: bool,
    ) -> Result<Vec<(GroupFields, DurationCounts)>, StoreError> {
        Ok(count_durations(&self.scan(filter)?, group_by_opponent))
    }

    /// Total number of stored rows.
    fn count(&self) -> Result<usize, StoreError>;
}
