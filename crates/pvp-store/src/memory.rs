//! In-memory record store.
//!
//! `MemoryStore` keeps rows in a vector behind a lock. It backs unit and
//! integration tests, and can be told to start failing inserts after a
//! number of successful batches to exercise the pipeline's failure paths.

use crate::{error::StoreError, RecordStore};
use pvp_types::{MatchRecord, RecordFilter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// In-memory record store.
#[derive(Debug)]
pub struct MemoryStore {
    rows: RwLock<Vec<MatchRecord>>,
    /// Remaining successful batches before inserts fail; `usize::MAX` means unlimited.
    insert_budget: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store that accepts every batch.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            insert_budget: AtomicUsize::new(usize::MAX),
        }
    }

    /// Create a store pre-populated with `rows` (builder pattern).
    pub fn with_rows(self, rows: Vec<MatchRecord>) -> Self {
        Self {
            rows: RwLock::new(rows),
            ..self
        }
    }

    /// Accept `batches` more inserts, then fail every later one (builder pattern).
    pub fn failing_after(self, batches: usize) -> Self {
        self.insert_budget.store(batches, Ordering::SeqCst);
        self
    }

    /// Snapshot of all stored rows.
    pub fn rows(&self) -> Vec<MatchRecord> {
        self.rows
            .read()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    fn take_budget(&self) -> bool {
        self.insert_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |budget| match budget {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn insert_batch(&self, rows: &[MatchRecord]) -> Result<usize, StoreError> {
        if !self.take_budget() {
            return Err(StoreError::Unavailable("insert rejected".to_string()));
        }
        let mut stored = self
            .rows
            .write()
            .map_err(|_| StoreError::Unavailable("rows lock poisoned".to_string()))?;
        stored.extend_from_slice(rows);
        Ok(rows.len())
    }

    fn scan(&self, filter: &RecordFilter) -> Result<Vec<MatchRecord>, StoreError> {
        let stored = self
            .rows
            .read()
            .map_err(|_| StoreError::Unavailable("rows lock poisoned".to_string()))?;
        Ok(stored.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.rows
            .read()
            .map(|rows| rows.len())
            .map_err(|_| StoreError::Unavailable("rows lock poisoned".to_string()))
    }
}
