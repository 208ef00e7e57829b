//! # pvp-ingestion
//!
//! Log ingestion for the match statistics service.
//!
//! Match events arrive as newline-delimited JSON in an import directory.
//! Each line goes through a fixed sequence of stages:
//!
//! 1. [`decode_line`] - strict JSON, with one bounded repair for bare
//!    source type tokens
//! 2. [`normalize`] - legacy field names mapped onto canonical ones
//! 3. exclusion - events from [`ExclusionSet`] servers are dropped
//! 4. [`resolve`] - the source type expands into one or two row codes
//!
//! The resulting [`MatchRecord`](pvp_types::MatchRecord) rows are written
//! to a [`RecordStore`](pvp_store::RecordStore) in batches by the
//! [`Importer`]. In incremental mode, the [`ImportCheckpoint`] remembers
//! how many lines of each file are already imported.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pvp_ingestion::{ImportConfig, Importer};
//! use pvp_store::SqliteStore;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteStore::open("pvp_stats.db")?);
//!     let importer = Importer::new(store, ImportConfig::from_env());
//!
//!     let report = importer.run()?;
//!     println!("Imported {} rows", report.rows_imported);
//!     Ok(())
//! }
//! ```
//!
//! ## Scheduling
//!
//! [`ImportCoordinator`] wraps an importer for use inside a tokio runtime:
//! a periodic scheduler and on-demand triggers share one guard, so at most
//! one run is active at a time.

mod checkpoint;
mod config;
mod coordinator;
mod decoder;
mod error;
mod normalizer;
mod pipeline;
mod resolver;

pub use checkpoint::{file_identity, reset, ImportCheckpoint, CHECKPOINT_FILE};
pub use config::{ExclusionSet, ImportConfig, ImportMode};
pub use coordinator::{ImportCoordinator, ScheduleHandle};
pub use decoder::decode_line;
pub use error::IngestionError;
pub use normalizer::normalize;
pub use pipeline::{count_lines, discover_files, done_marker, ImportReport, Importer};
pub use resolver::{has_valid_duration, has_valid_win, resolve};
