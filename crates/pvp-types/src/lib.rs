//! pvp-types: Shared data structures for the match statistics service.
//!
//! This crate defines the types shared across the workspace:
//! - [`RawEvent`] - A decoded log line with every recognized key as an explicit optional field
//! - [`MatchRecord`] - One persisted row per canonical classification of a raw event
//! - [`SourceFamily`] - The symbolic competitive contexts and their numeric codes
//! - [`RecordFilter`] - The filter set shared by the record store and the aggregation engine
//!
//! # Example
//!
//! ```rust
//! use pvp_types::{RawEvent, SourceFamily};
//!
//! let raw: RawEvent = serde_json::from_str(
//!     r#"{"server":8002,"timestamp":1000,"level":50,"class":3,"schools":1,"is_win":1}"#,
//! ).unwrap();
//!
//! let record = raw.to_record(SourceFamily::GoldLeague.win_rate_code()).unwrap();
//! assert_eq!(record.server, 8002);
//! assert_eq!(record.source_type, 1);
//! ```

mod error;
mod filter;
mod raw;
mod record;
mod source_type;

pub use error::TypeError;
pub use filter::RecordFilter;
pub use raw::{coerce_int, RawEvent};
pub use record::{MatchRecord, MAX_COMPANIONS, MAX_LEGENDARY_ITEMS};
pub use source_type::{source_type_name, SourceFamily, UNKNOWN_SOURCE_TYPE};
