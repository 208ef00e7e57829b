//! Configuration for the ingestion layer.
//!
//! # Environment Variables
//!
//! - `IMPORT_DIR`: directory scanned for logs (default: `data_logs`)
//! - `IMPORT_INTERVAL_SEC`: seconds between scheduled runs (default: 300)
//! - `EXCLUDE_SERVERS`: comma-separated server ids to drop (default: `9000`)
//! - `IMPORT_MODE`: `incremental` or `full` (default: incremental)
//! - `IMPORT_BATCH_SIZE`: rows per store transaction (default: 2000)
//!
//! Unusable values fall back to the default with a warning.

use crate::error::IngestionError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_IMPORT_DIR: &str = "data_logs";
pub const DEFAULT_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_BATCH_SIZE: usize = 2000;
pub const DEFAULT_EXCLUDED_SERVERS: &str = "9000";

/// How a run decides which lines to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Resume each file from its checkpoint.
    #[default]
    Incremental,

    /// Read whole files not yet marked done.
    Full,
}

impl FromStr for ImportMode {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incremental" => Ok(ImportMode::Incremental),
            "full" => Ok(ImportMode::Full),
            other => Err(IngestionError::Config(format!(
                "unknown import mode {other:?}"
            ))),
        }
    }
}

/// Server ids whose records are dropped at ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    servers: BTreeSet<i64>,
}

impl ExclusionSet {
    /// Parse a comma-separated id list. Blank and non-integer parts are ignored.
    pub fn parse(raw: &str) -> Self {
        let servers = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.parse().ok())
            .collect();
        Self { servers }
    }

    /// An empty set.
    pub fn none() -> Self {
        Self {
            servers: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn contains(&self, server: i64) -> bool {
        self.servers.contains(&server)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::parse(DEFAULT_EXCLUDED_SERVERS)
    }
}

impl FromIterator<i64> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            servers: iter.into_iter().collect(),
        }
    }
}

/// Settings for import runs and the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub import_dir: PathBuf,
    pub interval: Duration,
    pub exclude_servers: ExclusionSet,
    pub mode: ImportMode,
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            import_dir: PathBuf::from(DEFAULT_IMPORT_DIR),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            exclude_servers: ExclusionSet::default(),
            mode: ImportMode::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ImportConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("IMPORT_DIR").filter(|d| !d.trim().is_empty()) {
            config.import_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("IMPORT_INTERVAL_SEC") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.interval = Duration::from_secs(secs),
                _ => tracing::warn!("Invalid IMPORT_INTERVAL_SEC {:?}, using default", raw),
            }
        }
        if let Some(raw) = lookup("EXCLUDE_SERVERS") {
            config.exclude_servers = ExclusionSet::parse(&raw);
        }
        if let Some(raw) = lookup("IMPORT_MODE") {
            match raw.parse() {
                Ok(mode) => config.mode = mode,
                Err(e) => tracing::warn!("{}, using incremental", e),
            }
        }
        if let Some(raw) = lookup("IMPORT_BATCH_SIZE") {
            match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => config.batch_size = size,
                _ => tracing::warn!("Invalid IMPORT_BATCH_SIZE {:?}, using default", raw),
            }
        }

        config
    }

    pub fn with_import_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.import_dir = dir.into();
        self
    }

    pub fn with_mode(mut self, mode: ImportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_exclude_servers(mut self, servers: ExclusionSet) -> Self {
        self.exclude_servers = servers;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
