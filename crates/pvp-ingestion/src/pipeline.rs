//! Import runs.
//!
//! An [`Importer`] walks the import directory and feeds every line through
//! decode → normalize → exclusion → resolve, writing the resulting rows to
//! the [`RecordStore`] in bounded batches.
//!
//! # Modes
//!
//! - **Full**: every `.jsonl`/`.txt` file without a `<path>.done` marker is
//!   read from the start; the marker is written once the file is imported.
//! - **Incremental**: each file resumes after the line count stored in the
//!   [`ImportCheckpoint`]. Only lines present when the file was counted are
//!   read, so lines appended mid-run are left for the next run.
//!
//! # Failures
//!
//! Bad lines are dropped and counted. A file that cannot be opened is
//! skipped for this run. A failed batch write aborts the run; in
//! incremental mode the checkpoint is first moved to the last line covered
//! by a successful write.

use crate::checkpoint::ImportCheckpoint;
use crate::config::{ImportConfig, ImportMode};
use crate::decoder::decode_line;
use crate::error::IngestionError;
use crate::normalizer::normalize;
use crate::resolver::resolve;
use chrono::{DateTime, Utc};
use pvp_store::{RecordStore, StoreError};
use pvp_types::MatchRecord;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Extensions picked up by discovery.
const LOG_EXTENSIONS: [&str; 2] = ["jsonl", "txt"];

/// Summary of one import run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub mode: ImportMode,
    pub started_at: DateTime<Utc>,
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub lines_read: u64,
    /// Lines that were malformed or missing mandatory fields.
    pub records_dropped: u64,
    /// Records from an excluded server.
    pub records_excluded: u64,
    pub rows_imported: u64,
    pub elapsed_ms: u64,
}

impl ImportReport {
    fn new(mode: ImportMode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            files_discovered: 0,
            files_processed: 0,
            files_skipped: 0,
            lines_read: 0,
            records_dropped: 0,
            records_excluded: 0,
            rows_imported: 0,
            elapsed_ms: 0,
        }
    }

    fn absorb(&mut self, progress: &FileProgress) {
        self.lines_read += progress.lines_read;
        self.records_dropped += progress.dropped;
        self.records_excluded += progress.excluded;
        self.rows_imported += progress.rows;
    }
}

/// Counters for a single file.
#[derive(Debug, Default)]
struct FileProgress {
    lines_read: u64,
    dropped: u64,
    excluded: u64,
    rows: u64,
    /// Absolute line count covered by successful writes.
    consumed: u64,
}

enum FileError {
    Open(io::Error),
    Persist {
        progress: FileProgress,
        source: StoreError,
    },
}

/// Rows awaiting a write. Full once it holds `capacity` rows.
struct RowBatch {
    rows: Vec<MatchRecord>,
    capacity: usize,
}

impl RowBatch {
    fn new(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity.min(4096)),
            capacity: capacity.max(1),
        }
    }

    fn extend(&mut self, rows: Vec<MatchRecord>) {
        self.rows.extend(rows);
    }

    fn is_full(&self) -> bool {
        self.rows.len() >= self.capacity
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What happened to one line.
enum LineOutcome {
    Rows(Vec<MatchRecord>),
    Blank,
    Dropped,
    Excluded,
}

/// Drives import runs against a record store.
pub struct Importer {
    store: Arc<dyn RecordStore>,
    config: ImportConfig,
}

impl Importer {
    pub fn new(store: Arc<dyn RecordStore>, config: ImportConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Run one import in the configured mode.
    pub fn run(&self) -> Result<ImportReport, IngestionError> {
        self.run_mode(self.config.mode)
    }

    /// Run one import in `mode`, regardless of the configured one.
    pub fn run_mode(&self, mode: ImportMode) -> Result<ImportReport, IngestionError> {
        let started = Instant::now();
        let mut report = match mode {
            ImportMode::Full => self.full_scan()?,
            ImportMode::Incremental => self.incremental_scan()?,
        };
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Import run ({:?}) finished: {} rows from {}/{} files, {} dropped, {} excluded in {}ms",
            mode,
            report.rows_imported,
            report.files_processed,
            report.files_discovered,
            report.records_dropped,
            report.records_excluded,
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Import every file without a done marker from its first line.
    pub fn full_scan(&self) -> Result<ImportReport, IngestionError> {
        let dir = &self.config.import_dir;
        let mut report = ImportReport::new(ImportMode::Full);
        let files = discover_files(dir);
        report.files_discovered = files.len();

        for path in files {
            let marker = done_marker(&path);
            if marker.exists() {
                tracing::debug!("Skipping {} (already imported)", path.display());
                report.files_skipped += 1;
                continue;
            }

            match self.import_file(&path, 0, None) {
                Ok(progress) => {
                    report.absorb(&progress);
                    report.files_processed += 1;
                    tracing::info!("Imported {} rows from {}", progress.rows, path.display());
                    if let Err(e) = fs::write(&marker, "ok") {
                        tracing::warn!("Failed to write done marker {}: {}", marker.display(), e);
                    }
                }
                Err(FileError::Open(e)) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.files_skipped += 1;
                }
                Err(FileError::Persist { progress, source }) => {
                    report.absorb(&progress);
                    return Err(persist_error(&path, source, &report));
                }
            }
        }

        Ok(report)
    }

    /// Import the lines appended to each file since its checkpoint.
    pub fn incremental_scan(&self) -> Result<ImportReport, IngestionError> {
        let dir = &self.config.import_dir;
        let mut report = ImportReport::new(ImportMode::Incremental);
        let files = discover_files(dir);
        report.files_discovered = files.len();
        let mut checkpoint = ImportCheckpoint::load(dir);

        for path in files {
            let consumed = checkpoint.position(&path);
            let total = match count_lines(&path) {
                Ok(total) => total,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.files_skipped += 1;
                    continue;
                }
            };
            if total <= consumed {
                tracing::debug!(
                    "Skipping {} (no new lines: {} <= {})",
                    path.display(),
                    total,
                    consumed
                );
                report.files_skipped += 1;
                continue;
            }

            tracing::info!(
                "Importing {} (lines {} to {})",
                path.display(),
                consumed + 1,
                total
            );
            match self.import_file(&path, consumed, Some(total)) {
                Ok(progress) => {
                    report.absorb(&progress);
                    report.files_processed += 1;
                    checkpoint.set_position(&path, progress.consumed);
                    checkpoint.save(dir);
                    tracing::info!(
                        "Imported {} rows from {}, position now {}",
                        progress.rows,
                        path.display(),
                        progress.consumed
                    );
                }
                Err(FileError::Open(e)) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.files_skipped += 1;
                }
                Err(FileError::Persist { progress, source }) => {
                    report.absorb(&progress);
                    checkpoint.set_position(&path, progress.consumed);
                    checkpoint.save(dir);
                    return Err(persist_error(&path, source, &report));
                }
            }
        }

        Ok(report)
    }

    /// Read `path` after its first `skip` lines, up to line `limit` if given.
    fn import_file(
        &self,
        path: &Path,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<FileProgress, FileError> {
        let file = File::open(path).map_err(FileError::Open)?;
        let reader = BufReader::new(file);

        let mut progress = FileProgress {
            consumed: skip,
            ..Default::default()
        };
        let mut batch = RowBatch::new(self.config.batch_size);
        let mut line_no = skip;

        for chunk in reader.split(b'\n').skip(skip as usize) {
            if limit.is_some_and(|limit| line_no >= limit) {
                break;
            }
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(
                        "Read error in {} after line {}: {}",
                        path.display(),
                        line_no,
                        e
                    );
                    break;
                }
            };
            line_no += 1;
            progress.lines_read += 1;

            match self.process_line(&String::from_utf8_lossy(&bytes)) {
                LineOutcome::Rows(rows) => batch.extend(rows),
                LineOutcome::Blank => {}
                LineOutcome::Dropped => progress.dropped += 1,
                LineOutcome::Excluded => progress.excluded += 1,
            }

            // Checked per event so the rows of one event share a write.
            if batch.is_full() {
                self.flush(&mut batch, &mut progress, line_no)?;
            }
        }

        self.flush(&mut batch, &mut progress, line_no)?;
        Ok(progress)
    }

    fn process_line(&self, line: &str) -> LineOutcome {
        if line.trim().is_empty() {
            return LineOutcome::Blank;
        }
        let Some(event) = decode_line(line) else {
            return LineOutcome::Dropped;
        };
        let event = normalize(event);

        match event.server_id() {
            None => return LineOutcome::Dropped,
            Some(server) if self.config.exclude_servers.contains(server) => {
                return LineOutcome::Excluded
            }
            Some(_) => {}
        }

        let rows: Result<Vec<_>, _> = resolve(&event)
            .into_iter()
            .map(|code| event.to_record(code))
            .collect();
        match rows {
            Ok(rows) => LineOutcome::Rows(rows),
            Err(e) => {
                tracing::trace!("Dropping record: {}", e);
                LineOutcome::Dropped
            }
        }
    }

    fn flush(
        &self,
        batch: &mut RowBatch,
        progress: &mut FileProgress,
        line_no: u64,
    ) -> Result<(), FileError> {
        if !batch.is_empty() {
            match self.store.insert_batch(&batch.rows) {
                Ok(written) => {
                    tracing::debug!("Flushed {} rows (through line {})", written, line_no);
                    progress.rows += written as u64;
                    batch.rows.clear();
                }
                Err(source) => {
                    return Err(FileError::Persist {
                        progress: std::mem::take(progress),
                        source,
                    })
                }
            }
        }
        progress.consumed = line_no;
        Ok(())
    }
}

fn persist_error(path: &Path, source: StoreError, report: &ImportReport) -> IngestionError {
    tracing::error!(
        "Import aborted at {} after {} rows: {}",
        path.display(),
        report.rows_imported,
        source
    );
    IngestionError::Persist {
        file: path.display().to_string(),
        source,
    }
}

/// Log files below `dir`, in sorted path order.
///
/// Symlinked directories are not descended into. Any other symlink is
/// listed, even a dangling one, and fails later as an unreadable file. A
/// missing directory yields no files.
pub fn discover_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        tracing::warn!("Import directory {} does not exist", dir.display());
        return Vec::new();
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Cannot read directory entry: {}", e);
                None
            }
        })
        .filter(|entry| {
            let file_type = entry.file_type();
            file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir())
        })
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| LOG_EXTENSIONS.contains(&ext))
        })
        .collect()
}

/// Sidecar marker written after a full import of `path`.
pub fn done_marker(path: &Path) -> PathBuf {
    let mut marker = path.as_os_str().to_owned();
    marker.push(".done");
    PathBuf::from(marker)
}

/// Number of lines in `path`; a trailing line without newline counts.
pub fn count_lines(path: &Path) -> io::Result<u64> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for chunk in reader.split(b'\n') {
        chunk?;
        count += 1;
    }
    Ok(count)
}
