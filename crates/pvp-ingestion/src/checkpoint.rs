//! Per-file import positions.
//!
//! The checkpoint maps a stable file identity to the number of lines
//! already consumed from that file. It lives next to the logs in
//! `<dir>/.import_positions.json` and is rewritten atomically (temp file
//! plus rename) after every completed file.
//!
//! Identities hash the absolute path only, so a file rewritten in place
//! keeps its checkpoint. A file that shrinks below its checkpoint is
//! skipped until it grows past it again.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Checkpoint file name inside the import directory.
pub const CHECKPOINT_FILE: &str = ".import_positions.json";

/// Consumed line counts keyed by file identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportCheckpoint {
    positions: BTreeMap<String, u64>,
}

impl ImportCheckpoint {
    /// Load the checkpoint for `dir`.
    ///
    /// A missing file yields an empty checkpoint. So does a corrupt one,
    /// which is logged; every file is then re-imported from the start.
    pub fn load(dir: &Path) -> Self {
        let path = checkpoint_path(dir);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("Cannot read checkpoint {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                tracing::warn!("Ignoring corrupt checkpoint {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Persist the checkpoint for `dir`.
    ///
    /// Failures are logged and swallowed: the next run re-processes lines
    /// past the last persisted position.
    pub fn save(&self, dir: &Path) {
        if let Err(e) = self.write_atomic(dir) {
            tracing::warn!(
                "Failed to persist checkpoint in {}: {}",
                dir.display(),
                e
            );
        }
    }

    fn write_atomic(&self, dir: &Path) -> io::Result<()> {
        let path = checkpoint_path(dir);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)
    }

    /// Lines already consumed from `path`, 0 if unknown.
    pub fn position(&self, path: &Path) -> u64 {
        self.positions
            .get(&file_identity(path))
            .copied()
            .unwrap_or(0)
    }

    /// Record that `lines` lines of `path` have been consumed.
    pub fn set_position(&mut self, path: &Path, lines: u64) {
        self.positions.insert(file_identity(path), lines);
    }

    /// Forget the position of `path`. Returns whether it was known.
    pub fn remove(&mut self, path: &Path) -> bool {
        self.positions.remove(&file_identity(path)).is_some()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

/// Stable identity of a file: SHA-256 hex of its absolute path.
///
/// `.` and `..` components are folded lexically first, so every spelling
/// of a path maps to the same identity. Independent of the file's content.
pub fn file_identity(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_absolute(path).to_string_lossy().as_bytes());
    hex::encode(hasher.finalize())
}

fn normalized_absolute(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            // at the root this is a no-op
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Clear checkpoint entries under `dir`.
///
/// With a pattern, only files below `dir` whose file name contains it are
/// reset; otherwise every entry is dropped. Returns the number of entries
/// removed.
pub fn reset(dir: &Path, pattern: Option<&str>) -> usize {
    let mut checkpoint = ImportCheckpoint::load(dir);
    let removed = match pattern {
        None => {
            let count = checkpoint.len();
            checkpoint.clear();
            tracing::info!("Reset all {} import positions in {}", count, dir.display());
            count
        }
        Some(pattern) => {
            let mut count = 0;
            for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
                if !entry.file_type().is_file()
                    || !entry.file_name().to_string_lossy().contains(pattern)
                {
                    continue;
                }
                if checkpoint.remove(entry.path()) {
                    tracing::info!("Reset import position of {}", entry.path().display());
                    count += 1;
                }
            }
            count
        }
    };
    checkpoint.save(dir);
    removed
}

fn checkpoint_path(dir: &Path) -> PathBuf {
    dir.join(CHECKPOINT_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImportCheckpoint::load(dir.path()).is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CHECKPOINT_FILE), "{not json").unwrap();
        assert!(ImportCheckpoint::load(dir.path()).is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("a.jsonl");

        let mut checkpoint = ImportCheckpoint::default();
        checkpoint.set_position(&log, 150);
        checkpoint.save(dir.path());

        let loaded = ImportCheckpoint::load(dir.path());
        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.position(&log), 150);
        assert_eq!(loaded.position(&dir.path().join("b.jsonl")), 0);
        assert!(!dir.path().join(".import_positions.json.tmp").exists());
    }

    #[test]
    fn test_identity_ignores_content() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("a.jsonl");
        fs::write(&log, "one\n").unwrap();
        let before = file_identity(&log);
        fs::write(&log, "two\nthree\n").unwrap();
        assert_eq!(file_identity(&log), before);
        assert_eq!(before.len(), 64);
        assert_ne!(file_identity(&dir.path().join("b.jsonl")), before);
    }

    #[test]
    fn test_reset_with_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("2025_11_12.txt");
        let drop = dir.path().join("2025_11_13.txt");
        fs::write(&keep, "").unwrap();
        fs::write(&drop, "").unwrap();

        let mut checkpoint = ImportCheckpoint::default();
        checkpoint.set_position(&keep, 10);
        checkpoint.set_position(&drop, 20);
        checkpoint.save(dir.path());

        assert_eq!(reset(dir.path(), Some("11_13")), 1);
        let loaded = ImportCheckpoint::load(dir.path());
        assert_eq!(loaded.position(&keep), 10);
        assert_eq!(loaded.position(&drop), 0);
    }

    #[test]
    fn test_identity_folds_dot_components() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let log = dir.path().join("a.jsonl");
        assert_eq!(file_identity(&dir.path().join("sub/../a.jsonl")), file_identity(&log));
        assert_eq!(file_identity(&dir.path().join("./sub/./../a.jsonl")), file_identity(&log));
        assert_eq!(
            normalized_absolute(Path::new("/../logs/a.jsonl")),
            PathBuf::from("/logs/a.jsonl")
        );
    }

    #[test]
    fn test_reset_through_parent_dir_spelling() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let log = dir.path().join("2025_11_13.txt");
        fs::write(&log, "").unwrap();

        let mut checkpoint = ImportCheckpoint::default();
        checkpoint.set_position(&log, 20);
        checkpoint.save(dir.path());

        assert_eq!(reset(&dir.path().join("sub/.."), Some("11_13")), 1);
        assert!(ImportCheckpoint::load(dir.path()).is_empty());
    }

    #[test]
    fn test_reset_all() {
        let dir = tempfile::tempdir().unwrap();
        let mut checkpoint = ImportCheckpoint::default();
        checkpoint.set_position(&dir.path().join("a.txt"), 1);
        checkpoint.set_position(&dir.path().join("b.txt"), 2);
        checkpoint.save(dir.path());

        assert_eq!(reset(dir.path(), None), 2);
        assert!(ImportCheckpoint::load(dir.path()).is_empty());
    }
}
