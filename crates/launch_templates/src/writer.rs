//! Idempotent writing of generated files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{TemplateError, TemplateResult};

/// A generated file: a path relative to the project directory and its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Write mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteMode {
    /// Report drift without touching the filesystem.
    pub check_only: bool,
}

impl WriteMode {
    pub fn write() -> Self {
        Self { check_only: false }
    }

    pub fn check() -> Self {
        Self { check_only: true }
    }
}

/// Result of one write attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub path: PathBuf,
    /// Proposed content differs from what is on disk.
    pub changed: bool,
    /// A change was detected but not written (check-only).
    pub skipped: bool,
}

/// Outcomes for a batch of generated files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteSummary {
    pub outcomes: Vec<WriteOutcome>,
}

impl WriteSummary {
    /// Paths that differ from the proposed content but were not written.
    pub fn drifted(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .filter(|o| o.changed && o.skipped)
            .map(|o| o.path.clone())
            .collect()
    }

    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.changed && !o.skipped).count()
    }

    /// Fail when any check-only entry reported drift.
    pub fn ensure_no_drift(self) -> TemplateResult<Self> {
        let drifted = self.drifted();
        if drifted.is_empty() {
            Ok(self)
        } else {
            Err(TemplateError::DriftDetected(drifted))
        }
    }
}

/// Writer that only touches disk when content changes.
pub struct FileWriter;

impl FileWriter {
    /// Write `content` to `base_dir/relative` when it differs byte-for-byte
    /// from the current file. In check-only mode nothing is ever written.
    pub fn write_if_changed(
        base_dir: &Path,
        relative: &Path,
        content: &str,
        mode: WriteMode,
    ) -> TemplateResult<WriteOutcome> {
        let path = base_dir.join(relative);

        let existing = match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        if existing.as_deref() == Some(content.as_bytes()) {
            debug!("Unchanged: {:?}", relative);
            return Ok(WriteOutcome {
                path: relative.to_path_buf(),
                changed: false,
                skipped: false,
            });
        }

        if mode.check_only {
            warn!(
                "Drift: {:?} {}",
                relative,
                if existing.is_some() { "differs" } else { "is missing" }
            );
            return Ok(WriteOutcome {
                path: relative.to_path_buf(),
                changed: true,
                skipped: true,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| TemplateError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, content).map_err(|source| TemplateError::Write {
            path: path.clone(),
            source,
        })?;
        info!("Wrote {:?}", relative);

        Ok(WriteOutcome {
            path: relative.to_path_buf(),
            changed: true,
            skipped: false,
        })
    }

    /// Write a batch of files with the same mode.
    pub fn write_all(
        base_dir: &Path,
        files: &[GeneratedFile],
        mode: WriteMode,
    ) -> TemplateResult<WriteSummary> {
        let mut summary = WriteSummary::default();
        for file in files {
            let outcome = Self::write_if_changed(base_dir, &file.path, &file.content, mode)?;
            summary.outcomes.push(outcome);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_identical_write_is_noop() {
        let dir = tempdir().unwrap();
        let rel = Path::new("nested/out.txt");

        let first = FileWriter::write_if_changed(dir.path(), rel, "hello\n", WriteMode::write()).unwrap();
        assert!(first.changed && !first.skipped);
        assert_eq!(fs::read_to_string(dir.path().join(rel)).unwrap(), "hello\n");

        let second = FileWriter::write_if_changed(dir.path(), rel, "hello\n", WriteMode::write()).unwrap();
        assert!(!second.changed);
        assert!(!second.skipped);
    }

    #[test]
    fn test_unchanged_file_keeps_mtime() {
        let dir = tempdir().unwrap();
        let rel = Path::new("a.txt");
        FileWriter::write_if_changed(dir.path(), rel, "same", WriteMode::write()).unwrap();
        let before = fs::metadata(dir.path().join(rel)).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        FileWriter::write_if_changed(dir.path(), rel, "same", WriteMode::write()).unwrap();
        let after = fs::metadata(dir.path().join(rel)).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }
}
