//! Persisted timestamp of the last index update.
//!
//! The marker only bounds how much of the corpus an update rescans. Any failure
//! to read it degrades to "reindex everything", never to skipped documents.

use std::io::Write;
use std::path::{Path, PathBuf};

use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};

use crate::corpus::modified_secs;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct IndexUpdateMarker {
    path: PathBuf,
}

impl IndexUpdateMarker {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last recorded update start in whole Unix seconds, if the marker is readable.
    ///
    /// The RFC 3339 body is authoritative; a marker with an unparsable body falls
    /// back to its own modification time.
    #[must_use]
    pub fn read(&self) -> Option<i64> {
        let body = match fs_err::read_to_string(&self.path) {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(
                    target = "scrollkeep::index",
                    path = %self.path.display(),
                    error = %err,
                    "index marker unreadable"
                );
                return None;
            }
        };
        match DateTime::parse_from_rfc3339(body.trim()) {
            Ok(stamp) => Some(stamp.timestamp()),
            Err(err) => {
                tracing::warn!(
                    target = "scrollkeep::index",
                    path = %self.path.display(),
                    error = %err,
                    "index marker is not a timestamp; using its mtime"
                );
                modified_secs(&self.path).ok()
            }
        }
    }

    /// Same as [`Self::read`] but degrades to the epoch.
    #[must_use]
    pub fn read_or_epoch(&self) -> i64 {
        self.read().unwrap_or(0)
    }

    /// Record `started_at`, never moving the marker backwards.
    pub fn advance(&self, started_at: DateTime<Utc>) -> Result<i64> {
        let next = match self.read() {
            Some(previous) if previous > started_at.timestamp() => return Ok(previous),
            _ => started_at,
        };
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        let mut file = AtomicWriteFile::open(&self.path)?;
        writeln!(file, "{}", next.to_rfc3339())?;
        file.commit()?;
        Ok(next.timestamp())
    }
}
