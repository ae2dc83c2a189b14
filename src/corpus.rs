//! Filesystem layout of the corpus, the artifact cache and the scratch area.
//!
//! Nothing here is cached: every call re-reads the filesystem, since the corpus
//! may be edited out-of-band at any time.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::LibraryConfig;
use crate::constants::ARTIFACT_EXTENSION;
use crate::error::Result;
use crate::parse::{DuplicateTypePolicy, parse_scroll};
use crate::types::{Scroll, ScrollId};

/// One scroll source discovered in the knowledge directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub id: ScrollId,
    pub path: PathBuf,
    /// Modification time in whole seconds since the Unix epoch.
    pub modified: i64,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    knowledge_dir: PathBuf,
    cache_dir: PathBuf,
    temp_dir: PathBuf,
    source_extension: String,
    duplicate_type: DuplicateTypePolicy,
}

impl Corpus {
    #[must_use]
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            knowledge_dir: config.knowledge_dir.clone(),
            cache_dir: config.cache_dir.clone(),
            temp_dir: config.temp_dir.clone(),
            source_extension: config.source_extension.clone(),
            duplicate_type: config.duplicate_type,
        }
    }

    #[must_use]
    pub fn knowledge_dir(&self) -> &Path {
        &self.knowledge_dir
    }

    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    #[must_use]
    pub fn source_path(&self, id: &ScrollId) -> PathBuf {
        self.knowledge_dir.join(format!("{id}.{}", self.source_extension))
    }

    #[must_use]
    pub fn artifact_path(&self, id: &ScrollId) -> PathBuf {
        self.cache_dir.join(format!("{id}.{ARTIFACT_EXTENSION}"))
    }

    /// Path of a pipeline byproduct for `id` in the scratch area.
    #[must_use]
    pub fn scratch_path(&self, id: &ScrollId, extension: &str) -> PathBuf {
        self.temp_dir.join(format!("{id}.{extension}"))
    }

    /// Raw source text. A missing file surfaces as `io::ErrorKind::NotFound`.
    pub fn read_source(&self, id: &ScrollId) -> io::Result<String> {
        fs_err::read_to_string(self.source_path(id))
    }

    pub fn load_scroll(&self, id: &ScrollId) -> Result<Scroll> {
        let source = self.read_source(id)?;
        parse_scroll(id.clone(), &source, self.duplicate_type)
    }

    /// Every scroll source in the knowledge directory, sorted by ID.
    pub fn entries(&self) -> Result<Vec<CorpusEntry>> {
        let mut entries = Vec::new();
        for dir_entry in fs_err::read_dir(&self.knowledge_dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            let file_name = dir_entry.file_name();
            let Some(id) = ScrollId::from_file_name(Path::new(&file_name), &self.source_extension)
            else {
                continue;
            };
            let metadata = match dir_entry.metadata() {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(
                        target = "scrollkeep::corpus",
                        path = %path.display(),
                        error = %err,
                        "cannot stat scroll source; treating it as modified"
                    );
                    entries.push(CorpusEntry {
                        id,
                        path,
                        modified: i64::MAX,
                    });
                    continue;
                }
            };
            let modified = metadata.modified().map_or(i64::MAX, system_time_secs);
            entries.push(CorpusEntry { id, path, modified });
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    pub fn scroll_ids(&self) -> Result<Vec<ScrollId>> {
        Ok(self.entries()?.into_iter().map(|entry| entry.id).collect())
    }

    /// Combined size of every regular file in the knowledge directory.
    pub fn total_bytes(&self) -> Result<u64> {
        let mut total = 0u64;
        for dir_entry in fs_err::read_dir(&self.knowledge_dir)? {
            let metadata = dir_entry?.metadata()?;
            if metadata.is_file() {
                total += metadata.len();
            }
        }
        Ok(total)
    }

    /// Write the composed document for `id` into the scratch area.
    pub fn write_scratch(
        &self,
        id: &ScrollId,
        extension: &str,
        contents: &str,
    ) -> io::Result<PathBuf> {
        fs_err::create_dir_all(&self.temp_dir)?;
        let path = self.scratch_path(id, extension);
        fs_err::write(&path, contents)?;
        Ok(path)
    }

    /// Remove every `<id>.<ext>` file in the scratch area. Failures are logged only.
    pub fn remove_scratch(&self, id: &ScrollId) -> usize {
        let entries = match fs_err::read_dir(&self.temp_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    target = "scrollkeep::corpus",
                    %id,
                    error = %err,
                    "cannot list scratch area"
                );
                return 0;
            }
        };
        let mut removed = 0;
        for dir_entry in entries.flatten() {
            let path = dir_entry.path();
            // Exactly `<id>.<ext>`: a dotted sibling such as `<id>.b.tex` is not ours.
            if path.extension().is_none()
                || path.file_stem().and_then(|stem| stem.to_str()) != Some(id.as_str())
            {
                continue;
            }
            match fs_err::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) => {
                    tracing::warn!(
                        target = "scrollkeep::corpus",
                        %id,
                        error = %err,
                        "cannot remove scratch file"
                    );
                }
            }
        }
        removed
    }
}

/// Modification time of `path` in whole seconds since the Unix epoch.
pub(crate) fn modified_secs(path: &Path) -> io::Result<i64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(system_time_secs(modified))
}

pub(crate) fn system_time_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
        Err(before) => -i64::try_from(before.duration().as_secs()).unwrap_or(i64::MAX),
    }
}
