//! Decides whether a cached artifact must be regenerated.

use std::path::PathBuf;

use once_cell::sync::OnceCell;

use crate::config::LibraryConfig;
use crate::corpus::{Corpus, modified_secs};
use crate::types::ScrollId;

/// Compares artifact, source and template modification times in whole seconds.
///
/// The template time is computed on first use and kept for the lifetime of the
/// tracker; template edits made afterwards go unnoticed until a new tracker is
/// built.
#[derive(Debug)]
pub struct StalenessTracker {
    corpus: Corpus,
    templates: Vec<PathBuf>,
    template_time: OnceCell<i64>,
}

impl StalenessTracker {
    #[must_use]
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            corpus: Corpus::new(config),
            templates: config.template_files(),
            template_time: OnceCell::new(),
        }
    }

    /// Latest modification time across the template files.
    ///
    /// The scan stops at the first missing template.
    #[must_use]
    pub fn template_time(&self) -> i64 {
        *self.template_time.get_or_init(|| {
            let mut latest = i64::MIN;
            for path in &self.templates {
                match modified_secs(path) {
                    Ok(secs) => latest = latest.max(secs),
                    Err(_) => break,
                }
            }
            latest
        })
    }

    /// Whether the cached artifact for `id` is newer than its source and the templates.
    ///
    /// Equal timestamps count as stale.
    #[must_use]
    pub fn is_up_to_date(&self, id: &ScrollId) -> bool {
        let Ok(artifact) = modified_secs(&self.corpus.artifact_path(id)) else {
            return false;
        };
        if artifact < self.template_time() {
            return false;
        }
        let Ok(source) = modified_secs(&self.corpus.source_path(id)) else {
            return false;
        };
        artifact > source
    }
}
