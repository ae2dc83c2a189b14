//! Plain-data reports for the library and the index.

use serde::{Deserialize, Serialize};

use super::scroll::ScrollId;

/// Size of the library as exposed to presentation layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    /// Documents in the index (authoritative count).
    pub scroll_count: u64,
    /// Combined size of the files in the knowledge directory.
    pub total_bytes: u64,
}

impl LibraryStats {
    #[must_use]
    pub fn total_kib(&self) -> f64 {
        self.total_bytes as f64 / 1024.0
    }
}

/// Summary of one incremental index update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexUpdateReport {
    /// Scroll sources found in the corpus.
    pub scanned: usize,
    /// Scrolls staged and committed in this update.
    pub indexed: usize,
    /// Scrolls that could not be read or parsed, with the reason.
    pub skipped: Vec<(ScrollId, String)>,
    /// Whether every scroll was reindexed regardless of timestamps.
    pub full_reindex: bool,
}
