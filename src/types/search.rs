//! Search hits and the reconciled result handed to presentation layers.

use serde::{Deserialize, Serialize};

use super::render::RenderReport;
use super::scroll::{Scroll, ScrollId};

/// Raw engine answer: hit IDs in relevance order plus the engine's total.
///
/// `total` counts every match, so it can exceed `ids.len()` when the result
/// count is capped, and it can overcount once sources have been deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHits {
    /// Translated query actually handed to the engine.
    pub query: String,
    pub ids: Vec<ScrollId>,
    pub total: usize,
}

/// Scrolls matching a query after reconciliation against the live corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindResult {
    /// Surviving scrolls in relevance order.
    pub scrolls: Vec<Scroll>,
    /// Number of hits whose source still exists.
    pub total: usize,
    /// Render pass over the hits; a non-empty `errors` list means a partial failure.
    pub render: RenderReport,
}

impl FindResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scrolls.is_empty()
    }
}
