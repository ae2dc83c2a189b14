//! Outcomes of the render pipeline and batch render reports.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scroll::ScrollId;

/// Per-document render failure. Never aborts sibling documents in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RenderError {
    /// The index references a scroll whose source file is gone.
    #[error("scroll {id} no longer exists")]
    NotFound { id: ScrollId },

    #[error("composing scroll {id} failed: {reason}")]
    ComposeFailed { id: ScrollId, reason: String },

    #[error("compiling scroll {id} failed: {output}")]
    CompileFailed { id: ScrollId, output: String },

    #[error("rasterizing scroll {id} failed: {output}")]
    RasterizeFailed { id: ScrollId, output: String },
}

/// Field-less discriminant of [`RenderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderErrorKind {
    NotFound,
    ComposeFailed,
    CompileFailed,
    RasterizeFailed,
}

impl RenderError {
    #[must_use]
    pub fn id(&self) -> &ScrollId {
        match self {
            Self::NotFound { id }
            | Self::ComposeFailed { id, .. }
            | Self::CompileFailed { id, .. }
            | Self::RasterizeFailed { id, .. } => id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> RenderErrorKind {
        match self {
            Self::NotFound { .. } => RenderErrorKind::NotFound,
            Self::ComposeFailed { .. } => RenderErrorKind::ComposeFailed,
            Self::CompileFailed { .. } => RenderErrorKind::CompileFailed,
            Self::RasterizeFailed { .. } => RenderErrorKind::RasterizeFailed,
        }
    }
}

/// Terminal state of one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderOutcome {
    /// The artifact was regenerated.
    Rendered,
    /// The cached artifact was up to date; nothing ran.
    Cached,
    Failed(RenderError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    pub id: ScrollId,
    pub outcome: RenderOutcome,
}

impl RenderResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RenderOutcome::Rendered | RenderOutcome::Cached)
    }

    #[must_use]
    pub fn error(&self) -> Option<&RenderError> {
        match &self.outcome {
            RenderOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Aggregate of a batch render. Ordering of every list is unspecified.
///
/// Scrolls that turned out to be missing are listed in `missing` only: they count
/// neither as successes nor as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderReport {
    pub rendered: Vec<ScrollId>,
    pub cached: Vec<ScrollId>,
    pub missing: Vec<ScrollId>,
    pub errors: Vec<RenderError>,
}

impl RenderReport {
    pub(crate) fn record(&mut self, result: RenderResult) {
        match result.outcome {
            RenderOutcome::Rendered => self.rendered.push(result.id),
            RenderOutcome::Cached => self.cached.push(result.id),
            RenderOutcome::Failed(RenderError::NotFound { id }) => self.missing.push(id),
            RenderOutcome::Failed(err) => self.errors.push(err),
        }
    }

    /// Number of scrolls whose artifact is now valid.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.rendered.len() + self.cached.len()
    }

    /// Number of scrolls that reached a terminal state.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.success_count() + self.missing.len() + self.errors.len()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
