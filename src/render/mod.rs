//! Scroll rendering: compose, compile, rasterize, clean up.
//!
//! [`RenderPipeline`] drives one scroll through the stages of a
//! [`RenderBackend`]; [`scheduler::RenderScheduler`] fans a batch out over a
//! bounded worker pool.

pub mod latex;
pub mod scheduler;
pub mod staleness;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::types::{RenderError, RenderOutcome, RenderResult, ScrollId};

pub use latex::LatexBackend;
pub use scheduler::RenderScheduler;
pub use staleness::StalenessTracker;

/// Outcome of a single pipeline stage.
pub type StageResult = std::result::Result<(), RenderError>;

/// Stage implementations of the render pipeline.
///
/// Stages run strictly in order and the first failure short-circuits the rest;
/// `cleanup` always runs once the pipeline has started. A stage that panics is
/// reported as that stage's failure for its scroll alone.
pub trait RenderBackend: Send + Sync {
    /// Build the full document for `id` in the scratch area.
    ///
    /// A missing source must be reported as [`RenderError::NotFound`].
    fn compose(&self, id: &ScrollId) -> StageResult;

    fn compile(&self, id: &ScrollId) -> StageResult;

    /// Turn the compiled intermediate into the cached artifact.
    fn rasterize(&self, id: &ScrollId) -> StageResult;

    /// Best-effort removal of every scratch file for `id`.
    fn cleanup(&self, id: &ScrollId);
}

/// Removes index entries that reference scrolls which no longer exist.
pub trait IndexPruner: Send + Sync {
    fn prune(&self, id: &ScrollId) -> Result<()>;
}

/// Runs the render stages for one scroll at a time. Cheap to share across threads.
#[derive(Clone)]
pub struct RenderPipeline {
    backend: Arc<dyn RenderBackend>,
    staleness: Arc<StalenessTracker>,
    pruner: Option<Arc<dyn IndexPruner>>,
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("staleness", &self.staleness)
            .field("prunes_index", &self.pruner.is_some())
            .finish_non_exhaustive()
    }
}

impl RenderPipeline {
    #[must_use]
    pub fn new(backend: Arc<dyn RenderBackend>, staleness: Arc<StalenessTracker>) -> Self {
        Self {
            backend,
            staleness,
            pruner: None,
        }
    }

    /// Prune the index whenever compose reports a missing source.
    #[must_use]
    pub fn with_pruner(mut self, pruner: Arc<dyn IndexPruner>) -> Self {
        self.pruner = Some(pruner);
        self
    }

    /// Bring the cached artifact for `id` up to date.
    #[must_use]
    pub fn render(&self, id: &ScrollId) -> RenderResult {
        if self.staleness.is_up_to_date(id) {
            tracing::trace!(target = "scrollkeep::render", %id, "artifact up to date");
            return RenderResult {
                id: id.clone(),
                outcome: RenderOutcome::Cached,
            };
        }

        let started = Instant::now();
        let outcome = match self.run_stages(id) {
            Ok(()) => RenderOutcome::Rendered,
            Err(err) => {
                if matches!(err, RenderError::NotFound { .. }) {
                    self.prune(id);
                } else {
                    tracing::warn!(
                        target = "scrollkeep::render",
                        %id,
                        kind = ?err.kind(),
                        error = %err,
                        "render failed"
                    );
                }
                RenderOutcome::Failed(err)
            }
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.backend.cleanup(id))) {
            tracing::warn!(
                target = "scrollkeep::render",
                %id,
                panic = %panic_message(payload.as_ref()),
                "cleanup panicked"
            );
        }

        tracing::debug!(
            target = "scrollkeep::render",
            %id,
            ok = matches!(outcome, RenderOutcome::Rendered),
            elapsed_ms = started.elapsed().as_millis(),
            "render finished"
        );
        RenderResult {
            id: id.clone(),
            outcome,
        }
    }

    fn run_stages(&self, id: &ScrollId) -> StageResult {
        guarded(
            || self.backend.compose(id),
            |reason| RenderError::ComposeFailed { id: id.clone(), reason },
        )?;
        guarded(
            || self.backend.compile(id),
            |output| RenderError::CompileFailed { id: id.clone(), output },
        )?;
        guarded(
            || self.backend.rasterize(id),
            |output| RenderError::RasterizeFailed { id: id.clone(), output },
        )
    }

    fn prune(&self, id: &ScrollId) {
        tracing::info!(target = "scrollkeep::render", %id, "scroll vanished; pruning index");
        let Some(pruner) = &self.pruner else {
            return;
        };
        if let Err(err) = pruner.prune(id) {
            tracing::warn!(
                target = "scrollkeep::render",
                %id,
                error = %err,
                "failed to remove stale index entry"
            );
        }
    }
}

/// Run one stage, turning a panic into that stage's failure.
fn guarded(
    stage: impl FnOnce() -> StageResult,
    on_panic: impl FnOnce(String) -> RenderError,
) -> StageResult {
    panic::catch_unwind(AssertUnwindSafe(stage))
        .unwrap_or_else(|payload| Err(on_panic(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string payload".to_string());
    format!("stage panicked: {detail}")
}
