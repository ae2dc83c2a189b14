//! Bounded-concurrency batch rendering.

use std::thread;

use crossbeam_channel::unbounded;

use crate::types::{RenderReport, ScrollId};

use super::RenderPipeline;

/// Renders a batch of scrolls on at most `workers` threads at once.
///
/// A batch call blocks until every ID has reached a terminal state. One
/// failing scroll never stops the rest of the batch.
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    pipeline: RenderPipeline,
    workers: usize,
}

impl RenderScheduler {
    #[must_use]
    pub fn new(pipeline: RenderPipeline, workers: usize) -> Self {
        Self {
            pipeline,
            workers: workers.max(1),
        }
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Render every ID once. Result ordering is unspecified.
    #[must_use]
    pub fn render_batch(&self, ids: &[ScrollId]) -> RenderReport {
        let mut report = RenderReport::default();
        if ids.is_empty() {
            return report;
        }
        let workers = self.workers.min(ids.len());

        let (job_tx, job_rx) = unbounded::<&ScrollId>();
        for id in ids {
            if job_tx.send(id).is_err() {
                break;
            }
        }
        drop(job_tx);

        let (result_tx, result_rx) = unbounded();
        thread::scope(|scope| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                let pipeline = &self.pipeline;
                scope.spawn(move || {
                    for id in jobs {
                        if results.send(pipeline.render(id)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);
            for result in result_rx {
                report.record(result);
            }
        });

        tracing::info!(
            target = "scrollkeep::render",
            requested = ids.len(),
            workers,
            rendered = report.rendered.len(),
            cached = report.cached.len(),
            missing = report.missing.len(),
            failed = report.errors.len(),
            "render batch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::config::LibraryConfig;
    use crate::render::StalenessTracker;
    use crate::render::testing::{RecordingPruner, ScriptedBackend};
    use crate::types::RenderErrorKind;
    use tempfile::TempDir;

    fn scheduler(backend: Arc<ScriptedBackend>, workers: usize) -> (TempDir, RenderScheduler) {
        let dir = TempDir::new().unwrap();
        let config = LibraryConfig::with_root(dir.path());
        config.ensure_directories().unwrap();
        let pipeline = RenderPipeline::new(backend, Arc::new(StalenessTracker::new(&config)))
            .with_pruner(Arc::new(RecordingPruner::default()));
        (dir, RenderScheduler::new(pipeline, workers))
    }

    fn ids(n: usize) -> Vec<ScrollId> {
        (0..n).map(|i| ScrollId::new(format!("s{i}"))).collect()
    }

    #[test]
    fn ten_ids_three_workers() {
        let backend = Arc::new(
            ScriptedBackend::default()
                .with_delay(Duration::from_millis(20))
                .failing("s2", RenderErrorKind::NotFound)
                .failing("s5", RenderErrorKind::CompileFailed),
        );
        let (_dir, scheduler) = scheduler(backend.clone(), 3);
        let batch = ids(10);

        let report = scheduler.render_batch(&batch);

        assert_eq!(report.attempted(), 10);
        assert_eq!(report.rendered.len(), 8);
        assert_eq!(report.missing, vec![ScrollId::from("s2")]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].id(), &ScrollId::from("s5"));
        assert!(report.success_count() + report.errors.len() <= 10);

        assert!(backend.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(backend.active.load(Ordering::SeqCst), 0);
        assert_eq!(backend.cleaned().len(), 10);
    }

    #[test]
    fn panicking_backend_does_not_abort_the_batch() {
        let backend = Arc::new(ScriptedBackend::default().panicking("s1"));
        let (_dir, scheduler) = scheduler(backend.clone(), 2);

        let report = scheduler.render_batch(&ids(5));

        assert_eq!(report.rendered.len(), 4);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind(), RenderErrorKind::CompileFailed);
        assert_eq!(backend.cleaned().len(), 5);
        assert_eq!(backend.active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn single_worker_runs_serially() {
        let backend = Arc::new(ScriptedBackend::default().with_delay(Duration::from_millis(5)));
        let (_dir, scheduler) = scheduler(backend.clone(), 1);

        let report = scheduler.render_batch(&ids(4));
        assert_eq!(report.rendered.len(), 4);
        assert_eq!(backend.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_workers_is_clamped() {
        let (_dir, scheduler) = scheduler(Arc::new(ScriptedBackend::default()), 0);
        assert_eq!(scheduler.workers(), 1);
        assert_eq!(scheduler.render_batch(&ids(2)).rendered.len(), 2);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let backend = Arc::new(ScriptedBackend::default());
        let (_dir, scheduler) = scheduler(backend.clone(), 4);
        let report = scheduler.render_batch(&[]);
        assert_eq!(report.attempted(), 0);
        assert!(backend.calls.lock().unwrap().is_empty());
    }
}
