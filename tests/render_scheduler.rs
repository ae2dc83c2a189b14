//! Integration tests for batch rendering through the public pipeline API.
//! Tests: concurrency ceiling, exactly-once attempts, NotFound accounting

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scrollkeep_core::{
    IndexPruner, LibraryConfig, RenderBackend, RenderError, RenderPipeline, RenderScheduler,
    ScrollId, StageResult, StalenessTracker,
};
use tempfile::TempDir;

#[derive(Default)]
struct CountingBackend {
    active: AtomicUsize,
    peak: AtomicUsize,
    attempts: Mutex<HashMap<ScrollId, usize>>,
}

impl RenderBackend for CountingBackend {
    fn compose(&self, id: &ScrollId) -> StageResult {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        *self.attempts.lock().unwrap().entry(id.clone()).or_default() += 1;
        if id.as_str().ends_with("gone") {
            return Err(RenderError::NotFound { id: id.clone() });
        }
        Ok(())
    }

    fn compile(&self, id: &ScrollId) -> StageResult {
        std::thread::sleep(Duration::from_millis(15));
        if id.as_str().ends_with("broken") {
            return Err(RenderError::CompileFailed {
                id: id.clone(),
                output: "! Emergency stop.".into(),
            });
        }
        Ok(())
    }

    fn rasterize(&self, _id: &ScrollId) -> StageResult {
        Ok(())
    }

    fn cleanup(&self, _id: &ScrollId) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct CountingPruner(AtomicUsize);

impl IndexPruner for CountingPruner {
    fn prune(&self, _id: &ScrollId) -> scrollkeep_core::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn ten_scrolls_under_a_ceiling_of_three() {
    let dir = TempDir::new().unwrap();
    let config = LibraryConfig::with_root(dir.path());
    config.ensure_directories().unwrap();

    let backend = Arc::new(CountingBackend::default());
    let pruner = Arc::new(CountingPruner::default());
    let pipeline = RenderPipeline::new(backend.clone(), Arc::new(StalenessTracker::new(&config)))
        .with_pruner(pruner.clone());
    let scheduler = RenderScheduler::new(pipeline, 3);

    let mut ids: Vec<ScrollId> = (0..8).map(|i| ScrollId::new(format!("ok{i}"))).collect();
    ids.push(ScrollId::from("s_gone"));
    ids.push(ScrollId::from("s_broken"));

    let report = scheduler.render_batch(&ids);

    assert!(backend.peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(backend.active.load(Ordering::SeqCst), 0);
    let attempts = backend.attempts.lock().unwrap();
    assert_eq!(attempts.len(), 10);
    assert!(attempts.values().all(|&n| n == 1));

    assert_eq!(report.attempted(), 10);
    assert_eq!(report.success_count(), 8);
    assert_eq!(report.missing, vec![ScrollId::from("s_gone")]);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors.iter().all(|err| err.id().as_str() != "s_gone"));
    assert!(report.success_count() + report.errors.len() <= 10);
    assert_eq!(pruner.0.load(Ordering::SeqCst), 1);
}
