//! End-to-end tests for the query service.
//! Tests: find_scrolls reconciliation, render reporting, invalid queries

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, UNIX_EPOCH};

use scrollkeep_core::{
    Library, LibraryConfig, RenderBackend, RenderError, RenderErrorKind, ScrollId, StageResult,
};
use tempfile::TempDir;

/// Backend that "renders" by touching the artifact file.
struct TouchBackend {
    knowledge_dir: PathBuf,
    cache_dir: PathBuf,
    /// Report vanished sources as `NotFound` like the production backend does.
    detect_missing: bool,
    failing: Mutex<Vec<ScrollId>>,
    composed: AtomicUsize,
}

impl TouchBackend {
    fn new(config: &LibraryConfig) -> Self {
        Self {
            knowledge_dir: config.knowledge_dir.clone(),
            cache_dir: config.cache_dir.clone(),
            detect_missing: true,
            failing: Mutex::new(Vec::new()),
            composed: AtomicUsize::new(0),
        }
    }
}

impl RenderBackend for TouchBackend {
    fn compose(&self, id: &ScrollId) -> StageResult {
        self.composed.fetch_add(1, Ordering::SeqCst);
        let source = self.knowledge_dir.join(format!("{id}.tex"));
        if self.detect_missing && !source.exists() {
            return Err(RenderError::NotFound { id: id.clone() });
        }
        Ok(())
    }

    fn compile(&self, id: &ScrollId) -> StageResult {
        if self.failing.lock().unwrap().contains(id) {
            return Err(RenderError::CompileFailed {
                id: id.clone(),
                output: "! Missing $ inserted.".into(),
            });
        }
        Ok(())
    }

    fn rasterize(&self, id: &ScrollId) -> StageResult {
        std::fs::write(self.cache_dir.join(format!("{id}.png")), b"png").unwrap();
        Ok(())
    }

    fn cleanup(&self, _id: &ScrollId) {}
}

fn write_scroll(config: &LibraryConfig, id: &str, body: &str) {
    let path = config.knowledge_dir.join(format!("{id}.tex"));
    std::fs::write(&path, body).unwrap();
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(1_500_000_000))
        .unwrap();
}

fn open(detect_missing: bool) -> (TempDir, Library, Arc<TouchBackend>) {
    let dir = TempDir::new().unwrap();
    let mut config = LibraryConfig::with_root(dir.path());
    config.render_workers = 2;
    config.ensure_directories().unwrap();

    write_scroll(&config, "a", "Compactness lemma.\n\n% @type lemma\n% topology\n");
    write_scroll(&config, "b", "Open set.\n\n% @type definition\n% topology\n");

    let mut backend = TouchBackend::new(&config);
    backend.detect_missing = detect_missing;
    let backend = Arc::new(backend);
    let library = Library::open_with_backend(config, backend.clone()).unwrap();
    library.update_index().unwrap();
    (dir, library, backend)
}

fn sorted_ids(ids: impl IntoIterator<Item = ScrollId>) -> Vec<ScrollId> {
    let mut ids: Vec<_> = ids.into_iter().collect();
    ids.sort();
    ids
}

#[test]
fn deleted_scroll_is_reconciled_away() {
    let (_dir, library, _backend) = open(true);

    let found = library.find_scrolls("topology").unwrap();
    assert_eq!(found.total, 2);
    assert_eq!(
        sorted_ids(found.scrolls.iter().map(|s| s.id.clone())),
        vec![ScrollId::from("a"), ScrollId::from("b")]
    );
    assert_eq!(found.render.rendered.len(), 2);
    assert!(!found.render.has_errors());

    std::fs::remove_file(library.config().knowledge_dir.join("b.tex")).unwrap();

    let found = library.find_scrolls("topology").unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.scrolls[0].id, ScrollId::from("a"));
    assert_eq!(found.scrolls[0].metadata.scroll_type, "lemma");
    assert_eq!(found.render.missing, vec![ScrollId::from("b")]);
    assert_eq!(found.render.cached, vec![ScrollId::from("a")]);
    assert!(found.render.errors.is_empty());

    let hits = library.find_matching_ids("topology").unwrap();
    assert_eq!(hits.ids, vec![ScrollId::from("a")]);
    assert_eq!(hits.total, 1);
    assert_eq!(library.statistics().unwrap().scroll_count, 1);
}

#[test]
fn reconciliation_prunes_when_render_did_not() {
    let (_dir, library, _backend) = open(false);
    library.find_scrolls("topology").unwrap();
    std::fs::remove_file(library.config().knowledge_dir.join("b.tex")).unwrap();

    let found = library.find_scrolls("topology").unwrap();
    assert_eq!(found.total, 1);
    assert!(found.render.missing.is_empty());
    assert_eq!(library.find_matching_ids("topology").unwrap().total, 1);
}

#[test]
fn render_failure_is_partial_not_fatal() {
    let (_dir, library, backend) = open(true);
    backend.failing.lock().unwrap().push(ScrollId::from("b"));

    let found = library.find_scrolls("topology").unwrap();
    assert_eq!(found.total, 2, "failed renders are still listed");
    assert_eq!(found.render.errors.len(), 1);
    assert_eq!(found.render.errors[0].kind(), RenderErrorKind::CompileFailed);
    assert_eq!(found.render.errors[0].id(), &ScrollId::from("b"));
    assert!(library.artifact_path(&ScrollId::from("a")).exists());
    assert!(!library.artifact_path(&ScrollId::from("b")).exists());
}

#[test]
fn invalid_query_renders_nothing() {
    let (_dir, library, backend) = open(true);

    let err = library.find_scrolls("nosuchfield:topology").unwrap_err();
    assert!(err.is_invalid_query());
    assert_eq!(backend.composed.load(Ordering::SeqCst), 0);
}

#[test]
fn zero_results_is_not_an_error() {
    let (_dir, library, backend) = open(true);

    let found = library.find_scrolls("homotopy").unwrap();
    assert!(found.is_empty());
    assert_eq!(found.total, 0);
    assert_eq!(found.render.attempted(), 0);
    assert_eq!(backend.composed.load(Ordering::SeqCst), 0);
}

#[test]
fn render_all_and_load_scrolls() {
    let (_dir, library, _backend) = open(true);

    let report = library.render_all().unwrap();
    assert_eq!(report.success_count(), 2);

    let scrolls = library
        .load_scrolls(&[ScrollId::from("b"), ScrollId::from("a")])
        .unwrap();
    assert_eq!(scrolls[0].id, ScrollId::from("b"));
    assert_eq!(scrolls[1].content, "Compactness lemma.");

    assert!(library.load_scrolls(&[ScrollId::from("missing")]).is_err());
}
