//! Library handle: ties the index, the corpus and the renderer together.
//!
//! Responsibilities:
//! - Open or create the on-disk layout and the index.
//! - Answer queries with rendered, reconciled scrolls.
//! - Keep the index honest about scrolls deleted behind its back.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::LibraryConfig;
use crate::corpus::Corpus;
use crate::error::{Result, ScrollError};
use crate::index::IndexManager;
use crate::render::{
    LatexBackend, RenderBackend, RenderPipeline, RenderScheduler, StalenessTracker,
};
use crate::types::{
    FindResult, IndexUpdateReport, LibraryStats, RenderReport, Scroll, ScrollId, SearchHits,
};

/// Primary handle for a scroll library.
///
/// Index freshness is the caller's responsibility: searching never triggers
/// [`Library::update_index`] on its own.
#[derive(Debug)]
pub struct Library {
    config: LibraryConfig,
    corpus: Corpus,
    index: Arc<IndexManager>,
    scheduler: RenderScheduler,
}

impl Library {
    /// Open the library described by `config` with the TeX render backend.
    pub fn open(config: LibraryConfig) -> Result<Self> {
        let backend = Arc::new(LatexBackend::new(&config));
        Self::open_with_backend(config, backend)
    }

    /// Open the library with a custom render backend.
    pub fn open_with_backend(
        config: LibraryConfig,
        backend: Arc<dyn RenderBackend>,
    ) -> Result<Self> {
        config.validate()?;
        config.ensure_directories()?;

        let index = Arc::new(IndexManager::open_or_create(&config)?);
        let staleness = Arc::new(StalenessTracker::new(&config));
        let pipeline = RenderPipeline::new(backend, staleness).with_pruner(index.clone());
        let scheduler = RenderScheduler::new(pipeline, config.render_workers);

        tracing::info!(
            target = "scrollkeep::library",
            root = %config.root_dir.display(),
            fresh_index = index.created_fresh(),
            workers = scheduler.workers(),
            "library opened"
        );
        Ok(Self {
            corpus: Corpus::new(&config),
            config,
            index,
            scheduler,
        })
    }

    #[must_use]
    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    #[must_use]
    pub fn index(&self) -> &IndexManager {
        &self.index
    }

    pub fn update_index(&self) -> Result<IndexUpdateReport> {
        self.index.update_index()
    }

    pub fn remove_from_index(&self, id: &ScrollId) -> Result<()> {
        self.index.remove_from_index(id)
    }

    /// Hit IDs and raw engine total, without rendering or reconciliation.
    pub fn find_matching_ids(&self, query: &str) -> Result<SearchHits> {
        self.index.search(query)
    }

    /// Search, render every hit, and return the hits that still exist.
    ///
    /// An invalid query fails before anything is rendered. Render failures do not
    /// fail the call; they are listed in [`FindResult::render`].
    pub fn find_scrolls(&self, query: &str) -> Result<FindResult> {
        let hits = self.index.search(query)?;
        let render = self.scheduler.render_batch(&hits.ids);
        let pruned: HashSet<&ScrollId> = render.missing.iter().collect();

        let mut scrolls = Vec::with_capacity(hits.ids.len());
        for id in &hits.ids {
            match self.corpus.load_scroll(id) {
                Ok(scroll) => scrolls.push(scroll),
                Err(ScrollError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                    if !pruned.contains(id) {
                        self.drop_stale_entry(id);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        target = "scrollkeep::library",
                        %id,
                        error = %err,
                        "dropping hit that failed to load"
                    );
                }
            }
        }

        tracing::debug!(
            target = "scrollkeep::library",
            query,
            engine_total = hits.total,
            reconciled = scrolls.len(),
            render_errors = render.errors.len(),
            "find finished"
        );
        Ok(FindResult {
            total: scrolls.len(),
            scrolls,
            render,
        })
    }

    /// Render the given scrolls, skipping those whose artifact is current.
    #[must_use]
    pub fn render_scrolls(&self, ids: &[ScrollId]) -> RenderReport {
        self.scheduler.render_batch(ids)
    }

    /// Render every scroll in the corpus.
    pub fn render_all(&self) -> Result<RenderReport> {
        let ids = self.corpus.scroll_ids()?;
        Ok(self.scheduler.render_batch(&ids))
    }

    /// Load and parse `ids` in order, failing on the first one that cannot be read.
    pub fn load_scrolls(&self, ids: &[ScrollId]) -> Result<Vec<Scroll>> {
        ids.iter().map(|id| self.corpus.load_scroll(id)).collect()
    }

    pub fn statistics(&self) -> Result<LibraryStats> {
        self.index.statistics()
    }

    /// Location of the cached artifact for `id`, whether or not it exists yet.
    #[must_use]
    pub fn artifact_path(&self, id: &ScrollId) -> PathBuf {
        self.corpus.artifact_path(id)
    }

    fn drop_stale_entry(&self, id: &ScrollId) {
        match self.index.remove_from_index(id) {
            Ok(()) => {
                tracing::info!(target = "scrollkeep::library", %id, "removed stale index entry");
            }
            Err(err) => {
                tracing::warn!(
                    target = "scrollkeep::library",
                    %id,
                    error = %err,
                    "failed to remove stale index entry"
                );
            }
        }
    }
}
