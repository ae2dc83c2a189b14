//! Incremental full-text index over the scroll corpus.
//!
//! The index lives in a tantivy mmap directory. Every mutation acquires a
//! short-lived single-threaded writer under an internal mutex, commits, and
//! reloads the shared reader, so searches always observe the last commit.

pub mod marker;
pub mod query;

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Utc;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::QueryParser;
use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions, Value,
};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use crate::config::LibraryConfig;
use crate::constants::INDEX_WRITER_HEAP_BYTES;
use crate::corpus::Corpus;
use crate::error::{Result, ScrollError};
use crate::render::IndexPruner;
use crate::types::{IndexUpdateReport, LibraryStats, Scroll, ScrollId, SearchHits};

pub use marker::IndexUpdateMarker;
pub use query::translate_query;

const FIELD_ID: &str = "id";
const FIELD_TYPE: &str = "type";
const FIELD_CONTENT: &str = "content";
const FIELD_SOURCE: &str = "source";
const FIELD_TAG: &str = "tag";
const FIELD_HIDDEN: &str = "hidden";
const FIELD_OTHER: &str = "other";

/// tantivy's meta file; its presence means an index already exists.
const META_FILE_NAME: &str = "meta.json";

#[derive(Debug, Clone, Copy)]
struct ScrollFields {
    id: Field,
    scroll_type: Field,
    content: Field,
    source: Field,
    tag: Field,
    hidden: Field,
    other: Field,
}

impl ScrollFields {
    fn schema() -> Schema {
        let text = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer("en_stem")
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );
        let exact = TextOptions::default()
            .set_indexing_options(TextFieldIndexing::default().set_tokenizer("raw"));

        let mut builder = Schema::builder();
        builder.add_text_field(FIELD_ID, STRING | STORED);
        builder.add_text_field(FIELD_TYPE, exact);
        builder.add_text_field(FIELD_CONTENT, text.clone());
        builder.add_text_field(FIELD_SOURCE, text.clone());
        builder.add_text_field(FIELD_TAG, text.clone());
        builder.add_text_field(FIELD_HIDDEN, text.clone());
        builder.add_text_field(FIELD_OTHER, text);
        builder.build()
    }

    fn resolve(schema: &Schema) -> Result<Self> {
        Ok(Self {
            id: schema.get_field(FIELD_ID)?,
            scroll_type: schema.get_field(FIELD_TYPE)?,
            content: schema.get_field(FIELD_CONTENT)?,
            source: schema.get_field(FIELD_SOURCE)?,
            tag: schema.get_field(FIELD_TAG)?,
            hidden: schema.get_field(FIELD_HIDDEN)?,
            other: schema.get_field(FIELD_OTHER)?,
        })
    }

    fn default_query_fields(&self) -> Vec<Field> {
        vec![
            self.content,
            self.source,
            self.tag,
            self.hidden,
            self.other,
            self.scroll_type,
        ]
    }

    fn document(&self, scroll: &Scroll) -> TantivyDocument {
        let mut doc = TantivyDocument::default();
        doc.add_text(self.id, scroll.id.as_str());
        doc.add_text(self.scroll_type, &scroll.metadata.scroll_type);
        doc.add_text(self.content, &scroll.content);
        for source in &scroll.metadata.sources {
            doc.add_text(self.source, source);
        }
        for tag in &scroll.metadata.tags {
            doc.add_text(self.tag, tag);
        }
        for hidden in &scroll.metadata.hidden {
            doc.add_text(self.hidden, hidden);
        }
        for directive in &scroll.metadata.other_directives {
            doc.add_text(self.other, directive);
        }
        doc
    }

    fn id_term(&self, id: &ScrollId) -> Term {
        Term::from_field_text(self.id, id.as_str())
    }
}

/// Owns the on-disk index and keeps it in step with the corpus.
pub struct IndexManager {
    index: Index,
    reader: IndexReader,
    fields: ScrollFields,
    writer_lock: Mutex<()>,
    /// Set while a freshly created index has not had its first full update.
    fresh: AtomicBool,
    corpus: Corpus,
    marker: IndexUpdateMarker,
    max_results: usize,
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("fresh", &self.fresh.load(Ordering::Relaxed))
            .field("marker", &self.marker)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}

impl IndexManager {
    /// Open the index in `config.index_dir`, creating an empty one if none exists.
    pub fn open_or_create(config: &LibraryConfig) -> Result<Self> {
        let dir = config.index_dir.as_path();
        fs_err::create_dir_all(dir)?;
        let created = !dir.join(META_FILE_NAME).exists();
        let index = if created {
            tracing::info!(
                target = "scrollkeep::index",
                path = %dir.display(),
                "creating new index"
            );
            Index::create_in_dir(dir, ScrollFields::schema())?
        } else {
            Index::open_in_dir(dir)?
        };
        let fields = ScrollFields::resolve(&index.schema())?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            fields,
            writer_lock: Mutex::new(()),
            fresh: AtomicBool::new(created),
            corpus: Corpus::new(config),
            marker: IndexUpdateMarker::new(&config.index_marker),
            max_results: config.effective_max_results(),
        })
    }

    /// Whether the next update will reindex the whole corpus.
    #[must_use]
    pub fn created_fresh(&self) -> bool {
        self.fresh.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn marker(&self) -> &IndexUpdateMarker {
        &self.marker
    }

    /// Stage every scroll modified since the last update and commit them as one batch.
    ///
    /// Unreadable or unparsable scrolls are logged and reported in
    /// [`IndexUpdateReport::skipped`]. The marker only advances after the commit.
    pub fn update_index(&self) -> Result<IndexUpdateReport> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let full_reindex = self.created_fresh();
        let threshold = if full_reindex {
            i64::MIN
        } else {
            self.marker.read_or_epoch()
        };

        let entries = self.corpus.entries()?;
        let mut report = IndexUpdateReport {
            scanned: entries.len(),
            full_reindex,
            ..IndexUpdateReport::default()
        };

        {
            let _guard = self.lock_writer()?;
            let mut writer = self.writer()?;
            for entry in entries {
                if entry.modified < threshold {
                    continue;
                }
                match self.corpus.load_scroll(&entry.id) {
                    Ok(scroll) => {
                        writer.delete_term(self.fields.id_term(&scroll.id));
                        writer.add_document(self.fields.document(&scroll))?;
                        report.indexed += 1;
                    }
                    Err(err) => {
                        tracing::warn!(
                            target = "scrollkeep::index",
                            id = %entry.id,
                            error = %err,
                            "skipping scroll that failed to load"
                        );
                        report.skipped.push((entry.id, err.to_string()));
                    }
                }
            }
            if report.indexed > 0 {
                writer.commit()?;
                self.reader.reload()?;
            }
        }

        if let Err(err) = self.marker.advance(started_at) {
            tracing::warn!(
                target = "scrollkeep::index",
                path = %self.marker.path().display(),
                error = %err,
                "failed to advance index marker"
            );
        }
        self.fresh.store(false, Ordering::Release);

        tracing::info!(
            target = "scrollkeep::index",
            scanned = report.scanned,
            indexed = report.indexed,
            skipped = report.skipped.len(),
            full_reindex,
            elapsed_ms = clock.elapsed().as_millis(),
            "index update finished"
        );
        Ok(report)
    }

    /// Delete the entry for `id`. Removing an ID that is not indexed is a no-op.
    pub fn remove_from_index(&self, id: &ScrollId) -> Result<()> {
        let _guard = self.lock_writer()?;
        let mut writer = self.writer()?;
        writer.delete_term(self.fields.id_term(id));
        writer.commit()?;
        self.reader.reload()?;
        tracing::debug!(target = "scrollkeep::index", %id, "removed index entry");
        Ok(())
    }

    /// Run a user query; hits come back in relevance order.
    pub fn search(&self, query: &str) -> Result<SearchHits> {
        let translated = translate_query(query);
        if translated.is_empty() {
            return Err(ScrollError::InvalidQuery {
                query: query.to_string(),
                reason: "query is empty".into(),
            });
        }

        let parser = QueryParser::for_index(&self.index, self.fields.default_query_fields());
        let parsed = parser
            .parse_query(&translated)
            .map_err(|err| ScrollError::InvalidQuery {
                query: query.to_string(),
                reason: err.to_string(),
            })?;

        let searcher = self.reader.searcher();
        let (top_docs, total) =
            searcher.search(&parsed, &(TopDocs::with_limit(self.max_results), Count))?;

        let mut ids = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(id) = doc.get_first(self.fields.id).and_then(|value| value.as_str()) {
                ids.push(ScrollId::from(id));
            }
        }

        tracing::debug!(
            target = "scrollkeep::index",
            query = %translated,
            hits = ids.len(),
            total,
            "search finished"
        );
        Ok(SearchHits {
            query: translated,
            ids,
            total,
        })
    }

    /// Indexed document count plus the byte size of the knowledge directory.
    pub fn statistics(&self) -> Result<LibraryStats> {
        Ok(LibraryStats {
            scroll_count: self.reader.searcher().num_docs(),
            total_bytes: self.corpus.total_bytes()?,
        })
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.writer_lock
            .lock()
            .map_err(|_| ScrollError::Lock("index writer".into()))
    }

    fn writer(&self) -> Result<IndexWriter> {
        Ok(self.index.writer_with_num_threads(1, INDEX_WRITER_HEAP_BYTES)?)
    }
}

impl IndexPruner for IndexManager {
    fn prune(&self, id: &ScrollId) -> Result<()> {
        self.remove_from_index(id)
    }
}
