#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation,
        clippy::float_cmp
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal helpers are self-describing; public APIs still carry docs.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Byte counts and timestamps stay far below the ranges where these casts lose data.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
//
#![allow(clippy::manual_let_else)]
#![allow(clippy::needless_pass_by_value)] // Constructors take owned config intentionally
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::unnecessary_wraps)]

//! Searchable, rendered library of annotated TeX snippets ("scrolls").
//!
//! Each scroll is a `.tex` source file whose trailing comment block carries its
//! metadata. [`Library`] keeps a full-text index of the corpus in sync,
//! answers queries, and renders hits to cached PNG images through an external
//! toolchain.

/// The scrollkeep-core crate version (matches `Cargo.toml`).
pub const SCROLLKEEP_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod constants;
pub mod corpus;
pub mod error;
pub mod index;
pub mod library;
pub mod parse;
pub mod render;
pub mod types;

pub use config::{LibraryConfig, TemplatePair, TemplateSet, ToolchainConfig};
pub use corpus::{Corpus, CorpusEntry};
pub use error::{Result, ScrollError};
pub use index::{IndexManager, IndexUpdateMarker, translate_query};
pub use library::Library;
pub use parse::{DuplicateTypePolicy, parse_metadata, parse_scroll, strip_comments};
pub use render::{
    IndexPruner, LatexBackend, RenderBackend, RenderPipeline, RenderScheduler, StageResult,
    StalenessTracker,
};
pub use types::{
    FindResult, IndexUpdateReport, LibraryStats, Metadata, RenderError, RenderErrorKind,
    RenderOutcome, RenderReport, RenderResult, Scroll, ScrollId, SearchHits,
};
