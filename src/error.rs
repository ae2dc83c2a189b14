//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by every fallible operation in `scrollkeep-core`.
pub type Result<T> = std::result::Result<T, ScrollError>;

/// Crate-wide error type.
///
/// Index engine failures, filesystem failures and configuration problems are
/// operational errors. [`ScrollError::InvalidQuery`] is the one variant a user can
/// act on directly and is kept separate so presentation layers can tell
/// "query rejected" apart from "search broke".
#[derive(Debug, Error)]
pub enum ScrollError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error("invalid query string '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("scroll declares @type more than once ('{first}' and '{second}')")]
    DuplicateType { first: String, second: String },

    #[error("no templates registered for scroll type '{scroll_type}'")]
    MissingTemplate { scroll_type: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("cannot read configuration file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("lock poisoned: {0}")]
    Lock(String),
}

impl ScrollError {
    /// Returns `true` when the error was caused by the query text itself.
    #[must_use]
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Self::InvalidQuery { .. })
    }
}
