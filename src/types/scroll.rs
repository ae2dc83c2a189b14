//! Scroll identity and the parsed metadata record.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a scroll: its source file name without the extension.
///
/// The same value keys the source file, the index entry and the cached artifact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScrollId(String);

impl ScrollId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an ID from a corpus file name, provided its extension matches `extension`.
    #[must_use]
    pub fn from_file_name(file_name: &Path, extension: &str) -> Option<Self> {
        if file_name.extension()?.to_str()? != extension {
            return None;
        }
        let stem = file_name.file_stem()?.to_str()?;
        if stem.is_empty() {
            return None;
        }
        Some(Self(stem.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScrollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ScrollId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ScrollId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScrollId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ScrollId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Structured view of a scroll's trailing comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// First declared `@type`; empty when the scroll declares none.
    #[serde(rename = "type")]
    pub scroll_type: String,
    /// `@source` citations in declaration order.
    #[serde(default, rename = "source")]
    pub sources: Vec<String>,
    /// Lowercased tags.
    #[serde(default, rename = "tag")]
    pub tags: BTreeSet<String>,
    /// Terms that are indexed but never displayed.
    #[serde(default)]
    pub hidden: BTreeSet<String>,
    /// Unrecognised `@` directives, kept verbatim including the `@name` prefix.
    #[serde(default, rename = "other")]
    pub other_directives: Vec<String>,
}

/// A scroll as read from the corpus: content with the metadata block stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scroll {
    pub id: ScrollId,
    pub content: String,
    #[serde(flatten)]
    pub metadata: Metadata,
}
