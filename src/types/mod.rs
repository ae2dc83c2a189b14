//! Public types exposed by the `scrollkeep-core` crate.

pub mod render;
pub mod scroll;
pub mod search;
pub mod stats;

pub use render::{RenderError, RenderErrorKind, RenderOutcome, RenderReport, RenderResult};
pub use scroll::{Metadata, Scroll, ScrollId};
pub use search::{FindResult, SearchHits};
pub use stats::{IndexUpdateReport, LibraryStats};
