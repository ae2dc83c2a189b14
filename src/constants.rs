//! Defaults and fixed names for the on-disk layout.

/// Leading character of a metadata comment line in a scroll source.
pub const COMMENT_PREFIX: char = '%';

/// Extension of scroll source files inside the knowledge directory.
pub const DEFAULT_SOURCE_EXTENSION: &str = "tex";
/// Extension of cached raster artifacts.
pub const ARTIFACT_EXTENSION: &str = "png";
/// Extension of template files inside the template directory.
pub const TEMPLATE_EXTENSION: &str = "tex";
/// Extension of the composed document written to the scratch area.
pub const COMPOSED_EXTENSION: &str = "tex";
/// Extension of the compiled intermediate produced in the scratch area.
pub const INTERMEDIATE_EXTENSION: &str = "pdf";

/// Name of the per-user data directory created under `$HOME`.
pub const DEFAULT_ROOT_DIR_NAME: &str = ".scrollkeep";
pub const KNOWLEDGE_DIR_NAME: &str = "library";
pub const CACHE_DIR_NAME: &str = "cache";
pub const TEMPLATE_DIR_NAME: &str = "templates";
pub const TEMP_DIR_NAME: &str = "tmp";
pub const INDEX_DIR_NAME: &str = "index";
pub const INDEX_MARKER_FILE_NAME: &str = "index_updated";

pub const DEFAULT_MAX_RESULTS: usize = 1000;
pub const DEFAULT_RENDER_WORKERS: usize = 4;
pub const DEFAULT_RASTER_QUALITY: u32 = 90;
pub const DEFAULT_RASTER_DPI: u32 = 160;

pub const DEFAULT_COMPILER: &str = "xelatex";
pub const DEFAULT_RASTERIZER: &str = "convert";

pub const COMMON_HEADER_TEMPLATE: &str = "header";
pub const COMMON_FOOTER_TEMPLATE: &str = "footer";

/// Scroll types that ship with a header/footer template pair.
pub const DEFAULT_SCROLL_TYPES: &[&str] = &[
    "algorithm",
    "axiom",
    "corollary",
    "definition",
    "example",
    "exercise",
    "lemma",
    "proof",
    "proposition",
    "remark",
    "theorem",
];

/// Memory budget for the short-lived tantivy writer used by index mutations.
pub const INDEX_WRITER_HEAP_BYTES: usize = 50_000_000;
