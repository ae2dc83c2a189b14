//! Library configuration: directory layout, toolchain settings and templates.
//!
//! Every field has a default so a JSON override file only needs to name what it
//! changes. Paths are derived from a single root unless overridden.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CACHE_DIR_NAME, COMMON_FOOTER_TEMPLATE, COMMON_HEADER_TEMPLATE, DEFAULT_COMPILER,
    DEFAULT_MAX_RESULTS, DEFAULT_RASTER_DPI, DEFAULT_RASTER_QUALITY, DEFAULT_RASTERIZER,
    DEFAULT_RENDER_WORKERS, DEFAULT_ROOT_DIR_NAME, DEFAULT_SCROLL_TYPES,
    DEFAULT_SOURCE_EXTENSION, INDEX_DIR_NAME, INDEX_MARKER_FILE_NAME, KNOWLEDGE_DIR_NAME,
    TEMP_DIR_NAME, TEMPLATE_DIR_NAME, TEMPLATE_EXTENSION,
};
use crate::error::{Result, ScrollError};
use crate::parse::DuplicateTypePolicy;

/// Top-level configuration of a scroll library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub root_dir: PathBuf,
    /// Corpus of scroll sources, one `<id>.<source_extension>` file per scroll.
    pub knowledge_dir: PathBuf,
    /// Cached raster artifacts, one `<id>.png` per scroll.
    pub cache_dir: PathBuf,
    pub template_dir: PathBuf,
    /// Scratch area for pipeline byproducts.
    pub temp_dir: PathBuf,
    pub index_dir: PathBuf,
    /// Records when the last index update started.
    pub index_marker: PathBuf,
    pub source_extension: String,
    /// Upper bound on hits returned by a single search.
    pub max_results: usize,
    /// Ceiling on concurrently running render pipelines.
    pub render_workers: usize,
    pub duplicate_type: DuplicateTypePolicy,
    pub toolchain: ToolchainConfig,
    pub templates: TemplateSet,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self::with_root(PathBuf::from(DEFAULT_ROOT_DIR_NAME))
    }
}

impl LibraryConfig {
    /// Standard layout below `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            knowledge_dir: root.join(KNOWLEDGE_DIR_NAME),
            cache_dir: root.join(CACHE_DIR_NAME),
            template_dir: root.join(TEMPLATE_DIR_NAME),
            temp_dir: root.join(TEMP_DIR_NAME),
            index_dir: root.join(INDEX_DIR_NAME),
            index_marker: root.join(INDEX_MARKER_FILE_NAME),
            root_dir: root,
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            render_workers: DEFAULT_RENDER_WORKERS,
            duplicate_type: DuplicateTypePolicy::default(),
            toolchain: ToolchainConfig::default(),
            templates: TemplateSet::default(),
        }
    }

    /// Standard layout in `~/.scrollkeep`.
    pub fn from_home() -> Result<Self> {
        let home = dirs_next::home_dir().ok_or_else(|| ScrollError::Config {
            reason: "cannot determine the home directory".into(),
        })?;
        Ok(Self::with_root(home.join(DEFAULT_ROOT_DIR_NAME)))
    }

    /// Load a JSON configuration file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs_err::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|source| ScrollError::ConfigFile {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_extension.is_empty() || self.source_extension.contains('.') {
            return Err(ScrollError::Config {
                reason: format!(
                    "source extension must be a bare extension, got '{}'",
                    self.source_extension
                ),
            });
        }
        if self.render_workers == 0 {
            return Err(ScrollError::Config {
                reason: "render_workers must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Create every directory of the layout that does not exist yet.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.knowledge_dir,
            &self.cache_dir,
            &self.template_dir,
            &self.temp_dir,
            &self.index_dir,
        ] {
            fs_err::create_dir_all(dir)?;
        }
        if let Some(parent) = self.index_marker.parent() {
            fs_err::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Result cap actually handed to the engine (never zero).
    #[must_use]
    pub fn effective_max_results(&self) -> usize {
        self.max_results.max(1)
    }

    /// Path of a template file given its bare name.
    #[must_use]
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.template_dir.join(format!("{name}.{TEMPLATE_EXTENSION}"))
    }

    /// Every template file the compose stage may read, in stable order.
    #[must_use]
    pub fn template_files(&self) -> Vec<PathBuf> {
        self.templates
            .names()
            .into_iter()
            .map(|name| self.template_path(name))
            .collect()
    }
}

/// External compile and rasterize programs and their settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub compiler: String,
    /// Arguments placed before the output directory and input path.
    pub compiler_args: Vec<String>,
    pub rasterizer: String,
    pub quality: u32,
    pub dpi: u32,
    /// Trim uniform borders from the raster.
    pub trim: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: DEFAULT_COMPILER.to_string(),
            compiler_args: vec!["-halt-on-error".to_string()],
            rasterizer: DEFAULT_RASTERIZER.to_string(),
            quality: DEFAULT_RASTER_QUALITY,
            dpi: DEFAULT_RASTER_DPI,
            trim: true,
        }
    }
}

/// Header/footer template names for one scroll type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePair {
    pub header: String,
    pub footer: String,
}

impl TemplatePair {
    /// `<type>_header` / `<type>_footer`.
    #[must_use]
    pub fn for_type(scroll_type: &str) -> Self {
        Self {
            header: format!("{scroll_type}_header"),
            footer: format!("{scroll_type}_footer"),
        }
    }
}

/// Templates the compose stage wraps around scroll content.
///
/// Adding a scroll type is a matter of registering another pair here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSet {
    pub header: String,
    pub footer: String,
    pub types: BTreeMap<String, TemplatePair>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        let types = DEFAULT_SCROLL_TYPES
            .iter()
            .map(|ty| ((*ty).to_string(), TemplatePair::for_type(ty)))
            .collect();
        Self {
            header: COMMON_HEADER_TEMPLATE.to_string(),
            footer: COMMON_FOOTER_TEMPLATE.to_string(),
            types,
        }
    }
}

impl TemplateSet {
    #[must_use]
    pub fn for_type(&self, scroll_type: &str) -> Option<&TemplatePair> {
        self.types.get(scroll_type)
    }

    pub fn register(&mut self, scroll_type: impl Into<String>, pair: TemplatePair) {
        self.types.insert(scroll_type.into(), pair);
    }

    /// Common templates first, then each type's pair in type order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![self.header.as_str(), self.footer.as_str()];
        for pair in self.types.values() {
            names.push(pair.header.as_str());
            names.push(pair.footer.as_str());
        }
        names
    }
}
