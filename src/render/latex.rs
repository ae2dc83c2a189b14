//! Production backend: a TeX compiler followed by an image converter.

use std::io;
use std::path::Path;
use std::process::{Command, Output};

use crate::config::{LibraryConfig, TemplateSet, ToolchainConfig};
use crate::constants::{COMPOSED_EXTENSION, INTERMEDIATE_EXTENSION};
use crate::corpus::Corpus;
use crate::error::ScrollError;
use crate::types::{RenderError, ScrollId};

use super::{RenderBackend, StageResult};

/// Renders scrolls with external programs, by default `xelatex` and ImageMagick's `convert`.
#[derive(Debug, Clone)]
pub struct LatexBackend {
    corpus: Corpus,
    config: LibraryConfig,
}

impl LatexBackend {
    #[must_use]
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            corpus: Corpus::new(config),
            config: config.clone(),
        }
    }

    fn toolchain(&self) -> &ToolchainConfig {
        &self.config.toolchain
    }

    fn templates(&self) -> &TemplateSet {
        &self.config.templates
    }

    fn read_template(&self, id: &ScrollId, name: &str) -> Result<String, RenderError> {
        fs_err::read_to_string(self.config.template_path(name)).map_err(|err| {
            RenderError::ComposeFailed {
                id: id.clone(),
                reason: err.to_string(),
            }
        })
    }

    /// Arguments handed to the compiler for `id`.
    #[must_use]
    pub fn compile_args(&self, id: &ScrollId) -> Vec<String> {
        let mut args = self.toolchain().compiler_args.clone();
        args.push("-output-directory".into());
        args.push(path_arg(self.corpus.temp_dir()));
        args.push(path_arg(&self.corpus.scratch_path(id, COMPOSED_EXTENSION)));
        args
    }

    /// Arguments handed to the rasterizer for `id`.
    #[must_use]
    pub fn rasterize_args(&self, id: &ScrollId) -> Vec<String> {
        let toolchain = self.toolchain();
        let mut args = Vec::with_capacity(7);
        if toolchain.trim {
            args.push("-trim".into());
        }
        args.push("-quality".into());
        args.push(toolchain.quality.to_string());
        args.push("-density".into());
        args.push(toolchain.dpi.to_string());
        args.push(path_arg(&self.corpus.scratch_path(id, INTERMEDIATE_EXTENSION)));
        args.push(path_arg(&self.corpus.artifact_path(id)));
        args
    }
}

impl RenderBackend for LatexBackend {
    fn compose(&self, id: &ScrollId) -> StageResult {
        let scroll = match self.corpus.load_scroll(id) {
            Ok(scroll) => scroll,
            Err(ScrollError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                return Err(RenderError::NotFound { id: id.clone() });
            }
            Err(err) => {
                return Err(RenderError::ComposeFailed {
                    id: id.clone(),
                    reason: err.to_string(),
                });
            }
        };

        let scroll_type = &scroll.metadata.scroll_type;
        let Some(pair) = self.templates().for_type(scroll_type) else {
            return Err(RenderError::ComposeFailed {
                id: id.clone(),
                reason: ScrollError::MissingTemplate {
                    scroll_type: scroll_type.clone(),
                }
                .to_string(),
            });
        };

        let mut document = String::new();
        document.push_str(&self.read_template(id, &self.templates().header)?);
        document.push_str(&self.read_template(id, &pair.header)?);
        document.push_str(&scroll.content);
        document.push('\n');
        document.push_str(&self.read_template(id, &pair.footer)?);
        document.push_str(&self.read_template(id, &self.templates().footer)?);

        self.corpus
            .write_scratch(id, COMPOSED_EXTENSION, &document)
            .map_err(|err| RenderError::ComposeFailed {
                id: id.clone(),
                reason: err.to_string(),
            })?;
        Ok(())
    }

    fn compile(&self, id: &ScrollId) -> StageResult {
        let result = Command::new(&self.toolchain().compiler)
            .args(self.compile_args(id))
            .output();
        check_output(result).map_err(|output| RenderError::CompileFailed {
            id: id.clone(),
            output,
        })
    }

    fn rasterize(&self, id: &ScrollId) -> StageResult {
        let result = Command::new(&self.toolchain().rasterizer)
            .args(self.rasterize_args(id))
            .output();
        check_output(result).map_err(|output| RenderError::RasterizeFailed {
            id: id.clone(),
            output,
        })
    }

    fn cleanup(&self, id: &ScrollId) {
        let removed = self.corpus.remove_scratch(id);
        tracing::trace!(target = "scrollkeep::render", %id, removed, "scratch cleaned");
    }
}

/// Map a finished (or unspawnable) process to its diagnostic text on failure.
fn check_output(result: io::Result<Output>) -> Result<(), String> {
    let output = result.map_err(|err| format!("cannot run tool: {err}"))?;
    if output.status.success() {
        return Ok(());
    }
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    if text.trim().is_empty() {
        text = format!("tool exited with {}", output.status);
    }
    Err(text)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
