//! Build plugins and the registry that orders them.
//!
//! Plugins run at two points of a build:
//! - `chunks_assembled`: chunks are known, scripts are not yet rendered
//! - `process_assets`: every script is rendered and named
//!
//! Within each point plugins run in phase order.

mod clean;
mod extract_css;
mod hmr;
mod html;

use std::path::{Path, PathBuf};

use sheaf_config::{PluginSpec, SheafConfig};

use crate::Result;
use crate::build::DevSession;
use crate::chunk::Chunk;
use crate::graph::ModuleGraph;
use crate::loaders::Pipeline;
use crate::output::OutputAssets;

pub use clean::CleanPlugin;
pub use extract_css::ExtractCssPlugin;
pub use hmr::HotReloadPlugin;
pub use html::HtmlPagePlugin;

/// Plugin execution phases
///
/// Plugins are executed in phase order (lower numbers first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginPhase {
    /// Stylesheet extraction; pages link the files it names
    Styles = 10,

    /// Page generation
    Pages = 20,

    /// Live reload client injection
    Hmr = 30,

    /// Output directory handling (always last)
    Emit = 100,
}

/// State shared by the plugins of one build
pub struct Compilation<'a> {
    pub config: &'a SheafConfig,
    pub project_root: &'a Path,
    pub dev: Option<&'a DevSession>,
    pub pipeline: Pipeline,
    pub graph: ModuleGraph,
    pub chunks: Vec<Chunk>,
    pub assets: OutputAssets,
    /// Set when the output root is reset before writing; holds paths to keep
    pub reset: Option<Vec<PathBuf>>,
}

impl Compilation<'_> {
    /// URL of output file `target` as referenced from output file `from`
    ///
    /// The output public path wins when configured.
    pub fn url_from(&self, from: &str, target: &str) -> String {
        match &self.config.output.public_path {
            Some(public_path) => format!("{public_path}{target}"),
            None => relative_url(from, target),
        }
    }

    pub fn entry_chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.is_entry() && c.id == name)
    }
}

pub trait BuildPlugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn phase(&self) -> PluginPhase;

    fn chunks_assembled(&self, _compilation: &mut Compilation<'_>) -> Result<()> {
        Ok(())
    }

    fn process_assets(&self, _compilation: &mut Compilation<'_>) -> Result<()> {
        Ok(())
    }
}

/// Plugin registry that maintains plugins in phase order
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn BuildPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate the plugins a manifest declares
    ///
    /// The live reload plugin is added whenever hot mode is on, declared or not.
    pub fn from_config(config: &SheafConfig) -> Self {
        let mut registry = Self::new();
        for spec in &config.plugins {
            match spec {
                PluginSpec::Html(page) => registry.add(HtmlPagePlugin::new(page.clone())),
                PluginSpec::ExtractCss(options) => {
                    registry.add(ExtractCssPlugin::new(options.clone()))
                }
                PluginSpec::Clean(options) => registry.add(CleanPlugin::new(options.keep.clone())),
                PluginSpec::HotModuleReplacement => {}
            }
        }
        if config.hot_enabled() {
            registry.add(HotReloadPlugin);
        }
        registry
    }

    /// Add a plugin, keeping phase order
    ///
    /// Plugins of the same phase keep their insertion order.
    pub fn add<P: BuildPlugin + 'static>(&mut self, plugin: P) {
        let phase = plugin.phase();
        let at = self.plugins.partition_point(|p| p.phase() <= phase);
        self.plugins.insert(at, Box::new(plugin));
    }

    pub fn chunks_assembled(&self, compilation: &mut Compilation<'_>) -> Result<()> {
        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "chunks_assembled");
            plugin.chunks_assembled(compilation)?;
        }
        Ok(())
    }

    pub fn process_assets(&self, compilation: &mut Compilation<'_>) -> Result<()> {
        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "process_assets");
            plugin.process_assets(compilation)?;
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.iter().map(|p| p.name())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Relative URL between two files under the output root
pub fn relative_url(from: &str, target: &str) -> String {
    let from_dirs: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let from_dirs = &from_dirs[..from_dirs.len().saturating_sub(1)];
    let target_parts: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();

    let common = from_dirs
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count()
        .min(target_parts.len().saturating_sub(1));

    let mut url = "../".repeat(from_dirs.len() - common);
    url.push_str(&target_parts[common..].join("/"));
    url
}
