//! Build orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use sheaf_config::{ConfigValidator, FsValidator, SheafConfig, TemplateVars, lint, render_template};

use crate::chunk::{Chunk, ChunkKind, assemble};
use crate::graph::ModuleGraph;
use crate::loaders::Pipeline;
use crate::output::writer::{clean_output_dir, write_assets};
use crate::output::{AssetKind, OutputAssets};
use crate::plugins::{Compilation, PluginRegistry};
use crate::runtime::RenderContext;
use crate::{Error, Result};

/// Interactive session the build is served in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevSession {
    /// Server-sent events endpoint the live reload client subscribes to
    pub events_url: String,
}

/// Runs the pipeline a manifest declares
pub struct Bundler {
    config: Arc<SheafConfig>,
    manifest_dir: PathBuf,
    dev: Option<DevSession>,
}

impl Bundler {
    /// `manifest_dir` is the directory holding the manifest; `context` is relative to it
    pub fn new(config: impl Into<Arc<SheafConfig>>, manifest_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            manifest_dir: manifest_dir.into(),
            dev: None,
        }
    }

    pub fn with_dev_session(mut self, session: DevSession) -> Self {
        self.dev = Some(session);
        self
    }

    pub fn config(&self) -> &SheafConfig {
        &self.config
    }

    pub fn project_root(&self) -> Result<PathBuf> {
        let root = self.config.project_root(&self.manifest_dir);
        root.canonicalize().map_err(|e| Error::IoError {
            message: format!("Project directory {} is not accessible", root.display()),
            source: e,
        })
    }

    /// Build everything in memory; nothing is written
    pub fn build(&self) -> Result<BuildOutput> {
        let started = Instant::now();
        let config = self.config.as_ref();
        let project_root = self.project_root()?;
        FsValidator::new(&project_root).validate(config)?;
        let warnings: Vec<String> = lint(config).into_iter().map(|w| w.to_string()).collect();

        tracing::info!(
            mode = %config.mode,
            entries = config.entry.len(),
            root = %project_root.display(),
            "starting build"
        );

        let mut pipeline = Pipeline::new(config, &project_root)?;
        let graph = ModuleGraph::build(config, &mut pipeline)?;
        let chunks = assemble(&graph);
        let registry = PluginRegistry::from_config(config);

        let mut compilation = Compilation {
            config,
            project_root: &project_root,
            dev: self.dev.as_ref(),
            pipeline,
            graph,
            chunks,
            assets: OutputAssets::new(),
            reset: None,
        };

        registry.chunks_assembled(&mut compilation)?;
        render_scripts(&mut compilation)?;
        registry.process_assets(&mut compilation)?;

        for (filename, content) in compilation.pipeline.take_emitted() {
            compilation.assets.emit(filename, AssetKind::Media, content);
        }

        let Compilation {
            chunks,
            assets,
            reset,
            ..
        } = compilation;

        tracing::info!(
            files = assets.len(),
            bytes = assets.total_size(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "build finished"
        );

        Ok(BuildOutput {
            out_dir: config.output_dir(&project_root),
            project_root,
            assets,
            chunks,
            reset,
            warnings,
        })
    }
}

/// Name and render every chunk's script
///
/// Async chunks go first so entry runtimes can list their files.
fn render_scripts(compilation: &mut Compilation<'_>) -> Result<()> {
    let config = compilation.config;
    let output = &config.output;

    for kind in [ChunkKind::Async, ChunkKind::Entry] {
        let mut rendered = Vec::new();
        {
            let ctx = RenderContext {
                graph: &compilation.graph,
                chunks: &compilation.chunks,
                public_path: output.public_path.as_deref(),
                mode: config.mode,
            };
            for (index, chunk) in compilation.chunks.iter().enumerate() {
                if chunk.kind != kind {
                    continue;
                }
                let template = match kind {
                    ChunkKind::Entry => &output.filename,
                    ChunkKind::Async => &output.chunk_filename,
                };
                let vars = TemplateVars::named(chunk.template_name())
                    .with_id(&chunk.id)
                    .with_ext("js");
                let code = match kind {
                    ChunkKind::Entry => {
                        let provisional = render_template(template, &vars.with_content(&[]))?;
                        ctx.render_entry(chunk, &provisional)?
                    }
                    ChunkKind::Async => ctx.render_async(chunk)?,
                };
                let filename = render_template(template, &vars.with_content(code.as_bytes()))?;
                rendered.push((index, filename, code));
            }
        }

        for (index, filename, code) in rendered {
            tracing::debug!(
                chunk = %compilation.chunks[index].id,
                filename = %filename,
                "rendered chunk"
            );
            compilation
                .assets
                .emit(filename.clone(), AssetKind::Script, code.into_bytes());
            compilation.chunks[index].js_file = Some(filename);
        }
    }
    Ok(())
}

/// Result of a build, held in memory until written
#[derive(Debug)]
pub struct BuildOutput {
    pub out_dir: PathBuf,
    pub project_root: PathBuf,
    pub assets: OutputAssets,
    pub chunks: Vec<Chunk>,
    /// Set when the clean plugin runs; paths under the output root to keep
    pub reset: Option<Vec<PathBuf>>,
    /// Manifest lint findings
    pub warnings: Vec<String>,
}

impl BuildOutput {
    /// Write every asset under the output root
    ///
    /// The root is reset first when the clean plugin is configured, so a
    /// failed build leaves the previous output in place.
    pub fn write(&self) -> Result<Vec<PathBuf>> {
        self.write_to(&self.out_dir)
    }

    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if let Some(keep) = &self.reset {
            let removed = clean_output_dir(dir, &self.project_root, keep)?;
            tracing::debug!(dir = %dir.display(), removed, "cleaned output directory");
        }
        write_assets(&self.assets, dir)
    }

    pub fn chunk(&self, id: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.id == id)
    }

    /// Script file of an entry
    pub fn entry_file(&self, name: &str) -> Option<&str> {
        self.chunks
            .iter()
            .find(|c| c.is_entry() && c.id == name)
            .and_then(|c| c.js_file.as_deref())
    }

    /// Whether every output file is a stylesheet, compared with a previous build
    pub fn only_styles_changed(&self, previous: &OutputAssets) -> bool {
        let mut changed = self
            .assets
            .iter()
            .filter(|(name, asset)| {
                previous.get(name).map(|p| &p.content) != Some(&asset.content)
            })
            .peekable();
        let removed = previous.filenames().any(|name| !self.assets.contains(name));
        changed.peek().is_some()
            && !removed
            && changed.all(|(_, asset)| asset.kind == AssetKind::Style)
    }
}
