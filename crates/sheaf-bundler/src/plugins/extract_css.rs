use std::path::Path;

use sheaf_config::{ExtractCssOptions, TemplateVars, render_template};

use super::{BuildPlugin, Compilation, PluginPhase, relative_url};
use crate::loaders::AssetRef;
use crate::minify::minify_css;
use crate::output::AssetKind;
use crate::{Error, Result};

/// Writes one stylesheet per chunk from the CSS its modules extracted
pub struct ExtractCssPlugin {
    options: ExtractCssOptions,
}

impl ExtractCssPlugin {
    pub fn new(options: ExtractCssOptions) -> Self {
        Self { options }
    }
}

impl BuildPlugin for ExtractCssPlugin {
    fn name(&self) -> &'static str {
        "extract-css"
    }

    fn phase(&self) -> PluginPhase {
        PluginPhase::Styles
    }

    fn chunks_assembled(&self, compilation: &mut Compilation<'_>) -> Result<()> {
        let production = compilation.config.mode.is_production();
        let output_public_path = compilation.config.output.public_path.clone();

        for index in 0..compilation.chunks.len() {
            let chunk = &compilation.chunks[index];
            let fragments: Vec<_> = chunk
                .modules
                .iter()
                .filter_map(|id| compilation.graph.module(id)?.css.as_ref())
                .collect();
            if fragments.is_empty() {
                continue;
            }

            let template = if chunk.is_entry() {
                &self.options.filename
            } else {
                &self.options.chunk_filename
            };
            let vars = TemplateVars::named(chunk.template_name())
                .with_id(&chunk.id)
                .with_ext("css");

            // Only the directory matters for relative URLs.
            let unrendered: String = fragments.iter().map(|f| f.text.code.as_str()).collect();
            let provisional = render_template(template, &vars.with_content(unrendered.as_bytes()))?;

            let mut css = fragments
                .iter()
                .map(|fragment| {
                    fragment.text.render(|asset| match asset {
                        AssetRef::Inline(uri) => uri.clone(),
                        AssetRef::Emitted(file) => {
                            match fragment.public_path.as_ref().or(output_public_path.as_ref()) {
                                Some(public_path) => format!("{public_path}{file}"),
                                None => relative_url(&provisional, file),
                            }
                        }
                    })
                })
                .collect::<Vec<_>>()
                .join("\n");

            if production {
                css = minify_css(&css, &provisional).map_err(|message| Error::Loader {
                    loader: "extract-css",
                    path: Path::new(&provisional).to_path_buf(),
                    message,
                })?;
            }

            let filename = render_template(template, &vars.with_content(css.as_bytes()))?;
            tracing::debug!(chunk = %chunk.id, filename = %filename, "extracted stylesheet");

            compilation
                .assets
                .emit(filename.clone(), AssetKind::Style, css.into_bytes());
            compilation.chunks[index].css_file = Some(filename);
        }
        Ok(())
    }
}
