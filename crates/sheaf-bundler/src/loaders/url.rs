use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use sheaf_config::{TemplateVars, render_template};

use super::{AssetRef, Loader, LoaderContext, Payload};
use crate::mime::content_type;
use crate::{Error, Result};

/// Inlines small files as data URIs and emits the rest under `name`
pub struct UrlLoader {
    pub limit: u64,
    pub name: String,
}

impl Loader for UrlLoader {
    fn name(&self) -> &'static str {
        "url"
    }

    fn run(&self, input: Payload, ctx: &mut LoaderContext<'_>) -> Result<Payload> {
        let bytes = match input {
            Payload::Source(bytes) => bytes,
            other => {
                return Err(Error::loader(
                    self.name(),
                    ctx.resource,
                    format!("cannot take {} as input", other.describe()),
                ));
            }
        };

        if (bytes.len() as u64) < self.limit {
            return Ok(Payload::Asset(AssetRef::Inline(data_uri(ctx.resource, &bytes))));
        }

        let filename = self.filename(ctx.resource, &bytes)?;
        ctx.emit_file(filename.clone(), bytes);
        Ok(Payload::Asset(AssetRef::Emitted(filename)))
    }
}

impl UrlLoader {
    fn filename(&self, path: &Path, bytes: &[u8]) -> Result<String> {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("asset");
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let vars = TemplateVars::named(stem).with_ext(ext).with_content(bytes);
        Ok(render_template(&self.name, &vars)?)
    }
}

fn data_uri(path: &Path, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        content_type(path),
        general_purpose::STANDARD.encode(bytes)
    )
}
