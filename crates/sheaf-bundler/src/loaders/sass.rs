use super::{AssetText, Loader, LoaderContext, Payload};
use crate::{Error, Result};

/// Compiles SCSS with `grass`; `@use`/`@import` resolve next to the file
pub struct SassLoader;

impl Loader for SassLoader {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn run(&self, input: Payload, ctx: &mut LoaderContext<'_>) -> Result<Payload> {
        let source = input.into_text(self.name(), ctx.resource)?;
        let mut options = grass::Options::default();
        if let Some(dir) = ctx.resource.parent() {
            options = options.load_path(dir);
        }
        if ctx.mode().is_production() {
            options = options.style(grass::OutputStyle::Compressed);
        }

        let css = grass::from_string(source, &options)
            .map_err(|err| Error::loader(self.name(), ctx.resource, err))?;
        Ok(Payload::Css(AssetText::plain(css)))
    }
}
