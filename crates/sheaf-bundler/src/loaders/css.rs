use super::{AssetText, Loader, LoaderContext, Payload};
use crate::Result;
use crate::graph::resolve::is_local_url;
use crate::graph::scan::scan_css_urls;

/// Routes local `url()` references through the asset rules
pub struct CssLoader;

impl Loader for CssLoader {
    fn name(&self) -> &'static str {
        "css"
    }

    fn run(&self, input: Payload, ctx: &mut LoaderContext<'_>) -> Result<Payload> {
        let css = match input {
            Payload::Css(text) if text.assets.is_empty() => text.code,
            other => other.into_text(self.name(), ctx.resource)?,
        };

        let mut text = AssetText::default();
        let mut last = 0;
        for found in scan_css_urls(&css) {
            if !is_local_url(&found.url) {
                continue;
            }
            let asset = ctx.asset(&found.url)?;
            text.code.push_str(&css[last..found.range.start]);
            let placeholder = text.push_asset(asset);
            text.code.push_str(&placeholder);
            last = found.range.end;
        }
        text.code.push_str(&css[last..]);
        Ok(Payload::Css(text))
    }
}
