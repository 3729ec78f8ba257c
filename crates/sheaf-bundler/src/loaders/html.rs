use super::{AssetRef, AssetText, Loader, LoaderContext, Payload};
use crate::Result;
use crate::graph::resolve::is_local_url;
use crate::graph::scan::scan_html_sources;

/// Routes media `src` attributes through the asset rules
pub struct HtmlLoader;

impl Loader for HtmlLoader {
    fn name(&self) -> &'static str {
        "html"
    }

    fn run(&self, input: Payload, ctx: &mut LoaderContext<'_>) -> Result<Payload> {
        let html = input.into_text(self.name(), ctx.resource)?;

        let mut found: Vec<(std::ops::Range<usize>, AssetRef)> = Vec::new();
        for source in scan_html_sources(&html) {
            if is_local_url(&source.url) {
                found.push((source.range, ctx.asset(&source.url)?));
            }
        }

        let mut text = AssetText::default();
        let mut last = 0;
        for (range, asset) in found {
            text.code.push_str(&html[last..range.start]);
            let placeholder = text.push_asset(asset);
            text.code.push_str(&placeholder);
            last = range.end;
        }
        text.code.push_str(&html[last..]);
        Ok(Payload::Html(text))
    }
}
