use super::{ExtractedCss, Loader, LoaderContext, Payload};
use crate::Result;

/// Hands a stylesheet to the extract-css plugin instead of the script bundle
pub struct ExtractCssLoader {
    pub public_path: Option<String>,
}

impl Loader for ExtractCssLoader {
    fn name(&self) -> &'static str {
        "extract-css"
    }

    fn run(&self, input: Payload, ctx: &mut LoaderContext<'_>) -> Result<Payload> {
        let text = match input {
            Payload::Css(text) => text,
            other => super::AssetText::plain(other.into_text(self.name(), ctx.resource)?),
        };
        Ok(Payload::Extracted(ExtractedCss {
            text,
            public_path: self.public_path.clone(),
        }))
    }
}
