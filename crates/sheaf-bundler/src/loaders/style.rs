use super::{AssetText, Loader, LoaderContext, Payload};
use crate::Result;

/// Injects a stylesheet into the document when the module runs
pub struct StyleLoader;

impl Loader for StyleLoader {
    fn name(&self) -> &'static str {
        "style"
    }

    fn run(&self, input: Payload, ctx: &mut LoaderContext<'_>) -> Result<Payload> {
        let text = match input {
            Payload::Css(text) => text,
            other => AssetText::plain(other.into_text(self.name(), ctx.resource)?),
        };
        Ok(Payload::Script(inject_style(&text.js_expr())))
    }
}

fn inject_style(css_expr: &str) -> String {
    format!(
        "var style = document.createElement(\"style\");\n\
         style.textContent = {css_expr};\n\
         document.head.appendChild(style);\n\
         module.exports = style;"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_css_in_an_injecting_script() {
        let code = inject_style(&AssetText::plain("a{color:red}").js_expr());
        assert!(code.contains(r#"style.textContent = "a{color:red}";"#));
        assert!(code.contains("document.head.appendChild(style)"));
    }
}
