use std::fs;
use std::path::Path;

use sheaf_config::HtmlPageOptions;

use super::{BuildPlugin, Compilation, PluginPhase};
use crate::loaders::AssetRef;
use crate::minify::minify_html;
use crate::output::AssetKind;
use crate::{Error, Result};

/// Generates one page from a template, linking the bundles of its entries
pub struct HtmlPagePlugin {
    page: HtmlPageOptions,
}

impl HtmlPagePlugin {
    pub fn new(page: HtmlPageOptions) -> Self {
        Self { page }
    }

    fn read_template(&self, path: &Path) -> Result<String> {
        let source = fs::read_to_string(path).map_err(|err| Error::Template {
            path: path.to_path_buf(),
            message: match err.kind() {
                std::io::ErrorKind::NotFound => "template not found".to_string(),
                _ => err.to_string(),
            },
        })?;
        if !self.page.is_templated() {
            return Ok(source);
        }

        let mut context = serde_json::Map::new();
        for (key, value) in &self.page.template_parameters {
            context.insert(key.clone(), value.clone());
        }
        if let Some(title) = &self.page.title {
            context.insert("title".to_string(), title.clone().into());
        }

        let env = minijinja::Environment::new();
        env.render_str(&source, serde_json::Value::Object(context))
            .map_err(|err| Error::Template {
                path: path.to_path_buf(),
                message: err.to_string(),
            })
    }
}

impl BuildPlugin for HtmlPagePlugin {
    fn name(&self) -> &'static str {
        "html"
    }

    fn phase(&self) -> PluginPhase {
        PluginPhase::Pages
    }

    fn process_assets(&self, compilation: &mut Compilation<'_>) -> Result<()> {
        let page_file = self.page.filename.as_str();
        let template = compilation.project_root.join(&self.page.template);
        let source = self.read_template(&template)?;
        let markup = compilation.pipeline.page_template(&template, source)?;

        let mut html = markup.render(|asset| match asset {
            AssetRef::Inline(uri) => uri.clone(),
            AssetRef::Emitted(file) => compilation.url_from(page_file, file),
        });

        let mut styles = String::new();
        let mut scripts = String::new();
        for name in compilation.config.entry.keys() {
            if !self.page.includes(name) {
                continue;
            }
            let Some(chunk) = compilation.entry_chunk(name) else {
                continue;
            };
            if let Some(css) = &chunk.css_file {
                let href = compilation.url_from(page_file, css);
                styles.push_str(&format!("<link rel=\"stylesheet\" href=\"{href}\">"));
            }
            if let Some(js) = &chunk.js_file {
                let src = compilation.url_from(page_file, js);
                scripts.push_str(&format!("<script src=\"{src}\"></script>"));
            }
        }

        inject_styles(&mut html, &styles);
        inject_scripts(&mut html, &scripts);

        let minify = self
            .page
            .minify
            .unwrap_or_else(|| compilation.config.mode.is_production());
        if minify {
            html = minify_html(&html);
        }

        tracing::debug!(page = %page_file, template = %template.display(), "generated page");
        compilation
            .assets
            .emit(page_file, AssetKind::Page, html.into_bytes());
        Ok(())
    }
}

fn find_tag(html: &str, tag: &str) -> Option<usize> {
    html.to_ascii_lowercase().find(tag)
}

/// Before `</head>`, else before `<body`, else at the top
fn inject_styles(html: &mut String, tags: &str) {
    if tags.is_empty() {
        return;
    }
    let at = find_tag(html, "</head>")
        .or_else(|| find_tag(html, "<body"))
        .unwrap_or(0);
    html.insert_str(at, tags);
}

/// Before `</body>`, else at the end
fn inject_scripts(html: &mut String, tags: &str) {
    if tags.is_empty() {
        return;
    }
    match find_tag(html, "</body>") {
        Some(at) => html.insert_str(at, tags),
        None => html.push_str(tags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_go_before_closing_head_and_body() {
        let mut html = "<html><head><title>x</title></head><body><main></main></BODY></html>".to_string();
        inject_styles(&mut html, "<link>");
        inject_scripts(&mut html, "<script></script>");
        assert_eq!(
            html,
            "<html><head><title>x</title><link></head><body><main></main><script></script></BODY></html>"
        );
    }

    #[test]
    fn fragments_get_tags_at_the_edges() {
        let mut html = "<main></main>".to_string();
        inject_styles(&mut html, "<link>");
        inject_scripts(&mut html, "<script></script>");
        assert_eq!(html, "<link><main></main><script></script>");
    }
}
