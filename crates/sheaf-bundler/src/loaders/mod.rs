//! Transform rules and the loaders they chain.
//!
//! A file's loaders run last-declared-first, each receiving the previous
//! loader's [`Payload`]. The chain must end in something the graph can hold:
//! a script, an extracted stylesheet, an asset URL, or text that becomes a
//! string export.

mod css;
mod extract;
mod html;
mod sass;
mod style;
mod url;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use regex::Regex;
use sheaf_config::{LoaderSpec, Mode, SheafConfig};

use crate::graph::resolve::Resolver;
use crate::graph::scan::{JsImport, scan_js};
use crate::runtime::REQUIRE;
use crate::{Error, Result};

pub use css::CssLoader;
pub use extract::ExtractCssLoader;
pub use html::HtmlLoader;
pub use sass::SassLoader;
pub use style::StyleLoader;
pub use url::UrlLoader;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__SHEAF_ASSET_(\d+)__").expect("valid regex"));

/// Where a processed asset ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    /// A `data:` URI embedded in the referencing file
    Inline(String),
    /// A file under the output root, by relative path
    Emitted(String),
}

impl AssetRef {
    /// JavaScript expression evaluating to the asset's URL at runtime
    pub fn js_expr(&self) -> String {
        match self {
            AssetRef::Inline(uri) => js_string(uri),
            AssetRef::Emitted(file) => format!("{REQUIRE}.p + {}", js_string(file)),
        }
    }
}

/// Text whose asset references are placeholders until the output location is known
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetText {
    pub code: String,
    pub assets: Vec<AssetRef>,
}

impl AssetText {
    pub fn plain(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            assets: Vec::new(),
        }
    }

    /// Register an asset and return the placeholder standing in for its URL
    pub fn push_asset(&mut self, asset: AssetRef) -> String {
        let index = match self.assets.iter().position(|a| *a == asset) {
            Some(index) => index,
            None => {
                self.assets.push(asset);
                self.assets.len() - 1
            }
        };
        format!("__SHEAF_ASSET_{index}__")
    }

    /// Replace placeholders with URLs chosen by `url`
    pub fn render(&self, mut url: impl FnMut(&AssetRef) -> String) -> String {
        if self.assets.is_empty() {
            return self.code.clone();
        }
        PLACEHOLDER
            .replace_all(&self.code, |caps: &regex::Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.assets.get(i))
                    .map(&mut url)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// JavaScript expression building the text at runtime
    pub fn js_expr(&self) -> String {
        let mut parts = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(&self.code) {
            let (Some(whole), Some(asset)) = (
                caps.get(0),
                caps[1].parse::<usize>().ok().and_then(|i| self.assets.get(i)),
            ) else {
                continue;
            };
            if whole.start() > last {
                parts.push(js_string(&self.code[last..whole.start()]));
            }
            parts.push(asset.js_expr());
            last = whole.end();
        }
        if last < self.code.len() || parts.is_empty() {
            parts.push(js_string(&self.code[last..]));
        }
        parts.join(" + ")
    }
}

/// Value flowing between loaders
#[derive(Debug, Clone)]
pub enum Payload {
    /// Raw file content
    Source(Vec<u8>),
    /// Plain stylesheet text
    Css(AssetText),
    /// HTML text with media references routed through the graph
    Html(AssetText),
    /// A single asset URL
    Asset(AssetRef),
    /// A stylesheet handed to the extract-css plugin
    Extracted(ExtractedCss),
    /// Finished module code
    Script(String),
}

impl Payload {
    pub fn describe(&self) -> &'static str {
        match self {
            Payload::Source(_) => "raw source",
            Payload::Css(_) => "css",
            Payload::Html(_) => "html",
            Payload::Asset(_) => "an asset url",
            Payload::Extracted(_) => "an extracted stylesheet",
            Payload::Script(_) => "a script",
        }
    }

    pub(crate) fn into_text(self, loader: &'static str, path: &Path) -> Result<String> {
        match self {
            Payload::Source(bytes) => String::from_utf8(bytes)
                .map_err(|_| Error::loader(loader, path, "file is not valid UTF-8")),
            Payload::Css(text) | Payload::Html(text) if text.assets.is_empty() => Ok(text.code),
            Payload::Script(code) => Ok(code),
            other => Err(Error::loader(
                loader,
                path,
                format!("cannot take {} as input", other.describe()),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCss {
    pub text: AssetText,
    /// URL prefix for assets inside the extracted file, from the loader options
    pub public_path: Option<String>,
}

/// A step of a transform rule
pub trait Loader: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, input: Payload, ctx: &mut LoaderContext<'_>) -> Result<Payload>;
}

pub fn instantiate(spec: &LoaderSpec) -> Arc<dyn Loader> {
    match spec {
        LoaderSpec::Sass => Arc::new(SassLoader),
        LoaderSpec::Css => Arc::new(CssLoader),
        LoaderSpec::Style => Arc::new(StyleLoader),
        LoaderSpec::ExtractCss { public_path } => Arc::new(ExtractCssLoader {
            public_path: public_path.clone(),
        }),
        LoaderSpec::Url { limit, name } => Arc::new(UrlLoader {
            limit: *limit,
            name: name.clone(),
        }),
        LoaderSpec::Html => Arc::new(HtmlLoader),
    }
}

/// What a loader can see and do while processing one file
pub struct LoaderContext<'a> {
    pub resource: &'a Path,
    pipeline: &'a mut Pipeline,
}

impl LoaderContext<'_> {
    pub fn mode(&self) -> Mode {
        self.pipeline.mode
    }

    /// Process a file referenced from the current resource and return its URL
    pub fn asset(&mut self, url: &str) -> Result<AssetRef> {
        let path = self.pipeline.resolver.resolve_url(url, self.resource)?;
        self.pipeline.asset_at(&path)
    }

    /// Queue a file for the output root
    pub fn emit_file(&mut self, filename: String, content: Vec<u8>) {
        tracing::debug!(filename = %filename, source = %self.resource.display(), "emitting asset");
        self.pipeline.emitted.insert(filename, content);
    }
}

struct CompiledRule {
    pattern: String,
    test: Regex,
    loaders: Vec<Arc<dyn Loader>>,
}

/// A module as loaded from disk, before its imports are resolved
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub body: ModuleBody,
    pub css: Option<ExtractedCss>,
    pub imports: Vec<JsImport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleBody {
    /// ES module or CommonJS source, rewritten when the bundle is rendered
    Script(String),
    /// CommonJS code produced by loaders
    Generated(String),
}

/// Runs transform rules over files and keeps per-build asset state
pub struct Pipeline {
    resolver: Resolver,
    rules: Arc<[CompiledRule]>,
    mode: Mode,
    asset_cache: HashMap<PathBuf, AssetRef>,
    emitted: IndexMap<String, Vec<u8>>,
}

impl Pipeline {
    pub fn new(config: &SheafConfig, project_root: &Path) -> Result<Self> {
        let rules = config
            .module
            .rules
            .iter()
            .map(|rule| {
                let test = rule.matcher().map_err(|err| {
                    Error::Config(sheaf_config::ConfigError::SchemaValidation {
                        message: format!("rule test '{}' is not a valid regex", rule.test),
                        hint: Some(err.to_string()),
                    })
                })?;
                Ok(CompiledRule {
                    pattern: rule.test.clone(),
                    test,
                    loaders: rule.loaders.iter().map(instantiate).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            resolver: Resolver::new(project_root, config.resolve.extensions.clone()),
            rules: rules.into(),
            mode: config.mode,
            asset_cache: HashMap::new(),
            emitted: IndexMap::new(),
        })
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Index of the single rule matching `path`
    fn rule_for(&self, path: &Path) -> Result<Option<usize>> {
        let subject = path.to_string_lossy().replace('\\', "/");
        let mut matching = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.test.is_match(&subject));

        let Some((index, first)) = matching.next() else {
            return Ok(None);
        };
        if let Some((_, second)) = matching.next() {
            return Err(Error::AmbiguousRule {
                path: path.to_path_buf(),
                first: first.pattern.clone(),
                second: second.pattern.clone(),
            });
        }
        Ok(Some(index))
    }

    pub(crate) fn context<'a>(&'a mut self, resource: &'a Path) -> LoaderContext<'a> {
        LoaderContext {
            resource,
            pipeline: self,
        }
    }

    fn run_rule(&mut self, index: usize, path: &Path, input: Payload) -> Result<Payload> {
        let rules = Arc::clone(&self.rules);
        let mut payload = input;
        for loader in rules[index].loaders.iter().rev() {
            payload = loader.run(payload, &mut self.context(path))?;
        }
        Ok(payload)
    }

    fn read(path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| Error::IoError {
            message: format!("Failed to read {}", path.display()),
            source: e,
        })
    }

    /// Load a file reached through the graph
    pub fn load(&mut self, path: &Path) -> Result<LoadedModule> {
        if let Some(asset) = self.asset_cache.get(path) {
            return Ok(LoadedModule::generated(export(&asset.js_expr())));
        }

        let Some(index) = self.rule_for(path)? else {
            return self.load_native(path);
        };

        let source = Self::read(path)?;
        let payload = self.run_rule(index, path, Payload::Source(source))?;
        tracing::debug!(path = %path.display(), result = payload.describe(), "loaded module");

        match payload {
            Payload::Script(code) => Ok(LoadedModule::generated(code)),
            Payload::Extracted(css) => Ok(LoadedModule {
                body: ModuleBody::Generated(String::new()),
                css: Some(css),
                imports: Vec::new(),
            }),
            Payload::Asset(asset) => {
                let module = LoadedModule::generated(export(&asset.js_expr()));
                self.asset_cache.insert(path.to_path_buf(), asset);
                Ok(module)
            }
            Payload::Css(text) | Payload::Html(text) => {
                Ok(LoadedModule::generated(export(&text.js_expr())))
            }
            Payload::Source(_) => Err(Error::LoaderChain {
                path: path.to_path_buf(),
                produced: "raw source",
                expected: "a module",
            }),
        }
    }

    // Scripts and JSON need no rule.
    fn load_native(&mut self, path: &Path) -> Result<LoadedModule> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "js" | "mjs" | "cjs" => {
                let source = String::from_utf8(Self::read(path)?).map_err(|_| {
                    Error::loader("script", path, "file is not valid UTF-8")
                })?;
                let imports = scan_js(&source, path)?;
                Ok(LoadedModule {
                    body: ModuleBody::Script(source),
                    css: None,
                    imports,
                })
            }
            "json" => {
                let value: serde_json::Value = serde_json::from_slice(&Self::read(path)?)
                    .map_err(|e| Error::loader("json", path, e))?;
                Ok(LoadedModule::generated(export(&value.to_string())))
            }
            _ => Err(Error::NoMatchingRule {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Process `path` as an asset, once per build
    pub fn asset_at(&mut self, path: &Path) -> Result<AssetRef> {
        if let Some(asset) = self.asset_cache.get(path) {
            return Ok(asset.clone());
        }
        let index = self.rule_for(path)?.ok_or_else(|| Error::NoMatchingRule {
            path: path.to_path_buf(),
        })?;
        let source = Self::read(path)?;
        match self.run_rule(index, path, Payload::Source(source))? {
            Payload::Asset(asset) => {
                self.asset_cache.insert(path.to_path_buf(), asset.clone());
                Ok(asset)
            }
            other => Err(Error::LoaderChain {
                path: path.to_path_buf(),
                produced: other.describe(),
                expected: "an asset url",
            }),
        }
    }

    /// Run a page template through its rule, if one matches
    ///
    /// Templates without a rule are used as they are.
    pub fn page_template(&mut self, path: &Path, source: String) -> Result<AssetText> {
        let Some(index) = self.rule_for(path)? else {
            return Ok(AssetText::plain(source));
        };
        match self.run_rule(index, path, Payload::Source(source.into_bytes()))? {
            Payload::Html(text) => Ok(text),
            other => Err(Error::LoaderChain {
                path: path.to_path_buf(),
                produced: other.describe(),
                expected: "html",
            }),
        }
    }

    /// Files emitted by loaders so far
    pub fn take_emitted(&mut self) -> IndexMap<String, Vec<u8>> {
        std::mem::take(&mut self.emitted)
    }
}

impl LoadedModule {
    fn generated(code: String) -> Self {
        Self {
            body: ModuleBody::Generated(code),
            css: None,
            imports: Vec::new(),
        }
    }
}

fn export(expr: &str) -> String {
    format!("module.exports = {expr};")
}

/// JavaScript string literal
pub(crate) fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_text_renders_placeholders() {
        let mut text = AssetText::default();
        let a = text.push_asset(AssetRef::Emitted("image/big.png".into()));
        let b = text.push_asset(AssetRef::Inline("data:image/gif;base64,R0lG".into()));
        let again = text.push_asset(AssetRef::Emitted("image/big.png".into()));
        assert_eq!(a, again);
        text.code = format!(".a{{background:url({a})}}.b{{background:url({b})}}");

        let rendered = text.render(|asset| match asset {
            AssetRef::Emitted(file) => format!("../{file}"),
            AssetRef::Inline(uri) => uri.clone(),
        });
        assert_eq!(
            rendered,
            ".a{background:url(../image/big.png)}.b{background:url(data:image/gif;base64,R0lG)}"
        );
    }

    #[test]
    fn asset_text_becomes_runtime_expression() {
        let mut text = AssetText::plain("");
        let p = text.push_asset(AssetRef::Emitted("image/a.png".into()));
        text.code = format!("<img src=\"{p}\">");

        assert_eq!(
            text.js_expr(),
            format!(r#""<img src=\"" + {REQUIRE}.p + "image/a.png" + "\">""#)
        );
        assert_eq!(AssetText::plain("").js_expr(), r#""""#);
    }
}
