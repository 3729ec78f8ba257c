use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bundle::helpers::{
    default_css_chunk_filename, default_css_filename, default_html_filename,
};

/// A plugin instance declared under `[[plugins]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PluginSpec {
    /// Generates one page from a template, wired to a subset of entries
    Html(HtmlPageOptions),

    /// Writes stylesheets collected by the `extract-css` loader to files
    ExtractCss(ExtractCssOptions),

    /// Empties the output directory before files are written
    Clean(CleanOptions),

    /// Injects the live-reload client during `sheaf dev`
    HotModuleReplacement,
}

impl PluginSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            PluginSpec::Html(_) => "html",
            PluginSpec::ExtractCss(_) => "extract-css",
            PluginSpec::Clean(_) => "clean",
            PluginSpec::HotModuleReplacement => "hot-module-replacement",
        }
    }
}

/// Options for one generated page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlPageOptions {
    /// Output path of the page, relative to the output root
    #[serde(default = "default_html_filename")]
    pub filename: String,

    /// Source template, relative to the project context
    pub template: PathBuf,

    /// Entries whose assets are injected; all entries when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<String>>,

    /// Overrides the mode's minification default for this page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Extra variables exposed to the template
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub template_parameters: IndexMap<String, Value>,
}

impl HtmlPageOptions {
    pub fn new(filename: impl Into<String>, template: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            template: template.into(),
            chunks: None,
            minify: None,
            title: None,
            template_parameters: IndexMap::new(),
        }
    }

    /// Whether the page includes assets of `entry`
    pub fn includes(&self, entry: &str) -> bool {
        self.chunks
            .as_ref()
            .is_none_or(|chunks| chunks.iter().any(|c| c == entry))
    }

    /// Whether the template goes through the template engine before injection
    pub fn is_templated(&self) -> bool {
        self.title.is_some() || !self.template_parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractCssOptions {
    /// Template for stylesheets of entry chunks
    #[serde(default = "default_css_filename")]
    pub filename: String,

    /// Template for stylesheets of dynamically imported chunks
    #[serde(default = "default_css_chunk_filename")]
    pub chunk_filename: String,
}

impl Default for ExtractCssOptions {
    fn default() -> Self {
        Self {
            filename: default_css_filename(),
            chunk_filename: default_css_chunk_filename(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanOptions {
    /// Paths under the output root that survive cleaning
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keep: Vec<PathBuf>,
}
