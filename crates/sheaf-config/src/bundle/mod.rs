//! Build pipeline configuration: output rule, transform rules and plugins.

mod helpers;
mod output;
mod plugin;
mod rule;
mod types;

use serde::{Deserialize, Serialize};

pub use output::OutputOptions;
pub use plugin::{CleanOptions, ExtractCssOptions, HtmlPageOptions, PluginSpec};
pub use rule::{LoaderSpec, Rule};
pub use types::Mode;

use helpers::default_extensions;

/// Per-file transform rules (`[[module.rules]]`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleOptions {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Import resolution options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Extensions tried, in order, for relative imports written without one
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}
