use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::bundle::helpers::{default_url_limit, default_url_name};

/// A transform rule: files whose path matches `test` run through `use`
///
/// Loaders execute last-declared-first, so `["extract-css", "css", "sass"]`
/// compiles SCSS, then collects `url()` references, then extracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Regular expression matched against the file path
    pub test: String,

    #[serde(rename = "use", deserialize_with = "deserialize_loaders")]
    pub loaders: Vec<LoaderSpec>,
}

impl Rule {
    pub fn new(test: impl Into<String>, loaders: Vec<LoaderSpec>) -> Self {
        Self {
            test: test.into(),
            loaders,
        }
    }

    /// Compile the `test` pattern
    pub fn matcher(&self) -> Result<Regex, regex::Error> {
        Regex::new(&self.test)
    }

    /// Loaders in execution order
    pub fn execution_order(&self) -> impl Iterator<Item = &LoaderSpec> {
        self.loaders.iter().rev()
    }
}

/// One step of a transform rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "loader", rename_all = "kebab-case")]
pub enum LoaderSpec {
    /// SCSS to CSS
    Sass,

    /// Makes stylesheet content part of the graph: resolves `url()` references
    Css,

    /// Injects the stylesheet at runtime with a `<style>` element
    Style,

    /// Hands the stylesheet to the `extract-css` plugin instead of the bundle
    ExtractCss {
        /// Prefix for asset URLs inside the extracted file
        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_path: Option<String>,
    },

    /// Inlines files below `limit` bytes as data URIs, emits the rest
    Url {
        #[serde(default = "default_url_limit")]
        limit: u64,

        /// Output name template for emitted files (`[name]`, `[ext]`, `[contenthash]`)
        #[serde(default = "default_url_name")]
        name: String,
    },

    /// Treats HTML as a module and routes its `src` attributes through the graph
    Html,
}

impl LoaderSpec {
    pub fn name(&self) -> &'static str {
        match self {
            LoaderSpec::Sass => "sass",
            LoaderSpec::Css => "css",
            LoaderSpec::Style => "style",
            LoaderSpec::ExtractCss { .. } => "extract-css",
            LoaderSpec::Url { .. } => "url",
            LoaderSpec::Html => "html",
        }
    }
}

// `use` entries may be a bare loader name or a table with options.
#[derive(Deserialize)]
#[serde(untagged)]
enum LoaderRepr {
    Name(String),
    Spec(LoaderSpec),
}

fn deserialize_loaders<'de, D>(deserializer: D) -> Result<Vec<LoaderSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<LoaderRepr>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|repr| match repr {
            LoaderRepr::Spec(spec) => Ok(spec),
            LoaderRepr::Name(name) => {
                LoaderSpec::deserialize(serde_json::json!({ "loader": name }))
                    .map_err(|_| D::Error::custom(format!("unknown loader '{name}'")))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_bare_and_table_loaders() {
        let rule: Rule = serde_json::from_value(json!({
            "test": "\\.scss$",
            "use": [{ "loader": "extract-css", "public_path": "../" }, "css", "sass"]
        }))
        .unwrap();

        assert_eq!(
            rule.loaders,
            vec![
                LoaderSpec::ExtractCss {
                    public_path: Some("../".into())
                },
                LoaderSpec::Css,
                LoaderSpec::Sass,
            ]
        );
        let order: Vec<_> = rule.execution_order().map(LoaderSpec::name).collect();
        assert_eq!(order, ["sass", "css", "extract-css"]);
    }

    #[test]
    fn url_loader_defaults() {
        let rule: Rule = serde_json::from_value(json!({
            "test": "\\.png$",
            "use": ["url"]
        }))
        .unwrap();

        assert_eq!(
            rule.loaders[0],
            LoaderSpec::Url {
                limit: 8192,
                name: "[name].[ext]".into()
            }
        );
    }

    #[test]
    fn rejects_unknown_loader() {
        let err = serde_json::from_value::<Rule>(json!({
            "test": "\\.less$",
            "use": ["less"]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("unknown loader 'less'"));
    }
}
