//! Top-level manifest structure for sheaf.
//!
//! This module provides the main `SheafConfig` struct and profile merging logic.
//! For file discovery, see the `discovery` module.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bundle::{
    ExtractCssOptions, HtmlPageOptions, Mode, ModuleOptions, OutputOptions, PluginSpec,
    ResolveOptions,
};
use crate::dev::DevServerConfig;
use crate::error::{ConfigError, Result as ConfigResult};

/// The build manifest
///
/// Constructed once per build and never mutated while the build runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheafConfig {
    #[serde(default)]
    pub mode: Mode,

    /// Project root override, relative to the manifest's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,

    /// Entry name to source module; declaration order is kept
    #[serde(default)]
    pub entry: IndexMap<String, PathBuf>,

    #[serde(default)]
    pub output: OutputOptions,

    #[serde(default)]
    pub module: ModuleOptions,

    #[serde(default)]
    pub resolve: ResolveOptions,

    #[serde(default)]
    pub plugins: Vec<PluginSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServerConfig>,

    /// Named overlays deep-merged over the manifest by `materialize_profile`
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub profiles: IndexMap<String, Value>,
}

impl SheafConfig {
    /// Create from serde_json::Value
    ///
    /// # Example
    ///
    /// ```
    /// use sheaf_config::SheafConfig;
    /// use serde_json::json;
    /// use std::path::PathBuf;
    ///
    /// let value = json!({
    ///     "entry": { "index": "./src/js/index.js" },
    ///     "mode": "production"
    /// });
    ///
    /// let config = SheafConfig::from_value(value).unwrap();
    /// assert_eq!(config.entry["index"], PathBuf::from("./src/js/index.js"));
    /// assert!(config.mode.is_production());
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Parse a TOML manifest
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let value = toml_to_value(source)?;
        Self::from_value(value)
    }

    /// Render the manifest as TOML
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            field: "toml".to_string(),
            hint: Some(e.to_string()),
        })
    }
}

impl SheafConfig {
    pub fn materialize_profile(mut self, profile: Option<&str>) -> ConfigResult<Self> {
        let Some(name) = profile else {
            return Ok(self);
        };

        let overrides = self
            .profiles
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
            })?;

        if overrides.is_null() {
            return Ok(self);
        }

        let profiles = std::mem::take(&mut self.profiles);
        let mut base =
            serde_json::to_value(&self).map_err(|err| ConfigError::InvalidProfileOverride {
                message: err.to_string(),
            })?;
        merge_values(&mut base, &overrides);

        let mut merged: SheafConfig =
            serde_json::from_value(base).map_err(|err| ConfigError::InvalidProfileOverride {
                message: format!("profile '{name}': {err}"),
            })?;
        merged.profiles = profiles;

        tracing::debug!(profile = name, "applied profile overrides");
        Ok(merged)
    }

    /// Project root: `context` resolved against the manifest directory
    pub fn project_root(&self, manifest_dir: &Path) -> PathBuf {
        match &self.context {
            Some(context) => manifest_dir.join(context),
            None => manifest_dir.to_path_buf(),
        }
    }

    /// Absolute output root for a project root
    pub fn output_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output.path)
    }

    pub fn html_pages(&self) -> impl Iterator<Item = &HtmlPageOptions> {
        self.plugins.iter().filter_map(|plugin| match plugin {
            PluginSpec::Html(page) => Some(page),
            _ => None,
        })
    }

    pub fn extract_css(&self) -> Option<&ExtractCssOptions> {
        self.plugins.iter().find_map(|plugin| match plugin {
            PluginSpec::ExtractCss(options) => Some(options),
            _ => None,
        })
    }

    pub fn has_plugin(&self, kind: &str) -> bool {
        self.plugins.iter().any(|plugin| plugin.kind() == kind)
    }

    /// Live reload is hot when the dev server asks for it or the HMR plugin is declared
    pub fn hot_enabled(&self) -> bool {
        self.dev_server.as_ref().is_some_and(|dev| dev.hot)
            || self.has_plugin("hot-module-replacement")
    }
}

pub(crate) fn toml_to_value(source: &str) -> ConfigResult<Value> {
    let toml_val: toml::Value = toml::from_str(source).map_err(|e| ConfigError::InvalidValue {
        field: "toml".to_string(),
        hint: Some(format!("Invalid TOML syntax: {}", e)),
    })?;

    serde_json::to_value(toml_val).map_err(|e| ConfigError::InvalidValue {
        field: "toml".to_string(),
        hint: Some(format!("TOML to JSON conversion failed: {}", e)),
    })
}

pub(crate) fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}
