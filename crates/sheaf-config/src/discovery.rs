//! File-based manifest discovery for CLI use
//!
//! Handles finding and loading sheaf manifests from the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::{SheafConfig, toml_to_value};
use crate::error::{ConfigError, Result};

/// Conventional manifest file name
pub const CONFIG_FILE_NAME: &str = "sheaf.toml";

/// Field holding the manifest inside `package.json`
pub const PACKAGE_JSON_FIELD: &str = "sheaf";

/// File-based manifest discovery
///
/// # Example
///
/// ```no_run
/// use sheaf_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// let config = discovery.load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    /// Create a new config discovery with a root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a manifest in the root directory
    ///
    /// Searches in this order:
    /// 1. sheaf.toml
    /// 2. package.json (sheaf field)
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join(CONFIG_FILE_NAME);
        if toml_path.exists() {
            return Some(toml_path);
        }

        let pkg_path = self.root.join("package.json");
        let content = fs::read_to_string(&pkg_path).ok()?;
        let parsed = serde_json::from_str::<Value>(&content).ok()?;
        match parsed.get(PACKAGE_JSON_FIELD) {
            Some(field) if !field.is_null() => Some(pkg_path),
            _ => None,
        }
    }

    /// Load the discovered manifest
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no manifest is found.
    pub fn load(&self) -> Result<SheafConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        load_from(&path)
    }

    /// Load the discovered manifest with a profile applied
    pub fn load_with_profile(&self, profile: &str) -> Result<SheafConfig> {
        self.load()?.materialize_profile(Some(profile))
    }
}

/// Load a manifest from a specific file
pub fn load_from(path: &Path) -> Result<SheafConfig> {
    let value = load_value(path)?;
    tracing::debug!(path = %path.display(), "loaded manifest");
    SheafConfig::from_value(value)
}

/// Read a manifest file as a raw value, before defaults are applied
///
/// `.toml` files are parsed as TOML; `package.json` yields its `sheaf`
/// field; any other `.json` file is read whole.
pub fn load_value(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }
    let content = fs::read_to_string(path)?;

    if path.file_name() == Some(std::ffi::OsStr::new("package.json")) {
        return package_json_field(&content);
    }

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
            field: path.display().to_string(),
            hint: Some(format!("Invalid JSON: {}", e)),
        }),
        _ => toml_to_value(&content),
    }
}

fn package_json_field(content: &str) -> Result<Value> {
    let parsed: Value = serde_json::from_str(content).map_err(|e| ConfigError::InvalidValue {
        field: "package.json".to_string(),
        hint: Some(format!("Invalid JSON: {}", e)),
    })?;

    match parsed.get(PACKAGE_JSON_FIELD) {
        Some(value) if !value.is_null() => Ok(value.clone()),
        Some(_) => Err(ConfigError::InvalidValue {
            field: PACKAGE_JSON_FIELD.to_string(),
            hint: Some("The 'sheaf' field cannot be null".to_string()),
        }),
        None => Err(ConfigError::InvalidValue {
            field: PACKAGE_JSON_FIELD.to_string(),
            hint: Some("Add a 'sheaf' field to your package.json".to_string()),
        }),
    }
}
