//! Pluggable manifest validation strategies
//!
//! Separates filesystem validation (for CLI use) from schema validation.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::bundle::{LoaderSpec, PluginSpec};
use crate::config::SheafConfig;
use crate::error::{ConfigError, Result};
use crate::template::{check_template, is_distinguishing};

/// Trait for pluggable manifest validation strategies
pub trait ConfigValidator {
    fn validate(&self, config: &SheafConfig) -> Result<()>;
}

/// Schema-only validation (no filesystem checks)
///
/// # Example
///
/// ```
/// use sheaf_config::{ConfigValidator, SchemaValidator, SheafConfig};
///
/// let mut config = SheafConfig::default();
/// config.entry.insert("index".into(), "./src/js/index.js".into());
///
/// SchemaValidator.validate(&config).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &SheafConfig) -> Result<()> {
        if config.entry.is_empty() {
            return Err(ConfigError::NoEntries);
        }

        for (name, path) in &config.entry {
            if name.trim().is_empty() || path.as_os_str().is_empty() {
                return Err(schema_error(
                    "entry names and paths cannot be empty",
                    "Write entries as name = \"./path/to/module.js\"",
                ));
            }
        }

        if config.output.path.as_os_str().is_empty() {
            return Err(schema_error(
                "output.path cannot be empty",
                "Set output.path to a directory such as \"dist\"",
            ));
        }

        validate_output_templates(config)?;
        validate_rules(config)?;
        validate_plugins(config)?;

        Ok(())
    }
}

fn schema_error(message: impl Into<String>, hint: impl Into<String>) -> ConfigError {
    ConfigError::SchemaValidation {
        message: message.into(),
        hint: Some(hint.into()),
    }
}

fn validate_output_templates(config: &SheafConfig) -> Result<()> {
    check_template(&config.output.filename)?;
    check_template(&config.output.chunk_filename)?;

    // Entries share one output root and differ only by template substitution.
    if config.entry.len() > 1 && !is_distinguishing(&config.output.filename) {
        return Err(schema_error(
            format!(
                "output.filename '{}' would give every entry the same file",
                config.output.filename
            ),
            "Include [name] in output.filename",
        ));
    }

    if let Some(css) = config.extract_css() {
        check_template(&css.filename)?;
        check_template(&css.chunk_filename)?;
        if config.entry.len() > 1 && !is_distinguishing(&css.filename) {
            return Err(schema_error(
                format!(
                    "extract-css filename '{}' would give every entry the same stylesheet",
                    css.filename
                ),
                "Include [name] in the extract-css filename",
            ));
        }
    }

    Ok(())
}

fn validate_rules(config: &SheafConfig) -> Result<()> {
    for rule in &config.module.rules {
        rule.matcher().map_err(|err| ConfigError::SchemaValidation {
            message: format!("rule test '{}' is not a valid regex", rule.test),
            hint: Some(err.to_string()),
        })?;

        if rule.loaders.is_empty() {
            return Err(schema_error(
                format!("rule '{}' has no loaders", rule.test),
                "List at least one loader under `use`",
            ));
        }

        for loader in &rule.loaders {
            match loader {
                LoaderSpec::Url { name, .. } => check_template(name)?,
                LoaderSpec::ExtractCss { .. } if config.extract_css().is_none() => {
                    return Err(schema_error(
                        format!(
                            "rule '{}' uses the extract-css loader without the extract-css plugin",
                            rule.test
                        ),
                        "Add [[plugins]] kind = \"extract-css\"",
                    ));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn validate_plugins(config: &SheafConfig) -> Result<()> {
    let mut singletons: HashMap<&str, usize> = HashMap::new();

    for plugin in &config.plugins {
        match plugin {
            PluginSpec::Html(page) => {
                if page.template.as_os_str().is_empty() {
                    return Err(schema_error(
                        format!("page '{}' has no template", page.filename),
                        "Set `template` to an HTML file",
                    ));
                }
                if page.filename.trim().is_empty() {
                    return Err(schema_error(
                        "page filename cannot be empty",
                        "Set `filename`, e.g. \"pages/index.html\"",
                    ));
                }
                for chunk in page.chunks.iter().flatten() {
                    if !config.entry.contains_key(chunk) {
                        return Err(ConfigError::SchemaValidation {
                            message: format!(
                                "page '{}' lists unknown entry '{}'",
                                page.filename, chunk
                            ),
                            hint: Some(format!(
                                "Known entries: {}",
                                config.entry.keys().cloned().collect::<Vec<_>>().join(", ")
                            )),
                        });
                    }
                }
            }
            other => *singletons.entry(other.kind()).or_default() += 1,
        }
    }

    if let Some((kind, _)) = singletons.iter().find(|(_, count)| **count > 1) {
        return Err(schema_error(
            format!("plugin '{kind}' is declared more than once"),
            "Keep a single instance of this plugin",
        ));
    }

    Ok(())
}

/// Filesystem validator (for CLI use)
///
/// Checks that entries and page templates exist relative to the project root.
pub struct FsValidator {
    root: PathBuf,
}

impl FsValidator {
    /// Create a new filesystem validator with a root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ConfigValidator for FsValidator {
    fn validate(&self, config: &SheafConfig) -> Result<()> {
        SchemaValidator.validate(config)?;

        for (name, entry) in &config.entry {
            let path = self.root.join(entry);
            if !path.is_file() {
                return Err(ConfigError::EntryNotFound {
                    name: name.clone(),
                    path,
                });
            }
        }

        for page in config.html_pages() {
            let path = self.root.join(&page.template);
            if !path.is_file() {
                return Err(ConfigError::TemplateNotFound { path });
            }
        }

        Ok(())
    }
}

/// Convenience function for schema-only validation
pub fn validate_schema(config: &SheafConfig) -> Result<()> {
    SchemaValidator.validate(config)
}

/// Convenience function for filesystem validation
pub fn validate_fs(config: &SheafConfig, root: impl AsRef<Path>) -> Result<()> {
    FsValidator::new(root).validate(config)
}

/// A manifest smell that does not stop a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Report manifest smells: duplicate pages, unused plugins, no-op options
pub fn lint(config: &SheafConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    let mut warn = |message: String| warnings.push(ConfigWarning { message });

    let mut pages: HashMap<&str, usize> = HashMap::new();
    for page in config.html_pages() {
        *pages.entry(page.filename.as_str()).or_default() += 1;
    }
    let mut duplicates: Vec<_> = pages.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicates.sort();
    for (filename, count) in duplicates {
        warn(format!(
            "{count} html plugins write '{filename}'; only the last one is kept"
        ));
    }

    let uses_extract = config
        .module
        .rules
        .iter()
        .flat_map(|rule| &rule.loaders)
        .any(|loader| matches!(loader, LoaderSpec::ExtractCss { .. }));
    if config.extract_css().is_some() && !uses_extract {
        warn("extract-css plugin is declared but no rule uses the extract-css loader".into());
    }

    if config.has_plugin("hot-module-replacement") && config.mode.is_production() {
        warn("hot-module-replacement has no effect on production builds".into());
    }

    if !config.has_plugin("clean") {
        warn("no clean plugin: files from earlier builds stay in the output directory".into());
    }

    warnings
}
