//! Error types for manifest loading and validation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Filesystem validation errors (for CLI use)
    #[error("entry '{name}' not found: {path}")]
    EntryNotFound { name: String, path: PathBuf },

    #[error("page template not found: {path}")]
    TemplateNotFound { path: PathBuf },

    // Manifest parsing/loading errors
    #[error("config not found")]
    NotFound,

    #[error("invalid config value for '{field}'{}", format_hint(.hint))]
    InvalidValue { field: String, hint: Option<String> },

    #[error("invalid profile override: {message}")]
    InvalidProfileOverride { message: String },

    #[error("unknown profile '{name}'")]
    UnknownProfile { name: String },

    // Schema validation errors (no filesystem checks)
    #[error("no entries specified")]
    NoEntries,

    #[error("schema validation failed: {message}")]
    SchemaValidation {
        message: String,
        hint: Option<String>,
    },

    #[error("invalid filename template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Help text attached to the error, if any.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { hint, .. } | Self::SchemaValidation { hint, .. } => {
                hint.as_deref()
            }
            Self::NoEntries => Some("Declare at least one entry under [entry]"),
            Self::NotFound => Some("Create a sheaf.toml or add a 'sheaf' field to package.json"),
            _ => None,
        }
    }
}

fn format_hint(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!(": {hint}"),
        None => String::new(),
    }
}
