//! # sheaf-bundler
//!
//! Executes the build pipeline a sheaf manifest declares: builds a module
//! graph from each entry, runs every file through its transform rule, groups
//! modules into chunks, lets plugins emit stylesheets and pages, and writes
//! the result under the single output root.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sheaf_bundler::Bundler;
//! use sheaf_config::ConfigDiscovery;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigDiscovery::new(".").load()?;
//! let output = Bundler::new(config, ".").build()?;
//!
//! for (filename, asset) in output.assets.iter() {
//!     println!("{filename} ({} bytes)", asset.size());
//! }
//! output.write()?;
//! # Ok(()) }
//! ```

pub mod build;
pub mod chunk;
pub mod graph;
pub mod loaders;
pub mod mime;
pub mod minify;
pub mod output;
pub mod plugins;
pub mod runtime;

pub use build::{BuildOutput, Bundler, DevSession};
pub use chunk::{Chunk, ChunkKind};
pub use graph::{Module, ModuleGraph};
pub use output::{AssetKind, OutputAsset, OutputAssets};
pub use plugins::{BuildPlugin, Compilation, PluginPhase, PluginRegistry};

use std::path::PathBuf;

use sheaf_config::ConfigError;

/// Error types for sheaf-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The manifest failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error with context message.
    #[error("{message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// An import or asset reference could not be resolved.
    #[error("Cannot resolve '{specifier}' from {importer}")]
    UnresolvedImport { specifier: String, importer: PathBuf },

    /// A resolved file lies outside the project directory.
    #[error("Security violation: {path} - {reason}")]
    SecurityViolation { path: PathBuf, reason: String },

    /// A script is not valid JavaScript.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// No transform rule handles this file.
    #[error("No rule matches {path}")]
    NoMatchingRule { path: PathBuf },

    /// More than one transform rule matches this file.
    #[error("{path} matches both '{first}' and '{second}'")]
    AmbiguousRule {
        path: PathBuf,
        first: String,
        second: String,
    },

    /// A loader failed on a file.
    #[error("{loader} loader failed on {path}: {message}")]
    Loader {
        loader: &'static str,
        path: PathBuf,
        message: String,
    },

    /// A loader chain ended without a usable result.
    #[error("Rule for {path} produced {produced}, expected {expected}")]
    LoaderChain {
        path: PathBuf,
        produced: &'static str,
        expected: &'static str,
    },

    /// A page template could not be rendered.
    #[error("Template {path}: {message}")]
    Template { path: PathBuf, message: String },

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// The output directory is not safe to clean.
    #[error("Refusing to clean {path}: {reason}")]
    UnsafeClean { path: PathBuf, reason: String },

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),
}

/// Result type alias for sheaf-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn loader(
        loader: &'static str,
        path: impl Into<PathBuf>,
        message: impl ToString,
    ) -> Self {
        Error::Loader {
            loader,
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Config(_) => "INVALID_CONFIG",
            Error::Io(_) | Error::IoError { .. } => "IO_ERROR",
            Error::UnresolvedImport { .. } => "UNRESOLVED_IMPORT",
            Error::SecurityViolation { .. } => "SECURITY_VIOLATION",
            Error::Parse { .. } => "PARSE_ERROR",
            Error::NoMatchingRule { .. } => "NO_MATCHING_RULE",
            Error::AmbiguousRule { .. } => "AMBIGUOUS_RULE",
            Error::Loader { .. } => "LOADER_FAILED",
            Error::LoaderChain { .. } => "LOADER_CHAIN",
            Error::Template { .. } => "TEMPLATE_ERROR",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::UnsafeClean { .. } => "UNSAFE_CLEAN",
            Error::WriteFailure(_) => "WRITE_FAILURE",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Config(err) => err
                .hint()
                .map(|hint| Box::new(hint) as Box<dyn std::fmt::Display + '_>),
            Error::UnresolvedImport { specifier, .. } => Some(Box::new(format!(
                "Check that '{}' exists. Only relative imports ('./', '../') are bundled.",
                specifier
            ))),
            Error::SecurityViolation { .. } => Some(Box::new(
                "Imports and asset references must stay inside the project directory.",
            )),
            Error::Parse { .. } => Some(Box::new("Scripts are parsed as ES modules.")),
            Error::NoMatchingRule { path } => Some(Box::new(format!(
                "Add a [[module.rules]] entry whose `test` matches '{}'.",
                path.display()
            ))),
            Error::AmbiguousRule { .. } => Some(Box::new(
                "Each file must match exactly one rule. Narrow one of the `test` patterns.",
            )),
            Error::LoaderChain { .. } => Some(Box::new(
                "Stylesheets need `css` followed by `extract-css` or `style`; images need `url`.",
            )),
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{}' is invalid. Ensure it stays within the output directory.",
                path
            ))),
            Error::UnsafeClean { .. } => Some(Box::new(
                "Point output.path at a dedicated build directory such as \"dist\".",
            )),
            Error::WriteFailure(msg) => Some(Box::new(format!(
                "Failed to write file. Check disk space and permissions.\nError: {}",
                msg
            ))),
            _ => None,
        }
    }
}
