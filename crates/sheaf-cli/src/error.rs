//! Error handling for the sheaf CLI.
//!
//! `CliError` is what every command returns. Domain errors (`ConfigError`,
//! `BuildError`) convert into it automatically, and errors from the library
//! crates convert through them, so `?` works across the whole stack.
//!
//! # Example
//!
//! ```rust,no_run
//! use sheaf_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_template(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Page templates live under src/pages")
//! }
//! ```

mod miette;

use std::path::PathBuf;
use thiserror::Error;

pub use self::miette::{bundler_error_to_miette, cli_error_to_miette};

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Manifest discovery, loading and validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Build and write failures
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Development server errors
    #[error("Server error: {0}")]
    Server(String),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

/// Manifest errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No manifest was passed and none was discovered
    #[error("No sheaf manifest found in {}\n\nHint: Create a sheaf.toml, add a 'sheaf' field to package.json, or pass --config <path>", .0.display())]
    NotFound(PathBuf),

    /// The manifest parsed but is invalid
    #[error("{0}")]
    Manifest(#[from] sheaf_config::ConfigError),

    /// Merging file, environment and flags failed
    #[error("Failed to load configuration: {0}\n\nHint: Check the manifest and any SHEAF_* environment variables")]
    Load(String),

    /// `sheaf check --warnings` found lint warnings
    #[error("{count} manifest warning(s)\n\nHint: Fix the warnings above or run without --warnings")]
    Warnings { count: usize },
}

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Bundler(#[from] sheaf_bundler::Error),

    /// The output root is outside anything sheaf may write to
    #[error("Output directory is not writable: {}\n\nHint: Point output.path at a directory inside the project", .0.display())]
    OutputNotWritable(PathBuf),

    /// The blocking build task panicked or was cancelled
    #[error("Build task failed: {0}")]
    Task(String),
}

impl From<sheaf_bundler::Error> for CliError {
    fn from(err: sheaf_bundler::Error) -> Self {
        CliError::Build(BuildError::Bundler(err))
    }
}

impl From<sheaf_config::ConfigError> for CliError {
    fn from(err: sheaf_config::ConfigError) -> Self {
        CliError::Config(ConfigError::Manifest(err))
    }
}

/// Result type alias for CLI operations.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Attach context to errors.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into `FileNotFound` for `path`.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Append a hint to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CliError>,
{
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.into())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| CliError::Custom(format!("{}\n\nHint: {}", e.into(), hint)))
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| CliError::Custom(format!("{}: {}", msg, e.into())))
    }
}
