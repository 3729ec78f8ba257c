//! sheaf CLI library.
//!
//! The binary in `main.rs` is a thin wrapper; everything it runs lives here
//! so integration tests can drive commands directly.
//!
//! # Modules
//!
//! - [`cli`]: argument definitions
//! - [`commands`]: `build`, `dev`, `check` and `reconcile`
//! - [`dev`]: development server, file watcher and live reload state
//! - [`error`]: error hierarchy and miette conversion
//! - [`logger`]: tracing subscriber setup
//! - [`ui`]: status messages and formatting

pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{BuildError, CliError, ConfigError, Result, ResultExt};
