//! Command implementations.
//!
//! - [`build`] - build once and write the output root
//! - [`dev`] - development server with live reload
//! - [`check`] - manifest validation
//! - [`reconcile`] - manifest drift resolution
//!
//! Each command provides an `execute` function taking its parsed arguments.

pub mod build;
pub mod check;
pub mod dev;
pub mod reconcile;
pub mod utils;

pub use build::execute as build_execute;
pub use check::execute as check_execute;
pub use dev::execute as dev_execute;
pub use reconcile::execute as reconcile_execute;
