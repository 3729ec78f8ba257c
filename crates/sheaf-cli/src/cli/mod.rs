//! Command-line interface definition.
//!
//! - `sheaf build` - build once and write the output root
//! - `sheaf dev` - build, serve, watch and rebuild
//! - `sheaf check` - validate the manifest without building
//! - `sheaf reconcile` - merge two drifting manifests into one

mod commands;
mod tests;

use clap::Parser;

pub use commands::{
    BuildArgs, CheckArgs, Command, ConfigArgs, DevArgs, ModeArg, PreferArg, ReconcileArgs,
};

/// sheaf - multi-page asset builder
#[derive(Parser, Debug)]
#[command(
    name = "sheaf",
    version,
    about = "Builds multi-page sites from scripts, stylesheets, images and page templates",
    long_about = "sheaf bundles one script per entry, extracts stylesheets into files,\n\
                  inlines or copies images, and generates an HTML page per template that\n\
                  references only the entries it lists."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
