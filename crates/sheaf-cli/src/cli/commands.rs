use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Available sheaf subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build every entry, stylesheet, image and page once
    ///
    /// Writes the output root declared by the manifest. With the clean
    /// plugin configured, files from earlier builds are removed first.
    Build(BuildArgs),

    /// Start the development server
    ///
    /// Builds, serves the output root over HTTP, watches the project and
    /// rebuilds on change. Connected pages reload, or swap stylesheets in
    /// place when hot mode is on.
    Dev(DevArgs),

    /// Validate the manifest without building
    ///
    /// Checks the schema, entry files and page templates, and reports
    /// manifest warnings such as duplicate page filenames.
    Check(CheckArgs),

    /// Merge two drifting manifests into one canonical manifest
    ///
    /// Prints a conflict report listing every option present in only one
    /// file or set differently in both, with the resolution applied.
    Reconcile(ReconcileArgs),
}

/// Manifest selection shared by commands that load one
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Manifest file (sheaf.toml, package.json or a JSON file)
    ///
    /// Without it, sheaf.toml and then package.json's "sheaf" field are
    /// searched in the working directory.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Named profile to apply from the manifest's [profiles] table
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Working directory
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Build mode; overrides the manifest and SHEAF_MODE
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Output root, relative to the project context
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DevArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Address to bind; defaults to dev_server.host
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on; defaults to dev_server.port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Swap stylesheets in place instead of reloading the page
    #[arg(long)]
    pub hot: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Treat manifest warnings as errors
    #[arg(long)]
    pub warnings: bool,
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Manifest whose values win by default
    #[arg(value_name = "PRIMARY")]
    pub primary: PathBuf,

    /// Manifest merged into the primary
    #[arg(value_name = "SECONDARY")]
    pub secondary: PathBuf,

    /// Which manifest wins when both set an option differently
    #[arg(long, value_enum, default_value = "primary")]
    pub prefer: PreferArg,

    /// Option path to remove from the result (repeatable)
    ///
    /// Examples:
    ///   --drop dev_server
    ///   --drop 'plugins[html:pages/index.html].minify'
    #[arg(long, value_name = "PATH")]
    pub drop: Vec<String>,

    /// Write the canonical manifest here instead of printing it
    #[arg(short, long, value_name = "FILE")]
    pub write: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Development,
    Production,
}

impl From<ModeArg> for sheaf_config::Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Development => sheaf_config::Mode::Development,
            ModeArg::Production => sheaf_config::Mode::Production,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PreferArg {
    Primary,
    Secondary,
}

impl From<PreferArg> for sheaf_config::Preference {
    fn from(prefer: PreferArg) -> Self {
        match prefer {
            PreferArg::Primary => sheaf_config::Preference::Primary,
            PreferArg::Secondary => sheaf_config::Preference::Secondary,
        }
    }
}
