//! Conversion from CLI errors to miette reports.

use miette::Report;

use crate::error::{BuildError, CliError, ConfigError};

/// Convert a `CliError` into a miette report.
///
/// Bundler errors keep their diagnostic code and help text; manifest errors
/// carry their hint as help.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(BuildError::Bundler(e)) => bundler_error_to_miette(e),
        CliError::Config(ConfigError::Manifest(e)) => match e.hint() {
            Some(hint) => {
                let hint = hint.to_string();
                miette::miette!(help = hint, "Configuration error: {}", e)
            }
            None => miette::miette!("Configuration error: {}", e),
        },
        _ => miette::miette!("{}", err),
    }
}

/// Convert a bundler error into a miette report.
pub fn bundler_error_to_miette(err: sheaf_bundler::Error) -> Report {
    Report::new(err)
}
