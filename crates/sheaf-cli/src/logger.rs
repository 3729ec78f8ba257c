//! Logging setup for the sheaf CLI.
//!
//! Library crates emit `tracing` events; this module installs the subscriber
//! that prints them.
//!
//! # Example
//!
//! ```rust,no_run
//! use sheaf_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("starting build");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "sheaf_cli=debug,sheaf_bundler=debug,sheaf_config=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "sheaf_cli=info,sheaf_bundler=info,sheaf_config=info";

/// Initialize the tracing subscriber.
///
/// Filter precedence:
/// 1. `--verbose`: debug for sheaf crates
/// 2. `--quiet`: errors only
/// 3. `RUST_LOG`
/// 4. info for sheaf crates
///
/// Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Initialize the subscriber with an explicit filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Whether the terminal supports colors.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them; otherwise the
/// terminal is asked.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}
