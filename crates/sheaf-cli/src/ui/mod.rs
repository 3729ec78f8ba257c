//! Terminal output: status messages and human-readable formatting.
//!
//! ```no_run
//! use sheaf_cli::ui;
//!
//! ui::init_colors(false);
//! ui::info("Building 2 entries...");
//! ui::success("Build completed");
//! ```

mod format;
mod messages;

pub use format::{format_duration, format_size, print_build_summary};
pub use messages::{debug, error, info, success, warning};

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if color output should be enabled.
///
/// Respects `NO_COLOR` and `FORCE_COLOR`, then asks whether stderr is a terminal.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Decide once whether status messages are colored.
///
/// `--no-color` wins over everything else.
pub fn init_colors(no_color: bool) {
    owo_colors::set_override(!no_color && should_use_color());
}
