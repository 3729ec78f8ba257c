//! Status message functions for terminal output.
//!
//! All messages go to stderr so stdout stays free for command output such as
//! a reconciled manifest.

use owo_colors::{OwoColorize, Stream::Stderr, Style};

fn paint(text: &str, style: Style) -> String {
    text.if_supports_color(Stderr, |t| t.style(style)).to_string()
}

/// Print a success message.
pub fn success(message: &str) {
    eprintln!("{} {}", paint("✓", Style::new().green().bold()), message);
}

/// Print an info message.
pub fn info(message: &str) {
    eprintln!("{} {}", paint("ℹ", Style::new().blue().bold()), message);
}

/// Print a warning message.
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        paint("⚠", Style::new().yellow().bold()),
        paint(message, Style::new().yellow())
    );
}

/// Print an error message.
pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        paint("✗", Style::new().red().bold()),
        paint(message, Style::new().red())
    );
}

/// Print a debug message when `RUST_LOG` is set.
pub fn debug(message: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        eprintln!("{} {}", paint("⚙", Style::new().dimmed()), paint(message, Style::new().dimmed()));
    }
}
