//! Formatting utilities for sizes, durations, and build summaries.

use console::Term;
use owo_colors::{OwoColorize, Stream::Stderr};
use std::time::Duration;

/// Size column of the build summary. Bytes stay whole; larger sizes use
/// binary multiples with two decimals, capped at gigabytes.
///
/// ```
/// use sheaf_cli::ui::format_size;
///
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const STEPS: [(&str, u64); 3] = [("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];

    STEPS
        .iter()
        .find(|(_, scale)| bytes >= *scale)
        .map(|(unit, scale)| format!("{:.2} {unit}", bytes as f64 / *scale as f64))
        .unwrap_or_else(|| format!("{bytes} B"))
}

/// Elapsed time of a build: `50ms`, `1.50s`, or `1m 30s` past a minute.
///
/// ```
/// use std::time::Duration;
/// use sheaf_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(elapsed: Duration) -> String {
    match elapsed.as_secs() {
        0 => format!("{}ms", elapsed.as_millis()),
        1..=59 => format!("{:.2}s", elapsed.as_secs_f64()),
        secs => format!("{}m {}s", secs / 60, secs % 60),
    }
}

/// Print the written files with their sizes.
///
/// `files` holds paths relative to the output root.
pub fn print_build_summary(files: &[(String, u64)], elapsed: Duration) {
    let width = (Term::stderr().size().1 as usize).clamp(20, 80);

    let title = "Build Summary";
    eprintln!(
        "\n{}",
        title.if_supports_color(Stderr, |t| t.bold().underline().to_string())
    );
    eprintln!("{}", "─".repeat(width));

    for (name, size) in files {
        let size = format_size(*size);
        eprintln!(
            "  {} {} {}",
            "▸".if_supports_color(Stderr, |t| t.blue()),
            name.if_supports_color(Stderr, |t| t.bold()),
            size.if_supports_color(Stderr, |t| t.dimmed())
        );
    }

    eprintln!("{}", "─".repeat(width));

    let total: u64 = files.iter().map(|(_, size)| size).sum();
    let total = format_size(total);
    let elapsed = format_duration(elapsed);
    eprintln!(
        "  {} {} in {} files, {}",
        "Total:".if_supports_color(Stderr, |t| t.bold()),
        total.if_supports_color(Stderr, |t| t.green()),
        files.len(),
        elapsed.if_supports_color(Stderr, |t| t.green())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(8192), "8.00 KB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn format_duration_units() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_millis(59_990)), "59.99s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}
