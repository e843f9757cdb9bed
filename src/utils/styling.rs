//! Terminal styling utilities
//!
//! Everything here goes to stderr: stdout may be a prediction sink.

use console::{style, Emoji};
use std::path::Path;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");

/// Print the application banner
pub fn print_banner(version: &str) {
    eprintln!();
    eprintln!(
        "    {} {}",
        style("cats").cyan().bold(),
        style("continuous action tree with smoothing").dim()
    );
    eprintln!("    {}", style(format!("v{}", version)).dim());
    eprintln!("    {}", style("━".repeat(50)).dim());
    eprintln!();
}

/// Print configuration card
pub fn print_config(data: &Path, stack: &[(String, String)], passes: usize, predictions: &[&Path]) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    eprintln!("    ┌{}┐", line);
    eprintln!("    │ {:<52} │", style("Configuration").cyan().bold());
    eprintln!("    ├{}┤", line);
    eprintln!("    │  {}Data:   {:<41}│", FOLDER, truncate_path(data, 40));
    for (name, value) in stack {
        let rendered = if value.is_empty() {
            format!("--{}", name)
        } else {
            format!("--{} {}", name, value)
        };
        eprintln!("    │  {}Stage:  {:<41}│", TARGET, truncate_string(&rendered, 40));
    }
    eprintln!("    │  {}Passes: {:<41}│", CHART, style(passes).yellow());
    for path in predictions {
        eprintln!("    │  {}Output: {:<41}│", SAVE, truncate_path(path, 40));
    }
    eprintln!("    └{}┘", line);
    eprintln!();
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("    {} {}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("    {} {}", WARN, style(message).yellow());
}

/// Print the final completion message
pub fn print_completion() {
    eprintln!();
    eprintln!("    {} {}", ROCKET, style("Run complete!").green().bold());
    eprintln!();
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max_len - 3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_keeps_tail() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("/very/long/path/to/data.dat", 12), ".../data.dat");
    }
}
