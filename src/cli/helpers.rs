//! Shared helper functions for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Format a float with `precision` decimals, dropping trailing zeros
pub fn format_float(value: f64, precision: usize) -> String {
    let s = format!("{:.prec$}", value, prec = precision);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Write `content` to `path`, or to stdout when no path is given
pub fn write_output(content: &str, path: Option<&Path>, quiet: bool) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            if !quiet {
                eprintln!(
                    "{} Report written to {}",
                    style("✓").green(),
                    style(path.display()).cyan()
                );
            }
        }
        None => print!("{}", content),
    }
    Ok(())
}
