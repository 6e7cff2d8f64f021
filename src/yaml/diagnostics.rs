//! Config file diagnostics with source spans

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::core::config::VALID_KEYS;

/// Malformed config file, pointing at the offending location
#[derive(Debug, Error, Diagnostic)]
#[error("invalid config file: {message}")]
#[diagnostic(code(hreach::config::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    /// Build a diagnostic from a serde_yml error and the file it came from
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors from reading a YAML file
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("cannot read {path}: {source}")]
    #[diagnostic(code(hreach::config::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convert 1-based line/column to a byte offset, clamped to the source
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut line_start = 0;
    for (n, text) in source.split_inclusive('\n').enumerate() {
        if n + 1 == line {
            let within = text
                .char_indices()
                .nth(column.saturating_sub(1))
                .map(|(i, _)| i)
                .unwrap_or(text.len().saturating_sub(1));
            return line_start + within;
        }
        line_start += text.len();
    }
    source.len().saturating_sub(1)
}

fn generate_help(message: &str) -> Option<String> {
    let msg_lower = message.to_lowercase();

    if msg_lower.contains("unknown field") {
        let keys: Vec<&str> = VALID_KEYS.iter().map(|(k, _)| *k).collect();
        return Some(format!("Valid keys: {}", keys.join(", ")));
    }

    if msg_lower.contains("unknown variant") {
        return Some("Check the allowed values with 'hreach config keys'".to_string());
    }

    if msg_lower.contains("invalid type") {
        return Some("Thresholds are numbers, quantiles a list: [0.5, 0.95]".to_string());
    }

    if msg_lower.contains("tab") {
        return Some(
            "YAML requires spaces for indentation, not tabs. Replace tabs with spaces.".to_string(),
        );
    }

    if msg_lower.contains("duplicate key") {
        return Some("Each key can only appear once. Remove the duplicate key.".to_string());
    }

    if msg_lower.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have incorrect indentation.".to_string());
    }

    None
}
