//! YAML parsing with source-located diagnostics

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse a YAML string, attributing errors to `filename`
pub fn parse_yaml<T: DeserializeOwned>(source: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(source)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, source, filename).into())
}

/// Read and parse a YAML file
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let source = std::fs::read_to_string(path).map_err(|source| YamlError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_yaml(&source, &path.display().to_string())
}
