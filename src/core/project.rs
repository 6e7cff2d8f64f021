//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration directory
pub const PROJECT_DIR: &str = ".hreach";

/// Represents an hreach project: a directory holding `.hreach/`
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .hreach/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project at the given path
    ///
    /// With `force`, an existing config file is overwritten with the
    /// defaults.
    pub fn init(path: &Path, force: bool) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let dir = root.join(PROJECT_DIR);
        if dir.exists() && !force {
            return Err(ProjectError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&dir).map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# hreach project configuration
# Uncomment a key to override the built-in default.

# Ratio (length / radius) at or above which a hole is unreachable
# t_poor: 20

# Ratio at or above which an unreachable hole is critical
# t_critical: 80

# Unreachable holes per object that turn its warning into an error
# escalation_threshold: 2

# Hole volume formula: cylinder or drill-point
# volume_model: cylinder

# Unit for rows without a units column: mm, cm or in
# units: mm

# Quantiles reported for every distribution
# quantiles: [0.0, 0.01, 0.05, 0.25, 0.5, 0.75, 0.95, 0.99, 1.0]

# Default summary format (md, json, yaml, tsv, csv)
# default_format: md
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .hreach configuration directory
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Get the project config file path
    pub fn config_path(&self) -> PathBuf {
        self.project_dir().join("config.yaml")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an hreach project (searched from {searched_from:?}). Run 'hreach init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("hreach project already exists at {0:?} (use --force to reset its config)")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
