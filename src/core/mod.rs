//! Core module - configuration, errors, units and table I/O

pub mod config;
pub mod error;
pub mod loader;
pub mod project;
pub mod units;
pub mod writer;

pub use config::{AnalysisConfig, Config};
pub use error::{
    AnalysisError, ConfigurationError, DataQualityError, DataQualityIssue, IssueKind,
};
pub use loader::{load_dataset, Layout, LoadError};
pub use project::{Project, ProjectError};
pub use units::Unit;
