//! Error types for hole analysis
//!
//! Two failure families exist and both abort a run:
//!
//! - [`DataQualityError`] - one or more input records are unusable
//!   (zero radius, unknown object, non-numeric length, ...). Every offending
//!   record of the batch is reported at once.
//! - [`ConfigurationError`] - thresholds or quantiles are invalid. Raised
//!   before any record is processed.

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// Maximum number of issues listed in the diagnostic help text
const HELP_ISSUE_LIMIT: usize = 10;

/// What is wrong with a single record
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    /// Radius is exactly zero; ratio would be undefined
    ZeroRadius,
    /// A dimension is negative (or zero, for length)
    NonPositive { field: &'static str, value: f64 },
    /// A dimension is NaN or infinite
    NonFinite { field: &'static str },
    /// A derived quantity (ratio, converted dimension, volume) overflows
    Overflow { field: &'static str },
    /// A dimension could not be parsed as a number
    NonNumeric { field: &'static str, raw: String },
    /// A required field is empty
    MissingField { field: &'static str },
    /// The hole references an object that is not part of the dataset
    UnknownObject { object_id: String },
    /// The unit of measure is not supported
    UnknownUnit { unit: String },
    /// The hole identifier appears more than once
    DuplicateHole,
    /// The object identifier appears more than once
    DuplicateObject,
    /// The nested `holes` column is not a valid JSON hole list
    MalformedHoles { message: String },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::ZeroRadius => write!(f, "radius is 0"),
            IssueKind::NonPositive { field, value } => {
                write!(f, "{} must be > 0 (got {})", field, value)
            }
            IssueKind::NonFinite { field } => write!(f, "{} is not a finite number", field),
            IssueKind::Overflow { field } => write!(f, "{} overflows", field),
            IssueKind::NonNumeric { field, raw } => {
                write!(f, "{} is not numeric: '{}'", field, raw)
            }
            IssueKind::MissingField { field } => write!(f, "missing required field '{}'", field),
            IssueKind::UnknownObject { object_id } => {
                write!(f, "references unknown object '{}'", object_id)
            }
            IssueKind::UnknownUnit { unit } => {
                write!(f, "unsupported unit '{}' (expected mm, cm or in)", unit)
            }
            IssueKind::DuplicateHole => write!(f, "duplicate hole identifier"),
            IssueKind::DuplicateObject => write!(f, "duplicate object identifier"),
            IssueKind::MalformedHoles { message } => write!(f, "malformed holes list: {}", message),
        }
    }
}

/// A single offending record
#[derive(Debug, Clone, PartialEq)]
pub struct DataQualityIssue {
    /// Identifier of the offending record (hole id, object id or `row N`)
    pub record: String,
    pub kind: IssueKind,
}

impl DataQualityIssue {
    pub fn new(record: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            record: record.into(),
            kind,
        }
    }
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.record, self.kind)
    }
}

/// Input records failed the data-quality checks; the run was aborted
#[derive(Debug, Error, Diagnostic)]
#[error("data quality check failed: {} offending record(s)", .issues.len())]
#[diagnostic(code(hreach::data_quality))]
pub struct DataQualityError {
    pub issues: Vec<DataQualityIssue>,

    #[help]
    help: String,
}

impl DataQualityError {
    pub fn new(issues: Vec<DataQualityIssue>) -> Self {
        let mut help: Vec<String> = issues
            .iter()
            .take(HELP_ISSUE_LIMIT)
            .map(|i| i.to_string())
            .collect();
        if issues.len() > HELP_ISSUE_LIMIT {
            help.push(format!("... and {} more", issues.len() - HELP_ISSUE_LIMIT));
        }
        Self {
            help: help.join("\n"),
            issues,
        }
    }

    /// Identifiers of every offending record, in report order
    pub fn records(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.record.as_str()).collect()
    }
}

/// Invalid analysis configuration
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ConfigurationError {
    #[error("thresholds must satisfy t_poor < t_critical (got t_poor = {t_poor}, t_critical = {t_critical})")]
    #[diagnostic(code(hreach::config::thresholds))]
    NonMonotonicThresholds { t_poor: f64, t_critical: f64 },

    #[error("threshold {name} must be a positive finite number (got {value})")]
    #[diagnostic(code(hreach::config::threshold))]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("escalation threshold must be at least 1 (got {0})")]
    #[diagnostic(code(hreach::config::escalation))]
    InvalidEscalation(usize),

    #[error("quantile {0} is outside [0, 1]")]
    #[diagnostic(code(hreach::config::quantile))]
    InvalidQuantile(f64),

    #[error("invalid value '{value}' for {source_name}: {reason}")]
    #[diagnostic(code(hreach::config::value))]
    InvalidValue {
        source_name: String,
        value: String,
        reason: String,
    },
}

/// Any failure of an analysis run
#[derive(Debug, Error, Diagnostic)]
pub enum AnalysisError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    DataQuality(#[from] DataQualityError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigurationError),
}
