//! Hole classification - reachability from the length/radius ratio
//!
//! A hole's ratio is bucketed into a severity tier using two ordered
//! thresholds `t_poor < t_critical`:
//!
//! | ratio                         | severity   | status        |
//! |-------------------------------|------------|---------------|
//! | `ratio < t_poor`              | `normal`   | `reachable`   |
//! | `t_poor <= ratio < t_critical`| `poor`     | `unreachable` |
//! | `ratio >= t_critical`         | `critical` | `unreachable` |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::ConfigurationError;

/// Severity tier of a hole's ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Poor,
    Critical,
}

impl Severity {
    /// Reachability implied by this tier
    pub fn reachability(self) -> Reachability {
        match self {
            Severity::Normal => Reachability::Reachable,
            Severity::Poor | Severity::Critical => Reachability::Unreachable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Poor => "poor",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a hole can be manufactured with standard tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Reachable,
    Unreachable,
}

impl Reachability {
    pub fn is_unreachable(self) -> bool {
        self == Reachability::Unreachable
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Reachability::Reachable => "reachable",
            Reachability::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ratio thresholds for the severity tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Ratios at or above this are `poor` (unreachable)
    pub t_poor: f64,

    /// Ratios at or above this are `critical`
    pub t_critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            t_poor: 20.0,
            t_critical: 80.0,
        }
    }
}

impl Thresholds {
    pub fn new(t_poor: f64, t_critical: f64) -> Self {
        Self { t_poor, t_critical }
    }

    /// Both thresholds positive and finite, `t_poor < t_critical`
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, value) in [("t_poor", self.t_poor), ("t_critical", self.t_critical)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::InvalidThreshold { name, value });
            }
        }
        if self.t_poor >= self.t_critical {
            return Err(ConfigurationError::NonMonotonicThresholds {
                t_poor: self.t_poor,
                t_critical: self.t_critical,
            });
        }
        Ok(())
    }
}

/// Classification result of a single hole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub status: Reachability,
    pub severity: Severity,
}

impl Classification {
    pub fn from_severity(severity: Severity) -> Self {
        Self {
            status: severity.reachability(),
            severity,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        self.status.is_unreachable()
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// Classifies holes against validated thresholds
#[derive(Debug, Clone, Copy)]
pub struct HoleClassifier {
    thresholds: Thresholds,
}

impl HoleClassifier {
    pub fn new(thresholds: Thresholds) -> Result<Self, ConfigurationError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn severity(&self, ratio: f64) -> Severity {
        if ratio >= self.thresholds.t_critical {
            Severity::Critical
        } else if ratio >= self.thresholds.t_poor {
            Severity::Poor
        } else {
            Severity::Normal
        }
    }

    pub fn classify(&self, ratio: f64) -> Classification {
        Classification::from_severity(self.severity(ratio))
    }
}

impl Default for HoleClassifier {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
        }
    }
}
