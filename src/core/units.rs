//! Units of measure for hole dimensions
//!
//! All derived quantities (volume, distributions) are reported in
//! millimetres; dimensions recorded in other units are converted first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length unit of a hole's recorded dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Mm,
    Cm,
    In,
}

impl Unit {
    /// Multiplier converting a value in this unit to millimetres
    pub fn to_mm(self) -> f64 {
        match self {
            Unit::Mm => 1.0,
            Unit::Cm => 10.0,
            Unit::In => 25.4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::In => "in",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => Ok(Unit::Mm),
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => Ok(Unit::Cm),
            "in" | "inch" | "inches" | "\"" => Ok(Unit::In),
            _ => Err(format!(
                "Unsupported unit: '{}'. Supported: mm, cm, in",
                s.trim()
            )),
        }
    }
}
