//! Configuration management with layered hierarchy
//!
//! Sources are merged in priority order (later wins):
//!
//! 1. Built-in defaults ([`AnalysisConfig::default`])
//! 2. Global user config (`~/.config/hreach/config.yaml`)
//! 3. Project config (`.hreach/config.yaml`, found by walking up)
//! 4. An explicit `--config <file>`
//! 5. Environment variables (`HREACH_T_POOR`, `HREACH_T_CRITICAL`,
//!    `HREACH_ESCALATION`, `HREACH_UNITS`, `HREACH_VOLUME_MODEL`,
//!    `HREACH_FORMAT`)
//! 6. Command-line flags (applied by the CLI)

use miette::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::aggregate::DEFAULT_ESCALATION_THRESHOLD;
use crate::analysis::classify::Thresholds;
use crate::analysis::geometry::VolumeModel;
use crate::analysis::stats::DEFAULT_QUANTILES;
use crate::core::error::ConfigurationError;
use crate::core::project::Project;
use crate::core::units::Unit;

/// Fully resolved settings of an analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub thresholds: Thresholds,
    pub escalation_threshold: usize,
    pub volume_model: VolumeModel,
    /// Unit assumed for rows without a units column
    pub default_units: Unit,
    pub quantiles: Vec<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
            volume_model: VolumeModel::default(),
            default_units: Unit::default(),
            quantiles: DEFAULT_QUANTILES.to_vec(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.thresholds.validate()?;
        if self.escalation_threshold < 1 {
            return Err(ConfigurationError::InvalidEscalation(
                self.escalation_threshold,
            ));
        }
        if let Some(&q) = self
            .quantiles
            .iter()
            .find(|q| !(0.0..=1.0).contains(*q))
        {
            return Err(ConfigurationError::InvalidQuantile(q));
        }
        Ok(())
    }
}

/// Keys accepted in config files
pub const VALID_KEYS: &[(&str, &str)] = &[
    ("t_poor", "Ratio at or above which a hole is unreachable (poor)"),
    ("t_critical", "Ratio at or above which a hole is critical"),
    (
        "escalation_threshold",
        "Unreachable holes per object that raise the error flag",
    ),
    ("volume_model", "Hole volume formula (cylinder, drill-point)"),
    ("units", "Unit for rows without a units column (mm, cm, in)"),
    ("quantiles", "Quantiles reported in distributions (list, 0..1)"),
    ("default_format", "Default summary format (md, json, yaml, tsv, csv)"),
];

/// One configuration layer; unset keys fall through to lower layers
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_poor: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_critical: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_threshold: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_model: Option<VolumeModel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Unit>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantiles: Option<Vec<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all file and environment sources
    ///
    /// Missing files are skipped; malformed files are reported with their
    /// source location.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let project = Project::discover().ok().map(|p| p.config_path());
        Self::load_from(
            Self::global_config_path().as_deref(),
            project.as_deref(),
            explicit,
            |key| std::env::var(key).ok(),
        )
    }

    /// Load configuration from the given sources (later wins)
    pub fn load_from<F>(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        for path in [global, project].into_iter().flatten() {
            if path.exists() {
                config.merge(Self::read(path)?);
            }
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(miette::miette!("Config file not found: {}", path.display()));
            }
            config.merge(Self::read(path)?);
        }

        config.merge(Self::from_env(env)?);
        Ok(config)
    }

    /// Merge the global and project files, with `edited` standing in for
    /// whichever of them lives at `edited_path`
    ///
    /// Used to check an edit against the layers it will be combined with.
    pub fn merge_files_with(
        global: Option<&Path>,
        project: Option<&Path>,
        edited_path: &Path,
        edited: Config,
    ) -> Result<Self> {
        let mut config = Config::default();
        let mut edited = Some(edited);
        for path in [global, project].into_iter().flatten() {
            if path == edited_path {
                if let Some(layer) = edited.take() {
                    config.merge(layer);
                }
            } else if path.exists() {
                config.merge(Self::read(path)?);
            }
        }
        if let Some(layer) = edited {
            config.merge(layer);
        }
        Ok(config)
    }

    /// Read a single config file
    pub fn read(path: &Path) -> Result<Self> {
        let config: Option<Config> = crate::yaml::parse_yaml_file(path)?;
        Ok(config.unwrap_or_default())
    }

    fn from_env<F>(env: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            t_poor: parse_env(&env, "HREACH_T_POOR")?,
            t_critical: parse_env(&env, "HREACH_T_CRITICAL")?,
            escalation_threshold: parse_env(&env, "HREACH_ESCALATION")?,
            volume_model: parse_env(&env, "HREACH_VOLUME_MODEL")?,
            units: parse_env(&env, "HREACH_UNITS")?,
            quantiles: None,
            default_format: env("HREACH_FORMAT").filter(|s| !s.trim().is_empty()),
        })
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "hreach")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.t_poor.is_some() {
            self.t_poor = other.t_poor;
        }
        if other.t_critical.is_some() {
            self.t_critical = other.t_critical;
        }
        if other.escalation_threshold.is_some() {
            self.escalation_threshold = other.escalation_threshold;
        }
        if other.volume_model.is_some() {
            self.volume_model = other.volume_model;
        }
        if other.units.is_some() {
            self.units = other.units;
        }
        if other.quantiles.is_some() {
            self.quantiles = other.quantiles;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Resolve into analysis settings on top of the built-in defaults
    ///
    /// The result is not validated; the pipeline validates it before use.
    pub fn resolve(&self) -> AnalysisConfig {
        let defaults = AnalysisConfig::default();
        AnalysisConfig {
            thresholds: Thresholds {
                t_poor: self.t_poor.unwrap_or(defaults.thresholds.t_poor),
                t_critical: self.t_critical.unwrap_or(defaults.thresholds.t_critical),
            },
            escalation_threshold: self
                .escalation_threshold
                .unwrap_or(defaults.escalation_threshold),
            volume_model: self.volume_model.unwrap_or(defaults.volume_model),
            default_units: self.units.unwrap_or(defaults.default_units),
            quantiles: self.quantiles.clone().unwrap_or(defaults.quantiles),
        }
    }

    /// Value of a single key, formatted for display
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "t_poor" => self.t_poor.map(|v| v.to_string()),
            "t_critical" => self.t_critical.map(|v| v.to_string()),
            "escalation_threshold" => self.escalation_threshold.map(|v| v.to_string()),
            "volume_model" => self.volume_model.map(|v| v.to_string()),
            "units" => self.units.map(|v| v.to_string()),
            "quantiles" => self.quantiles.as_ref().map(|qs| {
                qs.iter()
                    .map(|q| q.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            }),
            "default_format" => self.default_format.clone(),
            _ => None,
        }
    }
}

fn parse_env<T, F>(env: &F, var: &str) -> Result<Option<T>, ConfigurationError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match env(var) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigurationError::InvalidValue {
                    source_name: var.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}
