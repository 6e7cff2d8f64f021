//! Arguments and steps shared by the analysis commands

use console::style;
use miette::Result;
use std::path::PathBuf;
use tracing::info;

use crate::analysis::geometry::VolumeModel;
use crate::analysis::model::Dataset;
use crate::analysis::pipeline::{Analysis, Pipeline};
use crate::cli::GlobalOpts;
use crate::core::config::{AnalysisConfig, Config};
use crate::core::loader::{load_dataset, Layout};
use crate::core::units::Unit;

/// Input table selection
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Holes CSV (objects CSV with a JSON `holes` column under --nested)
    pub input: PathBuf,

    /// Objects CSV declaring every object, including those without holes
    #[arg(long, conflicts_with = "nested")]
    pub objects: Option<PathBuf>,

    /// Input has one row per object with a JSON `holes` column
    #[arg(long)]
    pub nested: bool,
}

impl InputArgs {
    pub fn layout(&self) -> Layout {
        if self.nested {
            Layout::Nested
        } else {
            Layout::Flat
        }
    }
}

/// Threshold flags, the highest-precedence config layer
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Ratio at or above which a hole is unreachable
    #[arg(long, value_name = "RATIO")]
    pub t_poor: Option<f64>,

    /// Ratio at or above which a hole is critical
    #[arg(long, value_name = "RATIO")]
    pub t_critical: Option<f64>,

    /// Unreachable holes per object that raise the error flag
    #[arg(long, value_name = "COUNT")]
    pub escalation: Option<usize>,

    /// Hole volume formula (cylinder, drill-point)
    #[arg(long, value_name = "MODEL")]
    pub volume: Option<VolumeModel>,

    /// Unit for rows without a units column (mm, cm, in)
    #[arg(long)]
    pub units: Option<Unit>,
}

impl SettingsArgs {
    fn as_layer(&self) -> Config {
        Config {
            t_poor: self.t_poor,
            t_critical: self.t_critical,
            escalation_threshold: self.escalation,
            volume_model: self.volume,
            units: self.units,
            ..Config::default()
        }
    }
}

/// Merge every config layer with the command-line flags on top
pub fn load_config(global: &GlobalOpts, flags: &SettingsArgs) -> Result<Config> {
    let mut config = Config::load(global.config.as_deref())?;
    config.merge(flags.as_layer());
    Ok(config)
}

/// Resolve the merged config and build a validated pipeline
pub fn build_pipeline(config: &Config) -> Result<(AnalysisConfig, Pipeline)> {
    let settings = config.resolve();
    let pipeline = Pipeline::new(&settings)?;
    Ok((settings, pipeline))
}

/// Load the input tables and run the pipeline over them
pub fn run_analysis(
    input: &InputArgs,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(Dataset, Analysis)> {
    let (settings, pipeline) = build_pipeline(config)?;

    if !global.quiet {
        eprintln!(
            "{} Loading {}",
            style("→").blue(),
            style(input.input.display()).cyan()
        );
    }

    let dataset = load_dataset(
        &input.input,
        input.objects.as_deref(),
        input.layout(),
        settings.default_units,
    )?;
    info!(
        objects = dataset.objects.len(),
        holes = dataset.holes.len(),
        "dataset loaded"
    );

    let analysis = match pipeline.run(&dataset) {
        Ok(analysis) => analysis,
        Err(e) => {
            if !global.quiet {
                eprintln!("{} Analysis aborted", style("✗").red());
            }
            return Err(e.into());
        }
    };

    if !global.quiet {
        let counts = &analysis.summary.counts;
        eprintln!(
            "{} Analyzed {} hole(s) across {} object(s): {} unreachable, {} object(s) flagged",
            style("✓").green(),
            style(counts.total_holes).cyan(),
            style(counts.total_objects).cyan(),
            style(counts.unreachable_holes).yellow(),
            style(counts.objects_with_warning).yellow()
        );
    }

    Ok((dataset, analysis))
}
