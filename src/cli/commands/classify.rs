//! `hreach classify` command - evaluate a single hole

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use super::common::{build_pipeline, load_config, SettingsArgs};
use crate::analysis::classify::{Reachability, Severity};
use crate::analysis::model::HoleRecord;
use crate::cli::helpers::format_float;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::error::DataQualityError;
use crate::core::units::Unit;

#[derive(clap::Args, Debug)]
pub struct ClassifyArgs {
    /// Hole length
    #[arg(long, short = 'l', allow_negative_numbers = true)]
    pub length: f64,

    /// Hole radius
    #[arg(long, short = 'r', allow_negative_numbers = true)]
    pub radius: f64,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(Debug, Serialize)]
struct ClassifyOutput {
    length: f64,
    radius: f64,
    units: Unit,
    ratio: f64,
    volume_mm3: f64,
    status: Reachability,
    severity: Severity,
}

pub fn run(args: ClassifyArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global, &args.settings)?;
    let (settings, pipeline) = build_pipeline(&config)?;

    let hole = HoleRecord::new("hole", "-", args.length, args.radius)
        .with_units(settings.default_units);
    let (geometry, classification) = pipeline
        .classify_hole(&hole)
        .map_err(|issue| DataQualityError::new(vec![issue]))?;

    let output = ClassifyOutput {
        length: hole.length,
        radius: hole.radius,
        units: hole.units,
        ratio: geometry.ratio,
        volume_mm3: geometry.volume_mm3,
        status: classification.status,
        severity: classification.severity,
    };

    match global.format.resolve(None, OutputFormat::Auto) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
        }
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&output).into_diagnostic()?),
        OutputFormat::Id => println!("{}", output.severity),
        OutputFormat::Tsv | OutputFormat::Csv => {
            let sep = if global.format == OutputFormat::Csv { "," } else { "\t" };
            println!("ratio{sep}volume_mm3{sep}status{sep}severity");
            println!(
                "{}{sep}{}{sep}{}{sep}{}",
                output.ratio, output.volume_mm3, output.status, output.severity
            );
        }
        _ => {
            let severity = match output.severity {
                Severity::Normal => style(output.severity.as_str()).green(),
                Severity::Poor => style(output.severity.as_str()).yellow(),
                Severity::Critical => style(output.severity.as_str()).red().bold(),
            };
            println!(
                "{} ratio {} ({} / {} {})",
                style("→").blue(),
                style(format_float(output.ratio, 3)).cyan(),
                format_float(output.length, 3),
                format_float(output.radius, 3),
                output.units
            );
            println!("  status:   {}", output.status);
            println!("  severity: {}", severity);
            println!("  volume:   {} mm³", format_float(output.volume_mm3, 3));
        }
    }
    Ok(())
}
