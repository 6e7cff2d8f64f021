//! `hreach analyze` command - annotate holes and objects, print the report

use console::style;
use miette::{Context, IntoDiagnostic, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::common::{load_config, run_analysis, InputArgs, SettingsArgs};
use crate::cli::helpers::write_output;
use crate::cli::report::SummaryReport;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::writer;

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Annotated holes CSV (default: <input>.holes.csv next to the input)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Annotated objects CSV (default: <input>.objects.csv next to the input)
    #[arg(long)]
    pub objects_out: Option<PathBuf>,

    /// Write the summary report to a file instead of stdout
    #[arg(long)]
    pub summary_out: Option<PathBuf>,
}

pub fn run(args: AnalyzeArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global, &args.settings)?;
    let (dataset, analysis) = run_analysis(&args.input, &config, global)?;

    let holes_path = args
        .output
        .unwrap_or_else(|| sibling(&args.input.input, "holes.csv"));
    let objects_path = args
        .objects_out
        .unwrap_or_else(|| sibling(&args.input.input, "objects.csv"));

    // Both outputs exist or neither does
    let holes_file = create(&holes_path)?;
    let objects_file = match create(&objects_path) {
        Ok(file) => file,
        Err(e) => {
            drop(holes_file);
            let _ = fs::remove_file(&holes_path);
            return Err(e);
        }
    };

    let written = writer::write_holes(
        BufWriter::new(holes_file),
        &analysis.holes,
        &dataset.hole_columns,
    )
    .and_then(|()| {
        writer::write_objects(
            BufWriter::new(objects_file),
            &analysis.objects,
            &dataset.object_columns,
        )
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&holes_path);
        let _ = fs::remove_file(&objects_path);
        return Err(e).into_diagnostic();
    }

    if !global.quiet {
        eprintln!(
            "{} Wrote {} and {}",
            style("✓").green(),
            style(holes_path.display()).cyan(),
            style(objects_path.display()).cyan()
        );
    }

    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Md);
    let source = args.input.input.display().to_string();
    let report = SummaryReport::new(&analysis, Some(source.as_str())).render(format)?;
    write_output(&report, args.summary_out.as_deref(), global.quiet)
}

fn create(path: &Path) -> Result<File> {
    File::create(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot create {}", path.display()))
}

/// `dir/holes.csv` + `objects.csv` -> `dir/holes.objects.csv`
fn sibling(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "holes".to_string());
    input.with_file_name(format!("{}.{}", stem, suffix))
}
