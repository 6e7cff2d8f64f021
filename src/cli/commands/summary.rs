//! `hreach summary` command - print the summary report only

use miette::Result;

use super::common::{load_config, run_analysis, InputArgs, SettingsArgs};
use crate::cli::helpers::write_output;
use crate::cli::report::SummaryReport;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<std::path::PathBuf>,
}

pub fn run(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global, &args.settings)?;
    let (_, analysis) = run_analysis(&args.input, &config, global)?;

    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Md);
    let source = args.input.input.display().to_string();
    let report = SummaryReport::new(&analysis, Some(source.as_str())).render(format)?;
    write_output(&report, args.output.as_deref(), global.quiet)
}
