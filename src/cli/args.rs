//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    analyze::AnalyzeArgs, classify::ClassifyArgs, completions::CompletionsArgs,
    config::ConfigCommands, init::InitArgs, list::ListArgs, summary::SummaryArgs,
    template::TemplateArgs,
};

#[derive(Parser)]
#[command(name = "hreach")]
#[command(author, version, about = "Hole reachability analysis")]
#[command(long_about = "Flags holes whose length-to-radius ratio makes them unreachable for standard tooling, rolls the result up to per-object warnings and errors, and summarizes a batch of parts.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Config file layered over the global and project config
    #[arg(long, global = true, env = "HREACH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .hreach/config.yaml in the current directory
    Init(InitArgs),

    /// Analyze a holes table and write annotated tables
    Analyze(AnalyzeArgs),

    /// Print the summary report of a holes table
    Summary(SummaryArgs),

    /// List annotated holes or objects
    List(ListArgs),

    /// Evaluate and classify a single hole
    Classify(ClassifyArgs),

    /// Print a CSV input template
    Template(TemplateArgs),

    /// Inspect and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Command default (md for reports, tsv for lists)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Resolve `Auto` against a configured name, then a command default
    pub fn resolve(self, configured: Option<&str>, fallback: OutputFormat) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|name| OutputFormat::from_str(name, true).ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(fallback)
    }
}
