//! `hreach init` command - create a project config

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Overwrite an existing .hreach/config.yaml with the defaults
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
    }

    match Project::init(&path, args.force) {
        Ok(project) => {
            if !global.quiet {
                println!(
                    "{} Initialized hreach project at {}",
                    style("✓").green(),
                    style(project.root().display()).cyan()
                );
                println!();
                println!("Next steps:");
                println!(
                    "  {} Adjust thresholds in {}",
                    style("→").blue(),
                    style(project.config_path().display()).cyan()
                );
                println!(
                    "  {} Print an input template",
                    style("hreach template > holes.csv").yellow()
                );
                println!(
                    "  {} Analyze a holes table",
                    style("hreach analyze holes.csv").yellow()
                );
            }
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} hreach project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reset its config", style("hreach init --force").yellow());
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
