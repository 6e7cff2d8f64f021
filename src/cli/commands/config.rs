//! `hreach config` command - Configuration management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::{Config, VALID_KEYS};
use crate::core::project::Project;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (see `hreach config keys`)
    pub key: String,

    /// Value to set (YAML scalar or list)
    pub value: String,

    /// Set in global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;

    if let Some(key) = &args.key {
        check_key(key)?;
        return match config.get(key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    match global.format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&config).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config).into_diagnostic()?);
            return Ok(());
        }
        _ => {}
    }

    let resolved = config.resolve();
    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in VALID_KEYS {
        print_config_value(key, config.get(key).as_deref());
    }
    println!();
    println!(
        "{} poor ≥ {}, critical ≥ {}, error at {} unreachable hole(s), {} volume, {}",
        style("Resolved:").dim(),
        resolved.thresholds.t_poor,
        resolved.thresholds.t_critical,
        resolved.escalation_threshold,
        resolved.volume_model,
        resolved.default_units
    );
    if let Err(e) = resolved.validate() {
        println!("{} {}", style("✗").red(), e);
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Command-line flags (--t-poor, --t-critical, ...)");
    println!("  2. Environment variables (HREACH_T_POOR, HREACH_T_CRITICAL, HREACH_ESCALATION,");
    println!("     HREACH_UNITS, HREACH_VOLUME_MODEL, HREACH_FORMAT)");
    println!("  3. --config <file>");
    println!("  4. Project config (.hreach/config.yaml)");
    println!("  5. Global config (~/.config/hreach/config.yaml)");
    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    check_key(&args.key)?;
    let config_path = if args.global {
        get_global_config_path()?
    } else {
        get_project_config_path()?
    };

    let mut config_map = read_mapping(&config_path)?;
    let value: serde_yml::Value = serde_yml::from_str(&args.value)
        .unwrap_or_else(|_| serde_yml::Value::String(args.value.clone()));
    if let serde_yml::Value::Mapping(map) = &mut config_map {
        map.insert(serde_yml::Value::String(args.key.clone()), value);
    }

    // Reject values that would make the file unreadable or the merged
    // configuration invalid
    let parsed: Config = serde_yml::from_value(config_map.clone())
        .map_err(|e| miette::miette!("Invalid value for '{}': {}", args.key, e))?;
    let project_path = get_project_config_path().ok();
    let effective = Config::merge_files_with(
        Config::global_config_path().as_deref(),
        project_path.as_deref(),
        &config_path,
        parsed,
    )?;
    effective.resolve().validate()?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope
    );
    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    let config_path = if args.global {
        get_global_config_path()?
    } else {
        get_project_config_path()?
    };

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    let removed = match &mut config_map {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(args.key.clone()))
            .is_some(),
        _ => false,
    };
    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );
    Ok(())
}

fn run_path() -> Result<()> {
    let global_path = get_global_config_path()?;

    println!("{}", style("Configuration file paths:").bold());
    println!();
    println!("  {} {}", style("Global:").cyan(), global_path.display());
    print_exists(global_path.exists());

    println!();
    match get_project_config_path() {
        Ok(path) => {
            println!("  {} {}", style("Project:").cyan(), path.display());
            print_exists(path.exists());
        }
        Err(_) => println!(
            "  {} {}",
            style("Project:").cyan(),
            style("(not in an hreach project)").dim()
        ),
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, description) in VALID_KEYS {
        println!("  {:<22} {}", style(key).cyan(), style(description).dim());
    }
    println!();
    println!(
        "{}",
        style("Use 'hreach config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

// Helper functions

fn check_key(key: &str) -> Result<()> {
    if VALID_KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "Run 'hreach config keys' to list valid keys",
            "Unknown config key '{}'",
            key
        ))
    }
}

fn read_mapping(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value = crate::yaml::parse_yaml(&content, &path.display().to_string())?;
    Ok(match parsed {
        serde_yml::Value::Mapping(_) => parsed,
        _ => serde_yml::Value::Mapping(Default::default()),
    })
}

fn get_global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn get_project_config_path() -> Result<PathBuf> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    Ok(project.config_path())
}

fn print_config_value(key: &str, value: Option<&str>) {
    match value {
        Some(v) => println!("  {}: {}", style(key).cyan(), style(v).yellow()),
        None => println!("  {}: {}", style(key).cyan(), style("(default)").dim()),
    }
}

fn print_exists(exists: bool) {
    if exists {
        println!("         {}", style("(exists)").green());
    } else {
        println!("         {}", style("(not created)").dim());
    }
}
