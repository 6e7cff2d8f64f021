//! `hreach list` command - list annotated holes or objects

use console::Term;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use super::common::{load_config, run_analysis, InputArgs, SettingsArgs};
use crate::analysis::pipeline::{Analysis, AnnotatedHole, AnnotatedObject};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

const HOLE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "HOLE", 24),
    ColumnDef::new("object", "OBJECT", 24),
    ColumnDef::new("length", "LENGTH", 12),
    ColumnDef::new("radius", "RADIUS", 12),
    ColumnDef::new("units", "UNITS", 5),
    ColumnDef::new("ratio", "RATIO", 12),
    ColumnDef::new("status", "STATUS", 11),
    ColumnDef::new("severity", "SEVERITY", 8),
];

const OBJECT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "OBJECT", 36),
    ColumnDef::new("holes", "HOLES", 6),
    ColumnDef::new("unreachable", "UNREACHABLE", 11),
    ColumnDef::new("critical", "CRITICAL", 8),
    ColumnDef::new("warning", "WARNING", 7),
    ColumnDef::new("error", "ERROR", 5),
];

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// List objects with their flags instead of holes
    #[arg(long)]
    pub by_object: bool,

    /// Only unreachable holes (or flagged objects with --by-object)
    #[arg(long)]
    pub unreachable_only: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global, &args.settings)?;
    let (_, analysis) = run_analysis(&args.input, &config, global)?;
    let format = global.format.resolve(None, OutputFormat::Tsv);
    // The "N hole(s) listed" footer only goes to a terminal
    let footer = Term::stdout().is_term();
    print!("{}", render(&analysis, &args, format, footer)?);
    Ok(())
}

fn render(
    analysis: &Analysis,
    args: &ListArgs,
    format: OutputFormat,
    footer: bool,
) -> Result<String> {
    let limit = args.limit.unwrap_or(usize::MAX);
    let formatter = |columns: &'static [ColumnDef], item_name: &'static str| {
        let formatter = TableFormatter::new(columns, item_name);
        if footer {
            formatter
        } else {
            formatter.without_summary()
        }
    };

    if args.by_object {
        let objects: Vec<&AnnotatedObject> = if args.unreachable_only {
            analysis.flagged_objects().take(limit).collect()
        } else {
            analysis.objects.iter().take(limit).collect()
        };
        if let Some(out) = serialize(&objects, format)? {
            return Ok(out);
        }
        let rows: Vec<TableRow> = objects.iter().map(|o| object_row(o)).collect();
        return Ok(formatter(OBJECT_COLUMNS, "object").render(&rows, format));
    }

    let holes: Vec<&AnnotatedHole> = if args.unreachable_only {
        analysis.unreachable_holes().take(limit).collect()
    } else {
        analysis.holes.iter().take(limit).collect()
    };
    if let Some(out) = serialize(&holes, format)? {
        return Ok(out);
    }
    let rows: Vec<TableRow> = holes.iter().map(|h| hole_row(h)).collect();
    Ok(formatter(HOLE_COLUMNS, "hole").render(&rows, format))
}

/// JSON and YAML carry the full annotated records
fn serialize<T: Serialize>(items: &[T], format: OutputFormat) -> Result<Option<String>> {
    match format {
        OutputFormat::Json => {
            let mut s = serde_json::to_string_pretty(items).into_diagnostic()?;
            s.push('\n');
            Ok(Some(s))
        }
        OutputFormat::Yaml => Ok(Some(serde_yml::to_string(items).into_diagnostic()?)),
        _ => Ok(None),
    }
}

fn hole_row(hole: &AnnotatedHole) -> TableRow {
    TableRow::new(hole.record.id.clone())
        .cell("id", CellValue::Id(hole.record.id.clone()))
        .cell("object", CellValue::Text(hole.record.object_id.clone()))
        .cell("length", CellValue::Float(hole.record.length, 3))
        .cell("radius", CellValue::Float(hole.record.radius, 3))
        .cell("units", CellValue::Text(hole.record.units.to_string()))
        .cell("ratio", CellValue::Float(hole.geometry.ratio, 3))
        .cell("status", CellValue::Status(hole.classification.status))
        .cell("severity", CellValue::Severity(hole.classification.severity))
}

fn object_row(object: &AnnotatedObject) -> TableRow {
    let f = &object.flags;
    TableRow::new(object.record.id.clone())
        .cell("id", CellValue::Id(object.record.id.clone()))
        .cell("holes", CellValue::Number(f.hole_count))
        .cell("unreachable", CellValue::Number(f.unreachable_count))
        .cell("critical", CellValue::Number(f.critical_count))
        .cell("warning", CellValue::Flag(f.has_warning))
        .cell("error", CellValue::Flag(f.has_error))
}
