//! Table formatting for list output
//!
//! Rows are built from typed cells so each format can style or escape
//! them on its own: TSV is aligned and colored on a terminal, CSV follows
//! RFC 4180, Markdown escapes pipes, and ID output prints the first column.

use console::style;

use crate::analysis::classify::{Reachability, Severity};
use crate::cli::helpers::{escape_csv, format_float, truncate_str};
use crate::cli::OutputFormat;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Hole or object identifier (cyan)
    Id(String),
    /// Plain text, truncated to the column width
    Text(String),
    /// Reachability status (unreachable in yellow)
    Status(Reachability),
    /// Severity tier with color coding (critical in red bold)
    Severity(Severity),
    /// Object flag (set = red/yellow marker, unset = dim)
    Flag(bool),
    Number(usize),
    /// Float value with precision
    Float(f64, usize),
    Empty,
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => {
                let display = truncate_str(id, width);
                format!("{:<width$}", style(display).cyan(), width = width)
            }
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width), width = width)
            }
            CellValue::Status(status) => {
                let s = status.as_str();
                let styled = match status {
                    Reachability::Reachable => style(s).green(),
                    Reachability::Unreachable => style(s).yellow(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Severity(severity) => {
                let s = severity.as_str();
                let styled = match severity {
                    Severity::Normal => style(s).dim(),
                    Severity::Poor => style(s).yellow(),
                    Severity::Critical => style(s).red().bold(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Flag(set) => {
                let styled = if *set {
                    style("yes").red().bold()
                } else {
                    style("no").dim()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Float(f, precision) => {
                format!("{:>width$}", format_float(*f, *precision), width = width)
            }
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => escape_csv(s),
            CellValue::Empty => String::new(),
            other => other.raw(),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Flag(true) => "**yes**".to_string(),
            CellValue::Severity(Severity::Critical) => "**critical**".to_string(),
            CellValue::Empty => "-".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Get raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => s.clone(),
            CellValue::Status(status) => status.to_string(),
            CellValue::Severity(severity) => severity.to_string(),
            CellValue::Flag(set) => (if *set { "yes" } else { "no" }).to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, precision) => format_float(*f, *precision),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that renders rows in the list formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    item_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], item_name: &'static str) -> Self {
        Self {
            columns,
            item_name,
            show_summary: true,
        }
    }

    /// Omit the trailing "N hole(s) listed" line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Render rows in the specified format
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Id => rows.iter().map(|r| format!("{}\n", r.id)).collect(),
            _ => self.render_tsv(rows),
        }
    }

    /// Calculate dynamic column widths based on actual content
    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                col.header.len().max(content).min(col.width)
            })
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| format!("{:<w$}", style(col.header).bold(), w = w))
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total));
        out.push('\n');

        for row in rows {
            let parts: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, &w)| match row.get(col.key) {
                    Some(value) => value.format_tsv(w),
                    None => CellValue::Empty.format_tsv(w),
                })
                .collect();
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push_str(&format!(
                "\n{} {}(s) listed\n",
                style(rows.len()).cyan(),
                self.item_name
            ));
        }
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|col| row.get(col.key).map(CellValue::format_csv).unwrap_or_default())
                .collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        out.push_str(&format!("| {} |\n", header.join(" | ")));
        out.push_str(&format!("|{}\n", "---|".repeat(self.columns.len())));
        for row in rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|col| {
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        out
    }
}
