//! Summary report rendering
//!
//! Markdown reports are built with `tabled`; JSON and YAML serialize the
//! same [`SummaryReport`]; TSV and CSV emit one `section, key, statistic,
//! value` line per figure so the output can be filtered with standard tools.

use chrono::{DateTime, Utc};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{builder::Builder, settings::Style};

use crate::analysis::pipeline::{Analysis, RunSettings};
use crate::analysis::stats::{CountGroup, CountLine, Distribution, Metric};
use crate::cli::helpers::{escape_csv, format_float};
use crate::cli::OutputFormat;

/// Serializable view of a run's summary
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
    pub generated_at: DateTime<Utc>,
    pub settings: RunSettings,
    pub counts: Vec<CountLine>,
    pub distributions: &'a BTreeMap<Metric, Distribution>,
}

impl<'a> SummaryReport<'a> {
    pub fn new(analysis: &'a Analysis, source: Option<&'a str>) -> Self {
        Self {
            source,
            generated_at: Utc::now(),
            settings: analysis.settings,
            counts: analysis.summary.counts.lines(),
            distributions: &analysis.summary.distributions,
        }
    }

    /// Render in `format`; `Auto` and `Id` fall back to Markdown
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => {
                let mut s = serde_json::to_string_pretty(self).into_diagnostic()?;
                s.push('\n');
                Ok(s)
            }
            OutputFormat::Yaml => serde_yml::to_string(self).into_diagnostic(),
            OutputFormat::Tsv => Ok(self.render_long('\t')),
            OutputFormat::Csv => Ok(self.render_long(',')),
            _ => Ok(self.render_md()),
        }
    }

    fn render_md(&self) -> String {
        let mut out = String::new();
        out.push_str("# Hole Reachability Report\n\n");
        if let Some(source) = self.source {
            out.push_str(&format!("- **Source:** {}\n", source));
        }
        out.push_str(&format!(
            "- **Generated:** {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));
        let t = self.settings.thresholds;
        out.push_str(&format!(
            "- **Thresholds:** poor ≥ {}, critical ≥ {}\n",
            t.t_poor, t.t_critical
        ));
        out.push_str(&format!(
            "- **Escalation threshold:** {} unreachable hole(s)\n",
            self.settings.escalation_threshold
        ));
        out.push_str(&format!(
            "- **Volume model:** {}\n",
            self.settings.volume_model
        ));

        for (group, title) in [(CountGroup::Objects, "Objects"), (CountGroup::Holes, "Holes")] {
            out.push_str(&format!("\n## {}\n\n", title));
            let mut builder = Builder::default();
            builder.push_record(["", "Count", "Share"]);
            for line in self.counts.iter().filter(|l| l.group == group) {
                builder.push_record([
                    line.label.to_string(),
                    line.absolute.to_string(),
                    format!("{:.1}%", line.percentage * 100.0),
                ]);
            }
            out.push_str(&builder.build().with(Style::markdown()).to_string());
            out.push('\n');
        }

        out.push_str("\n## Distributions\n\n");
        let quantiles: Vec<f64> = self
            .distributions
            .values()
            .map(|d| &d.quantiles)
            .max_by_key(|qs| qs.len())
            .map(|qs| qs.iter().map(|q| q.q).collect())
            .unwrap_or_default();

        let mut builder = Builder::default();
        let mut header = vec!["Metric".to_string(), "n".to_string(), "mean".to_string(), "std".to_string()];
        header.extend(quantiles.iter().map(|&q| quantile_label(q)));
        builder.push_record(header);

        for (metric, dist) in self.distributions {
            let precision = if metric.is_count() { 2 } else { 3 };
            let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format_float(v, precision));
            let mut row = vec![
                metric.label().to_string(),
                dist.count.to_string(),
                fmt(dist.mean),
                fmt(dist.std_dev),
            ];
            row.extend(quantiles.iter().map(|&q| fmt(dist.percentile(q))));
            builder.push_record(row);
        }
        out.push_str(&builder.build().with(Style::markdown()).to_string());
        out.push('\n');
        out
    }

    fn render_long(&self, sep: char) -> String {
        let cell = |s: &str| {
            if sep == ',' {
                escape_csv(s)
            } else {
                s.to_string()
            }
        };
        let mut lines = vec![["section", "key", "statistic", "value"].join(&sep.to_string())];
        let mut push = |section: &str, key: &str, statistic: &str, value: String| {
            lines.push(
                [cell(section), cell(key), cell(statistic), value].join(&sep.to_string()),
            );
        };

        for line in &self.counts {
            let section = match line.group {
                CountGroup::Objects => "objects",
                CountGroup::Holes => "holes",
            };
            push(section, line.key, "absolute", line.absolute.to_string());
            push(section, line.key, "percentage", line.percentage.to_string());
        }

        for (metric, dist) in self.distributions {
            let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
            push("distribution", metric.key(), "count", dist.count.to_string());
            push("distribution", metric.key(), "mean", opt(dist.mean));
            push("distribution", metric.key(), "std_dev", opt(dist.std_dev));
            push("distribution", metric.key(), "min", opt(dist.min));
            push("distribution", metric.key(), "median", opt(dist.median));
            push("distribution", metric.key(), "max", opt(dist.max));
            for q in &dist.quantiles {
                push("distribution", metric.key(), quantile_label(q.q).as_str(), q.value.to_string());
            }
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// `0.05` -> `p5`
fn quantile_label(q: f64) -> String {
    format!("p{}", format_float(q * 100.0, 2))
}
