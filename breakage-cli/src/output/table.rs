//! Table output using the `tabled` crate, sized to the terminal.

use colored::Colorize;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Columns, style::Style, Modify, Width},
};

use super::{finding_columns, truncate, Column, FindingRow, OutputConfig};
use breakage_core::BreakingReport;

/// Table output formatter
pub struct TableOutput;

impl TableOutput {
    /// Human-readable report: a headline, the findings table and any
    /// allowed findings.
    pub fn format_report(report: &BreakingReport, config: &OutputConfig) -> String {
        let mut output = String::new();

        let headline = if report.is_breaking() {
            "BREAKING:".red().bold()
        } else {
            "OK:".green().bold()
        };
        output.push_str(&format!(
            "{} package {} - {} ({:.1}ms)\n",
            headline,
            report.package.cyan(),
            report.summary_text,
            report.duration_ms
        ));

        if report.is_breaking() {
            let rows: Vec<FindingRow> = report.findings.iter().map(FindingRow::from).collect();
            output.push('\n');
            output.push_str(&Self::format_with_columns(&rows, &finding_columns(), config));
            output.push('\n');
        }

        if !report.allowed.is_empty() {
            output.push_str(&format!("\n{}\n", "Allowed:".yellow().bold()));
            for finding in &report.allowed {
                output.push_str(&format!(
                    "  {} {}\n",
                    finding.name.yellow(),
                    format!("[{}]", finding.change.as_str()).dimmed()
                ));
            }
        }

        output.trim_end().to_string()
    }

    /// Format rows as a table with the given columns
    pub fn format_with_columns<T: Serialize>(
        data: &[T],
        columns: &[Column],
        config: &OutputConfig,
    ) -> String {
        if data.is_empty() {
            return "(no results)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(columns.iter().map(|c| c.name.as_str()));

        for item in data {
            let json = serde_json::to_value(item).unwrap_or_default();
            let row: Vec<String> = columns
                .iter()
                .map(|col| {
                    let value = json.get(&col.key).cloned().unwrap_or_default();
                    Self::format_value(&value, col, config)
                })
                .collect();
            builder.push_record(row);
        }

        let mut table = builder.build();

        if config.compact {
            table.with(Style::blank());
        } else {
            table.with(Style::rounded());
        }

        let term_width = config.effective_width();
        if config.should_truncate() {
            let col_count = columns.len().max(1);
            let available_width = term_width.saturating_sub(col_count * 3) / col_count;
            for (i, col) in columns.iter().enumerate() {
                let max_width = col.max_width.unwrap_or(available_width);
                if max_width > 0 {
                    table.with(Modify::new(Columns::single(i)).with(Width::truncate(max_width)));
                }
            }
            table.with(Width::wrap(term_width));
        }

        table.to_string()
    }

    fn format_value(value: &serde_json::Value, col: &Column, config: &OutputConfig) -> String {
        let s = match value {
            serde_json::Value::Null => "-".to_string(),
            serde_json::Value::String(s) if s.is_empty() => "-".to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        match col.max_width {
            Some(max_width) if config.should_truncate() => truncate(&s, max_width),
            _ => s,
        }
    }
}
