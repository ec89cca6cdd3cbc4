//! CSV output, one row per finding.

use super::{Column, OutputConfig};
use serde::Serialize;

/// CSV output formatter
pub struct CsvOutput;

impl CsvOutput {
    /// Format rows as CSV, picking values by column key.
    ///
    /// An empty input still yields the header row.
    pub fn format_with_columns<T: Serialize>(
        data: &[T],
        columns: &[Column],
        _config: &OutputConfig,
    ) -> String {
        let headers: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let mut output = headers.join(",");

        for item in data {
            if let Ok(json) = serde_json::to_value(item) {
                let row: Vec<String> = columns
                    .iter()
                    .map(|col| {
                        json.get(&col.key)
                            .map(Self::value_to_csv)
                            .unwrap_or_default()
                    })
                    .collect();
                output.push('\n');
                output.push_str(&row.join(","));
            }
        }

        output
    }

    /// Convert a JSON value to a CSV cell
    fn value_to_csv(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => Self::escape_value(s),
            other => Self::escape_value(&other.to_string()),
        }
    }

    /// Quote a value containing a comma, newline or quote, doubling quotes.
    fn escape_value(s: &str) -> String {
        if s.contains(',') || s.contains('\n') || s.contains('\r') || s.contains('"') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_report;
    use crate::output::{finding_columns, FindingRow, OutputFormat, Outputter};

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(CsvOutput::escape_value("hello"), "hello");
        assert_eq!(CsvOutput::escape_value("func(int, string)"), "\"func(int, string)\"");
        assert_eq!(CsvOutput::escape_value("a\nb"), "\"a\nb\"");
        assert_eq!(CsvOutput::escape_value("`json:\"x\"`"), "\"`json:\"\"x\"\"`\"");
    }

    #[test]
    fn test_report_rows() {
        let report = sample_report();
        let config = OutputConfig::new(OutputFormat::Csv);
        let output = report.render(&config);

        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Name,Kind,Change,Before,After,Location");
        assert_eq!(
            lines[1],
            "Open,func,type changed,func(string) error,\"func(string, int) error\",api.go:3:6"
        );
        assert!(lines[2].starts_with("Close,func,removed,func(),,"));
    }

    #[test]
    fn test_empty_rows() {
        let rows: Vec<FindingRow> = Vec::new();
        let config = OutputConfig::new(OutputFormat::Csv);
        let output = CsvOutput::format_with_columns(&rows, &finding_columns(), &config);
        assert_eq!(output, "Name,Kind,Change,Before,After,Location");
    }
}
