//! Output formatting for breakage reports.
//!
//! Supports four formats: table (human-readable), json (full report),
//! csv (one row per finding) and names (one name per line, for scripts).
//!
//! Detects TTY context to adjust colors and truncation behavior.

use clap::ValueEnum;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;

use breakage_core::{BreakingReport, Finding};

mod csv;
mod json;
mod table;

pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::table::TableOutput;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary and table (default)
    #[default]
    Table,
    /// Full report as JSON
    Json,
    /// One CSV row per finding
    Csv,
    /// Names of the broken symbols, one per line
    Names,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "names" => Ok(OutputFormat::Names),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Configuration for output rendering
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub no_color: bool,
    /// Disable truncation of long values
    pub no_truncate: bool,
    /// Override terminal width (None = auto-detect)
    pub width: Option<usize>,
    /// Compact mode (less whitespace)
    pub compact: bool,
}

impl OutputConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            no_color: false,
            no_truncate: false,
            width: None,
            compact: false,
        }
    }

    /// Create an OutputConfig with automatic TTY detection and optional
    /// color override.
    ///
    /// When stdout is not a TTY, colors are disabled (unless forced on) and
    /// truncation is disabled.
    pub fn auto_detect(format: OutputFormat, color_override: Option<bool>) -> Self {
        let is_tty = std::io::stdout().is_terminal();
        let use_color = color_override.unwrap_or(is_tty);
        Self {
            format,
            no_color: !use_color,
            no_truncate: !is_tty,
            width: None,
            compact: false,
        }
    }

    /// Get the effective terminal width
    pub fn effective_width(&self) -> usize {
        self.width.unwrap_or_else(terminal_width)
    }

    pub fn use_colors(&self) -> bool {
        !self.no_color
    }

    pub fn should_truncate(&self) -> bool {
        !self.no_truncate
    }

    pub fn without_colors(mut self) -> Self {
        self.no_color = true;
        self
    }

    pub fn compact(mut self) -> Self {
        self.compact = true;
        self
    }
}

/// Column definition for table and csv output
#[derive(Debug, Clone)]
pub struct Column {
    /// Display name for the column header
    pub name: String,
    /// Key used to extract data from the serialized row
    pub key: String,
    /// Maximum width for this column (None = no limit)
    pub max_width: Option<usize>,
}

impl Column {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            max_width: None,
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }
}

/// Flat view of one finding, shared by the table and csv renderers.
#[derive(Debug, Serialize)]
pub struct FindingRow {
    pub name: String,
    pub kind: String,
    pub change: String,
    pub before: String,
    pub after: String,
    pub location: String,
}

impl From<&Finding> for FindingRow {
    fn from(finding: &Finding) -> Self {
        Self {
            name: finding.name.clone(),
            kind: finding.kind().as_str().to_string(),
            change: finding.change.as_str().to_string(),
            before: finding.before.type_text.clone(),
            after: finding
                .after
                .as_ref()
                .map(|a| a.type_text.clone())
                .unwrap_or_default(),
            location: finding.location(),
        }
    }
}

/// Columns of the findings table.
pub fn finding_columns() -> Vec<Column> {
    vec![
        Column::new("Name", "name"),
        Column::new("Kind", "kind"),
        Column::new("Change", "change"),
        Column::new("Before", "before").with_max_width(48),
        Column::new("After", "after").with_max_width(48),
        Column::new("Location", "location"),
    ]
}

/// Types that can be rendered in every supported format.
pub trait Outputter: Serialize + Sized {
    fn to_table(&self, config: &OutputConfig) -> String;

    fn to_json(&self, config: &OutputConfig) -> String {
        JsonOutput::format(self, config)
    }

    fn to_csv(&self, config: &OutputConfig) -> String;

    fn to_names(&self, config: &OutputConfig) -> String;

    /// Render using the format specified in config
    fn render(&self, config: &OutputConfig) -> String {
        match config.format {
            OutputFormat::Table => self.to_table(config),
            OutputFormat::Json => self.to_json(config),
            OutputFormat::Csv => self.to_csv(config),
            OutputFormat::Names => self.to_names(config),
        }
    }

    /// Render and print to stdout
    fn output(&self, config: &OutputConfig) {
        let rendered = self.render(config);
        if !rendered.is_empty() {
            println!("{}", rendered);
        }
    }
}

impl Outputter for BreakingReport {
    fn to_table(&self, config: &OutputConfig) -> String {
        TableOutput::format_report(self, config)
    }

    fn to_csv(&self, config: &OutputConfig) -> String {
        let rows: Vec<FindingRow> = self.findings.iter().map(FindingRow::from).collect();
        CsvOutput::format_with_columns(&rows, &finding_columns(), config)
    }

    fn to_names(&self, _config: &OutputConfig) -> String {
        self.names().join("\n")
    }
}

/// Truncate a string to a maximum width with ellipsis
pub fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let truncated: String = s.chars().take(max_width - 3).collect();
        format!("{}...", truncated)
    }
}

/// Get terminal width, defaulting to 80 if unavailable
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}
