mod json;
mod table;

pub use json::print_json;
pub use table::print_table;

use anyhow::Result;

use crate::model::SpaceReport;

/// Output format for the space report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON document for programmatic use
    Json,
    /// Human-readable summary table
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(format!("Unknown format: {}. Use 'json' or 'table'", s)),
        }
    }
}

pub fn print_report(report: &SpaceReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => print_table(report),
    }
}

/// Format report to string for file output
pub fn format_report_to_string(report: &SpaceReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Table => Ok(table::render_table(report)),
    }
}
