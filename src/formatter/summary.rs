//! Summary formatting for export runs
//!
//! Renders the outcome of a run (or the plan of a dry run) either as a short
//! human-readable line or as JSON for scripted callers.

use nu_ansi_term::Color;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::executor::ExportSummary;
use crate::query::QueryPlan;

use super::format_bytes;
use super::table::TableFormatter;

/// Formatter for export summaries
pub struct SummaryFormatter {
    /// Output format
    format: OutputFormat,

    /// Enable colored output
    use_colors: bool,
}

impl SummaryFormatter {
    /// Create a new summary formatter
    ///
    /// # Arguments
    /// * `format` - Text or JSON
    /// * `use_colors` - Enable colored output (text only)
    ///
    /// # Returns
    /// * `Self` - New formatter
    pub fn new(format: OutputFormat, use_colors: bool) -> Self {
        Self { format, use_colors }
    }

    /// Format the outcome of a completed export
    pub fn format_summary(&self, summary: &ExportSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(summary),
            OutputFormat::Text => {
                let noun = if summary.row_count == 1 { "row" } else { "rows" };
                let line = format!(
                    "Exported {} {} to {} ({}, {} ms)",
                    summary.row_count,
                    noun,
                    summary.output_location.display(),
                    format_bytes(summary.bytes_written),
                    summary.elapsed_ms
                );
                Ok(self.paint_success(line))
            }
        }
    }

    /// Format a plan for `--dry-run`
    pub fn format_plan(&self, plan: &QueryPlan) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(plan),
            OutputFormat::Text => {
                let params = TableFormatter::with_colors(self.use_colors)
                    .format_parameters(plan.parameters());
                Ok(format!("{}\n\nParameters:\n{}", plan.statement(), params))
            }
        }
    }

    fn paint_success(&self, line: String) -> String {
        if self.use_colors {
            Color::Green.bold().paint(line).to_string()
        } else {
            line
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| std::io::Error::from(e).into())
}
