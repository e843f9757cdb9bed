//! End-of-run summary: terminal table and JSON export

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use serde::Serialize;

use super::metrics::SessionMetrics;

/// Final statistics of a session
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub number_of_examples: u64,
    pub weighted_example_sum: f64,
    pub weighted_label_sum: f64,
    pub average_loss: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holdout_loss: Option<f64>,
    pub total_features: u64,
    pub passes: usize,
}

impl RunSummary {
    pub fn from_metrics(metrics: &SessionMetrics, passes: usize) -> Self {
        Self {
            number_of_examples: metrics.example_number,
            weighted_example_sum: metrics.weighted_examples(),
            weighted_label_sum: metrics.weighted_labels,
            average_loss: metrics.average_loss(),
            holdout_loss: metrics.holdout_average_loss(),
            total_features: metrics.total_features,
            passes,
        }
    }

    pub fn display(&self) {
        eprintln!();
        eprintln!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        eprintln!("    {}", style("─".repeat(50)).dim());
        eprintln!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("Number of examples"),
            Cell::new(self.number_of_examples),
        ]);
        table.add_row(vec![
            Cell::new("Weighted example sum"),
            Cell::new(format!("{:.6}", self.weighted_example_sum)),
        ]);
        table.add_row(vec![
            Cell::new("Weighted label sum"),
            Cell::new(format!("{:.6}", self.weighted_label_sum)),
        ]);
        table.add_row(vec![
            Cell::new("Average loss"),
            Cell::new(format!("{:.6}", self.average_loss))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        if let Some(holdout) = self.holdout_loss {
            table.add_row(vec![
                Cell::new("Holdout loss"),
                Cell::new(format!("{:.6} h", holdout)).fg(Color::Yellow),
            ]);
        }
        table.add_row(vec![
            Cell::new("Total feature number"),
            Cell::new(self.total_features),
        ]);
        table.add_row(vec![Cell::new("Passes"), Cell::new(self.passes)]);

        // Indent the table
        for line in table.to_string().lines() {
            eprintln!("    {}", line);
        }
    }
}

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the export (ISO 8601 format)
    pub timestamp: String,
    pub cats_version: String,
    pub data_file: String,
    /// Options persisted with the run
    pub kept_options: BTreeMap<String, String>,
    /// Every option the deepest stage saw, including derived values
    pub resolved_options: BTreeMap<String, String>,
}

#[derive(Serialize)]
pub struct RunExport<'a> {
    pub metadata: RunMetadata,
    pub summary: &'a RunSummary,
}

/// Write the summary and run metadata as pretty JSON.
pub fn export_summary_json(
    summary: &RunSummary,
    data_file: &Path,
    kept_options: &[(String, String)],
    resolved_options: BTreeMap<String, String>,
    output_path: &Path,
) -> Result<()> {
    let export = RunExport {
        metadata: RunMetadata {
            timestamp: Utc::now().to_rfc3339(),
            cats_version: env!("CARGO_PKG_VERSION").to_string(),
            data_file: data_file.display().to_string(),
            kept_options: kept_options.iter().cloned().collect(),
            resolved_options,
        },
        summary,
    };

    let json = serde_json::to_string_pretty(&export).context("Failed to serialize run summary")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write summary file: {}", output_path.display()))?;
    Ok(())
}
