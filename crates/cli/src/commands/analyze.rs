//! `msim stats` and `msim validate`

use crate::output::{
    color_score, color_status, print_error, print_rows, print_success, print_warning,
    OutputFormat,
};
use anyhow::{bail, Result};
use sim_lib::interpolation::{stats, validate_quality};
use sim_lib::sink::read_json_lines;
use sim_lib::{InterpolatedMetricRecord, MetricRecord};
use std::path::Path;
use tabled::Tabled;
use tracing::info;

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(metric: impl Into<String>, value: impl ToString) -> StatRow {
    StatRow {
        metric: metric.into(),
        value: value.to_string(),
    }
}

/// Summarize a (possibly interpolated) JSON-lines dataset
pub async fn stats_command(input: &Path, format: OutputFormat) -> Result<()> {
    let records: Vec<InterpolatedMetricRecord> = read_json_lines(input).await?;
    info!(input = %input.display(), records = records.len(), "Loaded dataset");
    let summary = stats(&records);

    let mut rows = vec![
        row("Total records", summary.total),
        row("Original", summary.original_count),
        row("Interpolated", summary.interpolated_count),
        row(
            "Interpolation ratio",
            format!("{:.1}%", summary.interpolation_ratio * 100.0),
        ),
        row("Servers", summary.server_distribution.len()),
    ];
    if let Some(range) = summary.time_range {
        rows.push(row("From", range.start.to_rfc3339()));
        rows.push(row("To", range.end.to_rfc3339()));
    }
    for (status, count) in &summary.status_distribution {
        rows.push(StatRow {
            metric: color_status(*status),
            value: count.to_string(),
        });
    }

    print_rows(rows, &summary, format)
}

/// Check interpolated output against its source; fails when the report is invalid
pub async fn validate_command(
    original: &Path,
    interpolated: &Path,
    format: OutputFormat,
) -> Result<()> {
    let original: Vec<MetricRecord> = read_json_lines(original).await?;
    let interpolated: Vec<InterpolatedMetricRecord> = read_json_lines(interpolated).await?;
    let report = validate_quality(&original, &interpolated);
    info!(
        original = original.len(),
        interpolated = interpolated.len(),
        quality_score = report.quality_score,
        "Validated interpolated dataset"
    );

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            println!("Quality score: {}", color_score(report.quality_score));
            for error in &report.errors {
                print_error(error);
            }
            for warning in &report.warnings {
                print_warning(warning);
            }
            if report.is_valid {
                print_success("Interpolated dataset is valid");
            }
        }
    }

    if !report.is_valid {
        bail!(
            "quality check failed with {} error(s)",
            report.errors.len()
        );
    }
    Ok(())
}
