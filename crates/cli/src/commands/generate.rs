//! `msim generate`: run a simulation and store or summarize it

use super::SimulationArgs;
use crate::output::{
    color_status, format_ms, format_percent, print_info, print_rows, print_success, OutputFormat,
};
use anyhow::{Context, Result};
use serde::Serialize;
use sim_lib::sink::DEFAULT_BATCH_SIZE;
use sim_lib::{BatchWriter, Dataset, HealthStatus, JsonLinesSink};
use std::path::Path;
use std::time::Duration;
use tabled::Tabled;
use tracing::{debug, info};

/// Per-server summary row
#[derive(Tabled)]
struct ServerRow {
    #[tabled(rename = "Server")]
    server: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Records")]
    records: usize,
    #[tabled(rename = "Avg CPU")]
    avg_cpu: String,
    #[tabled(rename = "Peak CPU")]
    peak_cpu: String,
    #[tabled(rename = "Peak Mem")]
    peak_memory: String,
    #[tabled(rename = "Peak RT")]
    peak_response: String,
    #[tabled(rename = "Worst")]
    worst: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportSummary<'a> {
    path: &'a Path,
    seed: u64,
    servers: usize,
    failure_events: usize,
    records: usize,
    batches: usize,
}

fn summarize(dataset: &Dataset) -> Vec<ServerRow> {
    dataset
        .roster
        .iter()
        .map(|server| {
            let series = dataset.series_for(&server.id);
            let n = series.len().max(1) as f64;
            let max = |f: fn(&sim_lib::MetricRecord) -> f64| {
                series.iter().map(f).fold(0.0_f64, f64::max)
            };
            let worst = series
                .iter()
                .map(|r| r.status)
                .max()
                .unwrap_or(HealthStatus::Healthy);

            ServerRow {
                server: server.id.clone(),
                class: server.server_class.to_string(),
                records: series.len(),
                avg_cpu: format_percent(series.iter().map(|r| r.cpu).sum::<f64>() / n),
                peak_cpu: format_percent(max(|r| r.cpu)),
                peak_memory: format_percent(max(|r| r.memory)),
                peak_response: format_ms(max(|r| r.response_time_ms)),
                worst: color_status(worst),
            }
        })
        .collect()
}

/// Generate a dataset; write JSON lines to `output` or print a summary
pub async fn run(
    args: &SimulationArgs,
    output: Option<&Path>,
    batch_pause: Duration,
    default_seed: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let dataset = args.builder(default_seed).build()?.run()?;

    let Some(path) = output else {
        return print_rows(summarize(&dataset), &dataset, format);
    };

    if path.exists() {
        debug!(path = %path.display(), "Replacing existing output file");
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
    }
    let sink = JsonLinesSink::open(path).await?;
    let report = BatchWriter::new(DEFAULT_BATCH_SIZE, batch_pause)
        .write_all(&sink, &dataset.records)
        .await?;
    info!(
        path = %path.display(),
        seed = dataset.seed,
        records = report.records,
        batches = report.batches,
        "Exported dataset"
    );

    match format {
        OutputFormat::Json => {
            let summary = ExportSummary {
                path,
                seed: dataset.seed,
                servers: dataset.roster.len(),
                failure_events: dataset.schedule.len(),
                records: report.records,
                batches: report.batches,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Table => {
            print_success(&format!(
                "Wrote {} records in {} batches to {}",
                report.records,
                report.batches,
                path.display()
            ));
            print_info(&format!(
                "{} servers, {} failure events, seed {}",
                dataset.roster.len(),
                dataset.schedule.len(),
                dataset.seed
            ));
        }
    }
    Ok(())
}
