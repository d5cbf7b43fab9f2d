//! Metrics simulator service
//!
//! Generates a dataset at startup, checks interpolation quality on it,
//! optionally exports it as JSON lines and serves it over HTTP.

pub mod api;
pub mod config;

use anyhow::{Context, Result};
use sim_lib::{
    health::{components, HealthRegistry},
    interpolation::{interpolate_by_server_concurrent, validate_quality},
    observability::{SimMetrics, StructuredLogger},
    BatchWriter, DatasetCache, InterpolationOptions, JsonLinesSink, MetricRecord, SinkReport,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Build the startup dataset and the shared state serving it
pub async fn bootstrap(
    config: &config::ServerConfig,
    health_registry: HealthRegistry,
    metrics: SimMetrics,
    cache: &DatasetCache,
) -> Result<Arc<api::AppState>> {
    let logger = StructuredLogger::new("sim-server");
    health_registry.register(components::GENERATOR).await;
    health_registry.register(components::CACHE).await;

    let builder = config.simulation_builder().metrics(metrics.clone());
    let dataset = match cache.get_or_generate(builder) {
        Ok(dataset) => dataset,
        Err(err) => {
            health_registry
                .set_unhealthy(components::GENERATOR, err.to_string())
                .await;
            return Err(err.context("Failed to generate startup dataset"));
        }
    };
    let cache_stats = cache.stats();
    info!(
        seed = dataset.seed,
        servers = dataset.roster.len(),
        records = dataset.records.len(),
        cache_entries = cache_stats.entries,
        "Startup dataset ready"
    );

    let outcome = interpolate_by_server_concurrent(
        &dataset.records,
        &InterpolationOptions::default(),
        dataset.seed,
    )
    .await?;
    let report = validate_quality(&dataset.records, &outcome.records);
    metrics.set_quality_score(report.quality_score);
    logger.log_quality_report(&report);
    health_registry.record_quality(&report).await;

    if let Some(path) = &config.export_path {
        health_registry.register(components::SINK).await;
        if let Err(err) = export(path, &dataset.records).await {
            health_registry
                .set_unhealthy(components::SINK, err.to_string())
                .await;
            return Err(err).with_context(|| format!("Failed to export to {}", path.display()));
        }
    }

    Ok(Arc::new(api::AppState::new(health_registry, metrics, dataset)))
}

async fn export(path: &Path, records: &[MetricRecord]) -> Result<SinkReport> {
    let sink = JsonLinesSink::open(path).await?;
    BatchWriter::default().write_all(&sink, records).await
}
