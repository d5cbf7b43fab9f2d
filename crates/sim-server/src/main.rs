//! Metrics simulator server
//!
//! Generates a synthetic multi-server metrics dataset and serves it,
//! along with health probes and Prometheus metrics, over HTTP.

use anyhow::Result;
use sim_lib::{observability::StructuredLogger, DatasetCache, HealthRegistry, SimMetrics};
use sim_server::{api, bootstrap, config::ServerConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServerConfig::load()?;
    info!(port = config.port, horizon_points = config.horizon_points, "Server configured");

    let logger = StructuredLogger::new("sim-server");
    logger.log_startup(SERVER_VERSION);

    let metrics = SimMetrics::new();
    let health_registry = HealthRegistry::new();
    let cache = DatasetCache::with_metrics(metrics.clone());

    let state = bootstrap(&config, health_registry.clone(), metrics, &cache).await?;
    health_registry.set_ready(true).await;

    tokio::select! {
        result = api::serve(config.port, state) => result?,
        _ = tokio::signal::ctrl_c() => logger.log_shutdown("SIGINT received"),
    }

    Ok(())
}
