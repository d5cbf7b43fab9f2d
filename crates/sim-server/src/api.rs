//! HTTP API for probes, Prometheus metrics and dataset queries

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use sim_lib::{
    health::{ComponentStatus, HealthRegistry},
    interpolation::{interpolate_by_server_concurrent, stats, InterpolationOutcome},
    observability::{SimMetrics, StructuredLogger},
    Dataset, FailureEvent, InterpolationOptions, MetricRecord, Resolution, ServerDescriptor,
    SimError,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: SimMetrics,
    pub dataset: Arc<Dataset>,
    /// Base seed for per-request interpolation workers
    pub interpolation_seed: u64,
    logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: SimMetrics,
        dataset: Arc<Dataset>,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            interpolation_seed: dataset.seed,
            dataset,
            logger: StructuredLogger::new("api"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SimError> for ApiError {
    fn from(err: SimError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(err) => {
                error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

/// Health check response - 200 while operational, 503 when a component failed
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(anyhow::Error::from)?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

async fn list_servers(State(state): State<Arc<AppState>>) -> Json<Vec<ServerDescriptor>> {
    Json(state.dataset.roster.clone())
}

#[derive(Debug, Default, Deserialize)]
pub struct FailuresQuery {
    pub server_id: Option<String>,
}

async fn list_failures(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FailuresQuery>,
) -> Json<Vec<FailureEvent>> {
    let events = match &query.server_id {
        Some(id) => state.dataset.events_for(id).into_iter().cloned().collect(),
        None => state.dataset.schedule.clone(),
    };
    Json(events)
}

#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    pub server_id: Option<String>,
    /// Interpolate to 1, 2 or 5 minutes; raw records when absent
    pub resolution: Option<u32>,
    pub noise_level: Option<f64>,
    pub smoothing_factor: Option<f64>,
    pub preserve_original: Option<bool>,
}

impl MetricsQuery {
    fn options(&self, resolution: u32) -> Result<InterpolationOptions, ApiError> {
        let defaults = InterpolationOptions::default();
        let options = InterpolationOptions {
            resolution: Resolution::try_from(resolution)?,
            noise_level: self.noise_level.unwrap_or(defaults.noise_level),
            smoothing_factor: self.smoothing_factor.unwrap_or(defaults.smoothing_factor),
            preserve_original: self.preserve_original.unwrap_or(defaults.preserve_original),
        };
        options.validate()?;
        Ok(options)
    }
}

impl AppState {
    fn series(&self, server_id: Option<&str>) -> Result<Vec<MetricRecord>, ApiError> {
        match server_id {
            Some(id) if self.dataset.server(id).is_none() => {
                Err(ApiError::NotFound(format!("unknown server '{}'", id)))
            }
            Some(id) => Ok(self.dataset.series_for(id)),
            None => Ok(self.dataset.records.clone()),
        }
    }

    async fn interpolate(
        &self,
        series: &[MetricRecord],
        options: &InterpolationOptions,
    ) -> Result<InterpolationOutcome, ApiError> {
        let started = Instant::now();
        let outcome =
            interpolate_by_server_concurrent(series, options, self.interpolation_seed).await?;
        self.metrics
            .observe_interpolation(started.elapsed().as_secs_f64(), &outcome);
        self.logger.log_interpolation(&outcome);
        Ok(outcome)
    }
}

async fn query_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetricsQuery>,
) -> Result<Response, ApiError> {
    let series = state.series(query.server_id.as_deref())?;

    let Some(resolution) = query.resolution else {
        return Ok(Json(series).into_response());
    };
    let options = query.options(resolution)?;
    let outcome = state.interpolate(&series, &options).await?;
    Ok(Json(outcome.records).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub resolution: Option<u32>,
}

async fn dataset_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let resolution = match query.resolution {
        Some(minutes) => Resolution::try_from(minutes)?,
        None => InterpolationOptions::default().resolution,
    };
    let options = InterpolationOptions::with_resolution(resolution);
    let outcome = state.interpolate(&state.dataset.records, &options).await?;
    Ok(Json(stats(&outcome.records)))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/servers", get(list_servers))
        .route("/api/v1/failures", get(list_failures))
        .route("/api/v1/metrics", get(query_metrics))
        .route("/api/v1/stats", get(dataset_stats))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
