//! Observability for the simulator
//!
//! Provides:
//! - Prometheus metrics (generation/interpolation latency, volumes, quality)
//! - Structured logging of run lifecycle events with tracing

use crate::interpolation::{InterpolationOutcome, QualityReport};
use crate::models::FailureEvent;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for generation work (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SimMetricsInner> = OnceLock::new();

struct SimMetricsInner {
    generation_latency_seconds: Histogram,
    interpolation_latency_seconds: Histogram,
    records_generated: IntCounter,
    interpolated_points: IntCounter,
    failure_events_scheduled: IntCounter,
    pairs_skipped: IntCounter,
    servers_simulated: IntGauge,
    quality_score: IntGauge,
    cache_lookups: IntCounterVec,
}

impl SimMetricsInner {
    fn new() -> Self {
        Self {
            generation_latency_seconds: register_histogram!(
                "sim_generation_latency_seconds",
                "Time spent building roster, schedule and raw metric records",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register generation_latency_seconds"),

            interpolation_latency_seconds: register_histogram!(
                "sim_interpolation_latency_seconds",
                "Time spent interpolating coarse series",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register interpolation_latency_seconds"),

            records_generated: register_int_counter!(
                "sim_records_generated_total",
                "Raw metric records synthesized"
            )
            .expect("Failed to register records_generated"),

            interpolated_points: register_int_counter!(
                "sim_interpolated_points_total",
                "Synthetic points emitted by interpolation"
            )
            .expect("Failed to register interpolated_points"),

            failure_events_scheduled: register_int_counter!(
                "sim_failure_events_scheduled_total",
                "Failure events scheduled across all runs"
            )
            .expect("Failed to register failure_events_scheduled"),

            pairs_skipped: register_int_counter!(
                "sim_interpolation_pairs_skipped_total",
                "Coarse pairs skipped because of irregular gaps"
            )
            .expect("Failed to register pairs_skipped"),

            servers_simulated: register_int_gauge!(
                "sim_servers_simulated",
                "Servers in the most recent roster"
            )
            .expect("Failed to register servers_simulated"),

            quality_score: register_int_gauge!(
                "sim_quality_score",
                "Quality score of the most recent interpolation check"
            )
            .expect("Failed to register quality_score"),

            cache_lookups: register_int_counter_vec!(
                "sim_dataset_cache_lookups_total",
                "Dataset cache lookups by result",
                &["result"]
            )
            .expect("Failed to register cache_lookups"),
        }
    }
}

/// Handle to the global simulator metrics. Clones share the same metrics.
#[derive(Clone, Debug)]
pub struct SimMetrics {
    _private: (),
}

impl Default for SimMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SimMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SimMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SimMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_generation(
        &self,
        duration_secs: f64,
        servers: usize,
        records: usize,
        events: usize,
    ) {
        let inner = self.inner();
        inner.generation_latency_seconds.observe(duration_secs);
        inner.servers_simulated.set(servers as i64);
        inner.records_generated.inc_by(records as u64);
        inner.failure_events_scheduled.inc_by(events as u64);
    }

    pub fn observe_interpolation(&self, duration_secs: f64, outcome: &InterpolationOutcome) {
        let inner = self.inner();
        inner.interpolation_latency_seconds.observe(duration_secs);
        inner.interpolated_points.inc_by(outcome.points_generated as u64);
        inner.pairs_skipped.inc_by(outcome.pairs_skipped as u64);
    }

    pub fn set_quality_score(&self, score: u32) {
        self.inner().quality_score.set(score as i64);
    }

    pub fn inc_cache_hit(&self) {
        self.inner().cache_lookups.with_label_values(&["hit"]).inc();
    }

    pub fn inc_cache_miss(&self) {
        self.inner().cache_lookups.with_label_values(&["miss"]).inc();
    }
}

/// Structured logger for simulation lifecycle events
#[derive(Clone, Debug)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn log_run_started(
        &self,
        seed: u64,
        servers: usize,
        horizon_points: usize,
        interval_minutes: u32,
    ) {
        info!(
            event = "run_started",
            component = %self.component,
            seed = seed,
            servers = servers,
            horizon_points = horizon_points,
            interval_minutes = interval_minutes,
            "Simulation run started"
        );
    }

    pub fn log_failure_scheduled(&self, event: &FailureEvent) {
        info!(
            event = "failure_scheduled",
            component = %self.component,
            pattern = %event.pattern,
            origin = %event.origin_server_id,
            start_index = event.start_index,
            duration_points = event.duration_points,
            severity = event.severity,
            cascade_targets = event.cascade_targets.len(),
            "Failure event scheduled"
        );
    }

    pub fn log_run_completed(&self, records: usize, events: usize, elapsed_ms: u128) {
        info!(
            event = "run_completed",
            component = %self.component,
            records = records,
            failure_events = events,
            elapsed_ms = elapsed_ms,
            "Simulation run completed"
        );
    }

    pub fn log_interpolation(&self, outcome: &InterpolationOutcome) {
        if outcome.pairs_skipped > 0 {
            warn!(
                event = "interpolation_completed",
                component = %self.component,
                records = outcome.records.len(),
                pairs_interpolated = outcome.pairs_interpolated,
                pairs_skipped = outcome.pairs_skipped,
                "Interpolation completed with skipped pairs"
            );
        } else {
            info!(
                event = "interpolation_completed",
                component = %self.component,
                records = outcome.records.len(),
                pairs_interpolated = outcome.pairs_interpolated,
                "Interpolation completed"
            );
        }
    }

    pub fn log_quality_report(&self, report: &QualityReport) {
        if report.is_valid {
            info!(
                event = "quality_checked",
                component = %self.component,
                quality_score = report.quality_score,
                warnings = report.warnings.len(),
                "Interpolation quality check passed"
            );
        } else {
            warn!(
                event = "quality_checked",
                component = %self.component,
                quality_score = report.quality_score,
                errors = report.errors.len(),
                first_error = %report.errors.first().map(String::as_str).unwrap_or(""),
                "Interpolation quality check failed"
            );
        }
    }

    pub fn log_sink_flush(&self, sink: &str, batches: usize, records: usize) {
        info!(
            event = "sink_flushed",
            component = %self.component,
            sink = %sink,
            batches = batches,
            records = records,
            "Records written to sink"
        );
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "service_started",
            component = %self.component,
            version = %version,
            "Metrics simulator started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            component = %self.component,
            reason = %reason,
            "Metrics simulator shutting down"
        );
    }
}
