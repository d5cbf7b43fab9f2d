//! Synthetic server metrics library
//!
//! This crate provides the core functionality for:
//! - Building rosters of simulated servers across web/api/db/cache/worker classes
//! - Scheduling failure events with cascades and computing their impact
//! - Synthesizing business-hour-shaped metric series
//! - Upsampling coarse series with noise-aware interpolation and quality checks
//! - Caching, persistence sinks, health checks and observability

pub mod cache;
pub mod error;
pub mod failure;
pub mod health;
pub mod interpolation;
pub mod load_model;
pub mod models;
pub mod observability;
pub mod roster;
pub mod simulation;
pub mod sink;
pub mod status;
pub mod synthesizer;

#[cfg(test)]
mod tests;

pub use cache::DatasetCache;
pub use error::{Result, SimError};
pub use failure::{CascadeConfig, FailureEngine, FailureImpact};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use interpolation::{
    InterpolationOptions, InterpolationOutcome, InterpolationStats, QualityReport, Resolution,
};
pub use models::*;
pub use observability::{SimMetrics, StructuredLogger};
pub use roster::build_roster;
pub use simulation::{Dataset, Simulation, SimulationBuilder, SimulationConfig};
pub use sink::{BatchWriter, JsonLinesSink, MemorySink, MetricSink, SinkReport};
pub use status::classify;
pub use synthesizer::synthesize;
