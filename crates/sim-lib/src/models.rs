//! Core data models for the metrics simulator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Role a simulated server plays in the fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerClass {
    Web,
    Api,
    Db,
    Cache,
    Worker,
}

impl ServerClass {
    pub const ALL: [ServerClass; 5] = [
        ServerClass::Web,
        ServerClass::Api,
        ServerClass::Db,
        ServerClass::Cache,
        ServerClass::Worker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerClass::Web => "web",
            ServerClass::Api => "api",
            ServerClass::Db => "db",
            ServerClass::Cache => "cache",
            ServerClass::Worker => "worker",
        }
    }
}

impl fmt::Display for ServerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unloaded resource baseline for a server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub response_time_ms: f64,
}

/// Stochastic behaviour of a server over a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Characteristics {
    pub cpu_volatility: f64,
    pub memory_growth_rate: f64,
    pub disk_growth_rate: f64,
    pub response_spike_probability: f64,
}

/// Identity and generation parameters for one simulated server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescriptor {
    pub id: String,
    pub server_class: ServerClass,
    pub baseline: Baseline,
    pub characteristics: Characteristics,
}

/// Discrete health status derived from metric thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    pub timestamp: DateTime<Utc>,
    pub server_id: String,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub response_time_ms: f64,
    pub status: HealthStatus,
}

/// A metric record annotated with interpolation provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatedMetricRecord {
    #[serde(flatten)]
    pub record: MetricRecord,
    /// Absent on plain records, which read back as originals
    #[serde(default)]
    pub interpolated: bool,
    /// Index of the coarse pair (or original sample) this record came from
    #[serde(default)]
    pub source_index: usize,
}

impl InterpolatedMetricRecord {
    pub fn original(record: MetricRecord, source_index: usize) -> Self {
        Self {
            record,
            interpolated: false,
            source_index,
        }
    }
}

/// Failure scenario kinds the engine can inject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePattern {
    MemoryLeak,
    CpuSpike,
    DiskFull,
    CascadeFailure,
    NetworkLatency,
    DatabaseLock,
    GradualDegradation,
}

impl FailurePattern {
    pub const ALL: [FailurePattern; 7] = [
        FailurePattern::MemoryLeak,
        FailurePattern::CpuSpike,
        FailurePattern::DiskFull,
        FailurePattern::CascadeFailure,
        FailurePattern::NetworkLatency,
        FailurePattern::DatabaseLock,
        FailurePattern::GradualDegradation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePattern::MemoryLeak => "memory_leak",
            FailurePattern::CpuSpike => "cpu_spike",
            FailurePattern::DiskFull => "disk_full",
            FailurePattern::CascadeFailure => "cascade_failure",
            FailurePattern::NetworkLatency => "network_latency",
            FailurePattern::DatabaseLock => "database_lock",
            FailurePattern::GradualDegradation => "gradual_degradation",
        }
    }
}

impl fmt::Display for FailurePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEvent {
    pub pattern: FailurePattern,
    pub origin_server_id: String,
    pub start_index: usize,
    pub duration_points: usize,
    /// In (0, 1]
    pub severity: f64,
    #[serde(default)]
    pub cascade_targets: BTreeSet<String>,
}

impl FailureEvent {
    /// First time-point after the event window
    pub fn end_index(&self) -> usize {
        self.start_index + self.duration_points
    }
}

/// Requested server count per class; `None` falls back to the class default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub web: Option<usize>,
    pub api: Option<usize>,
    pub db: Option<usize>,
    pub cache: Option<usize>,
    pub worker: Option<usize>,
}

impl ClassCounts {
    pub fn default_for(class: ServerClass) -> usize {
        match class {
            ServerClass::Web => 3,
            ServerClass::Api => 3,
            ServerClass::Db => 2,
            ServerClass::Cache => 2,
            ServerClass::Worker => 2,
        }
    }

    /// Effective count for a class
    pub fn get(&self, class: ServerClass) -> usize {
        let requested = match class {
            ServerClass::Web => self.web,
            ServerClass::Api => self.api,
            ServerClass::Db => self.db,
            ServerClass::Cache => self.cache,
            ServerClass::Worker => self.worker,
        };
        requested.unwrap_or_else(|| Self::default_for(class))
    }

    /// Explicit zero for every class not set
    pub fn only(class: ServerClass, count: usize) -> Self {
        let mut counts = Self {
            web: Some(0),
            api: Some(0),
            db: Some(0),
            cache: Some(0),
            worker: Some(0),
        };
        match class {
            ServerClass::Web => counts.web = Some(count),
            ServerClass::Api => counts.api = Some(count),
            ServerClass::Db => counts.db = Some(count),
            ServerClass::Cache => counts.cache = Some(count),
            ServerClass::Worker => counts.worker = Some(count),
        }
        counts
    }

    pub fn total(&self) -> usize {
        ServerClass::ALL.iter().map(|c| self.get(*c)).sum()
    }
}
