//! Simulation orchestration
//!
//! This module provides:
//! - `SimulationConfig`: serde-friendly run parameters with defaults
//! - `SimulationBuilder`: fluent construction with fail-fast validation
//! - `Simulation`: roster -> failure schedule -> synthesis over one seeded RNG
//! - `Dataset`: the generated roster, schedule and records

use crate::error::{Result, SimError, MAX_SERVERS_PER_CLASS};
use crate::failure::{schedule_events, CascadeConfig};
use crate::models::{ClassCounts, FailureEvent, MetricRecord, ServerClass, ServerDescriptor};
use crate::observability::{SimMetrics, StructuredLogger};
use crate::roster::build_roster;
use crate::synthesizer::synthesize;
use chrono::{DateTime, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One day at the default 10-minute interval
pub const DEFAULT_HORIZON_POINTS: usize = 144;

pub const DEFAULT_INTERVAL_MINUTES: u32 = 10;

/// Parameters of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    pub counts: ClassCounts,
    pub horizon_points: usize,
    pub interval_minutes: u32,
    /// Defaults to midnight UTC of the current day
    pub start_time: Option<DateTime<Utc>>,
    /// Drawn from OS entropy when absent; the resolved value is kept on the dataset
    pub seed: Option<u64>,
    pub cascade: CascadeConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            counts: ClassCounts::default(),
            horizon_points: DEFAULT_HORIZON_POINTS,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            start_time: None,
            seed: None,
            cascade: CascadeConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        for class in ServerClass::ALL {
            let count = self.counts.get(class);
            if count > MAX_SERVERS_PER_CLASS {
                return Err(SimError::TooManyServers {
                    class: class.to_string(),
                    count,
                    max: MAX_SERVERS_PER_CLASS,
                });
            }
        }
        if self.counts.total() == 0 {
            return Err(SimError::EmptyRoster);
        }
        if self.horizon_points == 0 {
            return Err(SimError::ZeroHorizon);
        }
        if self.interval_minutes == 0 {
            return Err(SimError::ZeroInterval);
        }

        let probabilities = [
            ("same_class_probability", self.cascade.same_class_probability),
            ("db_dependents_probability", self.cascade.db_dependents_probability),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::InvalidOption {
                    name,
                    value: value.to_string(),
                    reason: "must be within [0, 1]",
                });
            }
        }
        Ok(())
    }
}

/// Midnight UTC of the day containing `now`
pub fn midnight_utc(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Roster and failure schedule drawn before any records are synthesized
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub roster: Vec<ServerDescriptor>,
    pub schedule: Vec<FailureEvent>,
}

/// Output of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub roster: Vec<ServerDescriptor>,
    pub schedule: Vec<FailureEvent>,
    pub records: Vec<MetricRecord>,
    pub start_time: DateTime<Utc>,
    pub interval_minutes: u32,
    pub horizon_points: usize,
    pub seed: u64,
}

impl Dataset {
    /// Time-ordered records of one server, empty for unknown ids
    pub fn series_for(&self, server_id: &str) -> Vec<MetricRecord> {
        self.records
            .iter()
            .filter(|r| r.server_id == server_id)
            .cloned()
            .collect()
    }

    pub fn server(&self, server_id: &str) -> Option<&ServerDescriptor> {
        self.roster.iter().find(|s| s.id == server_id)
    }

    /// Events where the server is the origin or a cascade target
    pub fn events_for(&self, server_id: &str) -> Vec<&FailureEvent> {
        self.schedule
            .iter()
            .filter(|e| e.exposure(server_id).is_some())
            .collect()
    }
}

/// A configured, seeded simulation run
pub struct Simulation {
    config: SimulationConfig,
    seed: u64,
    start_time: DateTime<Utc>,
    rng: StdRng,
    logger: StructuredLogger,
    metrics: Option<SimMetrics>,
}

impl Simulation {
    /// Validate `config` and resolve its start time and seed
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let start_time = config
            .start_time
            .unwrap_or_else(|| midnight_utc(Utc::now()));

        Ok(Self {
            config,
            seed,
            start_time,
            rng: StdRng::seed_from_u64(seed),
            logger: StructuredLogger::new("generator"),
            metrics: None,
        })
    }

    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Draw the roster and failure schedule
    pub fn plan(&mut self) -> Result<Plan> {
        let roster = build_roster(&self.config.counts, &mut self.rng)?;
        let schedule = schedule_events(
            &roster,
            self.config.horizon_points,
            &self.config.cascade,
            &mut self.rng,
        )?;
        Ok(Plan { roster, schedule })
    }

    /// Synthesize records for a plan drawn from this simulation
    pub fn synthesize(&mut self, plan: Plan) -> Result<Dataset> {
        let started = Instant::now();
        self.logger.log_run_started(
            self.seed,
            plan.roster.len(),
            self.config.horizon_points,
            self.config.interval_minutes,
        );
        for event in &plan.schedule {
            self.logger.log_failure_scheduled(event);
        }

        let records = synthesize(
            &plan.roster,
            &plan.schedule,
            self.config.horizon_points,
            self.config.interval_minutes,
            self.start_time,
            &mut self.rng,
        )?;

        let elapsed = started.elapsed();
        self.logger
            .log_run_completed(records.len(), plan.schedule.len(), elapsed.as_millis());
        if let Some(metrics) = &self.metrics {
            metrics.observe_generation(
                elapsed.as_secs_f64(),
                plan.roster.len(),
                records.len(),
                plan.schedule.len(),
            );
        }

        Ok(Dataset {
            roster: plan.roster,
            schedule: plan.schedule,
            records,
            start_time: self.start_time,
            interval_minutes: self.config.interval_minutes,
            horizon_points: self.config.horizon_points,
            seed: self.seed,
        })
    }

    /// Plan and synthesize in one step
    pub fn run(&mut self) -> Result<Dataset> {
        let plan = self.plan()?;
        self.synthesize(plan)
    }
}

/// Builder for [`Simulation`]
#[derive(Debug, Clone, Default)]
pub struct SimulationBuilder {
    config: SimulationConfig,
    component: Option<String>,
    metrics: Option<SimMetrics>,
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn counts(mut self, counts: ClassCounts) -> Self {
        self.config.counts = counts;
        self
    }

    /// Override a single class count
    pub fn class_count(mut self, class: ServerClass, count: usize) -> Self {
        let counts = &mut self.config.counts;
        match class {
            ServerClass::Web => counts.web = Some(count),
            ServerClass::Api => counts.api = Some(count),
            ServerClass::Db => counts.db = Some(count),
            ServerClass::Cache => counts.cache = Some(count),
            ServerClass::Worker => counts.worker = Some(count),
        }
        self
    }

    pub fn horizon_points(mut self, points: usize) -> Self {
        self.config.horizon_points = points;
        self
    }

    pub fn interval_minutes(mut self, minutes: u32) -> Self {
        self.config.interval_minutes = minutes;
        self
    }

    pub fn start_time(mut self, start: DateTime<Utc>) -> Self {
        self.config.start_time = Some(start);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn cascade(mut self, cascade: CascadeConfig) -> Self {
        self.config.cascade = cascade;
        self
    }

    /// Component name attached to run logs
    pub fn component(mut self, name: impl Into<String>) -> Self {
        self.component = Some(name.into());
        self
    }

    /// Record run metrics into the global registry
    pub fn metrics(mut self, metrics: SimMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<Simulation> {
        let mut simulation = Simulation::new(self.config)?;
        if let Some(name) = self.component {
            simulation.logger = StructuredLogger::new(name);
        }
        simulation.metrics = self.metrics;
        Ok(simulation)
    }
}
