//! Subcommand implementations

pub mod analyze;
pub mod generate;
pub mod interpolate;
pub mod schedule;

use chrono::{DateTime, Utc};
use clap::Args;
use sim_lib::{ClassCounts, Simulation, SimulationBuilder};

/// Roster and horizon flags shared by `generate` and `schedule`
#[derive(Debug, Clone, Args)]
pub struct SimulationArgs {
    /// Web servers (default 3)
    #[arg(long)]
    pub web: Option<usize>,

    /// API servers (default 3)
    #[arg(long)]
    pub api: Option<usize>,

    /// Database servers (default 2)
    #[arg(long)]
    pub db: Option<usize>,

    /// Cache servers (default 2)
    #[arg(long)]
    pub cache: Option<usize>,

    /// Worker servers (default 2)
    #[arg(long)]
    pub worker: Option<usize>,

    /// Time-points per server
    #[arg(long, conflicts_with = "hours")]
    pub points: Option<usize>,

    /// Simulated hours, converted to points at the sampling interval
    #[arg(long)]
    pub hours: Option<u32>,

    /// Minutes between samples
    #[arg(long, default_value_t = 10)]
    pub interval: u32,

    /// Random seed for reproducible output
    #[arg(long, env = "MSIM_SEED")]
    pub seed: Option<u64>,

    /// RFC 3339 start time (defaults to midnight UTC today)
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,
}

impl SimulationArgs {
    pub fn horizon_points(&self) -> usize {
        match (self.points, self.hours) {
            (Some(points), _) => points,
            (None, Some(hours)) => (hours as usize * 60) / self.interval.max(1) as usize,
            (None, None) => sim_lib::simulation::DEFAULT_HORIZON_POINTS,
        }
    }

    pub fn builder(&self, default_seed: Option<u64>) -> SimulationBuilder {
        let mut builder = Simulation::builder()
            .counts(ClassCounts {
                web: self.web,
                api: self.api,
                db: self.db,
                cache: self.cache,
                worker: self.worker,
            })
            .horizon_points(self.horizon_points())
            .interval_minutes(self.interval)
            .component("msim");

        if let Some(seed) = self.seed.or(default_seed) {
            builder = builder.seed(seed);
        }
        if let Some(start) = self.start {
            builder = builder.start_time(start);
        }
        builder
    }
}
