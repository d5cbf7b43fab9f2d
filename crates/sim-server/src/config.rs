//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use sim_lib::{ClassCounts, SimulationBuilder, SimulationConfig};
use std::path::PathBuf;

/// Server configuration, read from `SIM_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port for health, metrics and dataset endpoints
    #[serde(default = "default_port")]
    pub port: u16,

    /// Points per server in the startup dataset
    #[serde(default = "default_horizon_points")]
    pub horizon_points: usize,

    /// Minutes between synthesized samples
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,

    /// Fixed seed for reproducible datasets
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub web_servers: Option<usize>,
    #[serde(default)]
    pub api_servers: Option<usize>,
    #[serde(default)]
    pub db_servers: Option<usize>,
    #[serde(default)]
    pub cache_servers: Option<usize>,
    #[serde(default)]
    pub worker_servers: Option<usize>,

    /// Write the startup dataset here as JSON lines
    #[serde(default)]
    pub export_path: Option<PathBuf>,
}

fn default_port() -> u16 {
    8080
}

fn default_horizon_points() -> usize {
    sim_lib::simulation::DEFAULT_HORIZON_POINTS
}

fn default_interval_minutes() -> u32 {
    sim_lib::simulation::DEFAULT_INTERVAL_MINUTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            horizon_points: default_horizon_points(),
            interval_minutes: default_interval_minutes(),
            seed: None,
            web_servers: None,
            api_servers: None,
            db_servers: None,
            cache_servers: None,
            worker_servers: None,
            export_path: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_env(config::Environment::with_prefix("SIM"))
    }

    pub fn from_env(env: config::Environment) -> Result<Self> {
        config::Config::builder()
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read SIM_* environment")?
            .try_deserialize()
            .context("Invalid SIM_* configuration")
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            counts: ClassCounts {
                web: self.web_servers,
                api: self.api_servers,
                db: self.db_servers,
                cache: self.cache_servers,
                worker: self.worker_servers,
            },
            horizon_points: self.horizon_points,
            interval_minutes: self.interval_minutes,
            start_time: None,
            seed: self.seed,
            ..SimulationConfig::default()
        }
    }

    pub fn simulation_builder(&self) -> SimulationBuilder {
        SimulationBuilder::new()
            .config(self.simulation_config())
            .component("sim-server")
    }
}
