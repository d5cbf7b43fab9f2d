//! Server roster construction
//!
//! Builds the logical server fleet for a run. Each class draws its baseline
//! and characteristics from class-specific ranges.

use crate::error::{Result, SimError, MAX_SERVERS_PER_CLASS};
use crate::models::{Baseline, Characteristics, ClassCounts, ServerClass, ServerDescriptor};
use rand::Rng;
use std::ops::Range;
use tracing::debug;

/// Generation ranges for one server class
#[derive(Debug, Clone)]
pub struct ClassProfile {
    pub cpu: Range<f64>,
    pub memory: Range<f64>,
    pub disk: Range<f64>,
    pub response_time_ms: Range<f64>,
    pub cpu_volatility: Range<f64>,
    pub memory_growth_rate: Range<f64>,
    pub disk_growth_rate: Range<f64>,
    pub response_spike_probability: Range<f64>,
}

impl ClassProfile {
    pub fn for_class(class: ServerClass) -> Self {
        match class {
            ServerClass::Web => Self {
                cpu: 20.0..45.0,
                memory: 30.0..55.0,
                disk: 20.0..40.0,
                response_time_ms: 80.0..200.0,
                cpu_volatility: 0.2..0.4,
                memory_growth_rate: 0.0001..0.0004,
                disk_growth_rate: 0.00005..0.0002,
                response_spike_probability: 0.02..0.05,
            },
            ServerClass::Api => Self {
                cpu: 25.0..50.0,
                memory: 35.0..60.0,
                disk: 15.0..35.0,
                response_time_ms: 50.0..150.0,
                cpu_volatility: 0.25..0.45,
                memory_growth_rate: 0.0002..0.0005,
                disk_growth_rate: 0.00005..0.0002,
                response_spike_probability: 0.03..0.06,
            },
            ServerClass::Db => Self {
                cpu: 25.0..55.0,
                memory: 50.0..70.0,
                disk: 40.0..65.0,
                response_time_ms: 10.0..50.0,
                cpu_volatility: 0.1..0.25,
                memory_growth_rate: 0.0001..0.0003,
                disk_growth_rate: 0.0002..0.0006,
                response_spike_probability: 0.01..0.03,
            },
            ServerClass::Cache => Self {
                cpu: 10.0..30.0,
                memory: 60.0..85.0,
                disk: 10.0..25.0,
                response_time_ms: 1.0..10.0,
                cpu_volatility: 0.1..0.2,
                memory_growth_rate: 0.00005..0.0002,
                disk_growth_rate: 0.00001..0.00005,
                response_spike_probability: 0.005..0.02,
            },
            ServerClass::Worker => Self {
                cpu: 30.0..60.0,
                memory: 30.0..60.0,
                disk: 20.0..50.0,
                response_time_ms: 200.0..800.0,
                cpu_volatility: 0.3..0.5,
                memory_growth_rate: 0.0002..0.0006,
                disk_growth_rate: 0.0001..0.0004,
                response_spike_probability: 0.02..0.04,
            },
        }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (Baseline, Characteristics) {
        let baseline = Baseline {
            cpu: rng.gen_range(self.cpu.clone()),
            memory: rng.gen_range(self.memory.clone()),
            disk: rng.gen_range(self.disk.clone()),
            response_time_ms: rng.gen_range(self.response_time_ms.clone()),
        };
        let characteristics = Characteristics {
            cpu_volatility: rng.gen_range(self.cpu_volatility.clone()),
            memory_growth_rate: rng.gen_range(self.memory_growth_rate.clone()),
            disk_growth_rate: rng.gen_range(self.disk_growth_rate.clone()),
            response_spike_probability: rng.gen_range(self.response_spike_probability.clone()),
        };
        (baseline, characteristics)
    }
}

/// Build a roster with `counts` servers per class.
///
/// Ids are `<class>-NN`, numbered from 01 within each class.
pub fn build_roster<R: Rng + ?Sized>(
    counts: &ClassCounts,
    rng: &mut R,
) -> Result<Vec<ServerDescriptor>> {
    for class in ServerClass::ALL {
        let count = counts.get(class);
        if count > MAX_SERVERS_PER_CLASS {
            return Err(SimError::TooManyServers {
                class: class.to_string(),
                count,
                max: MAX_SERVERS_PER_CLASS,
            });
        }
    }
    if counts.total() == 0 {
        return Err(SimError::EmptyRoster);
    }

    let mut roster = Vec::with_capacity(counts.total());
    for class in ServerClass::ALL {
        let profile = ClassProfile::for_class(class);
        for n in 1..=counts.get(class) {
            let (baseline, characteristics) = profile.sample(rng);
            roster.push(ServerDescriptor {
                id: format!("{}-{:02}", class, n),
                server_class: class,
                baseline,
                characteristics,
            });
        }
    }

    debug!(servers = roster.len(), "Built server roster");
    Ok(roster)
}
