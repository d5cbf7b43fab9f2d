//! Base metric synthesis
//!
//! Combines per-server baselines, the business-hour load curve, stochastic
//! volatility and failure impact into one record per (server, time-point).

use crate::error::{Result, SimError};
use crate::failure::{validate_schedule, FailureEngine};
use crate::load_model::load_factor;
use crate::models::{FailureEvent, MetricRecord, ServerDescriptor};
use crate::status::classify;
use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;
use tracing::debug;

/// Uniform noise half-widths applied to every sample
const CPU_NOISE: f64 = 5.0;
const MEMORY_NOISE: f64 = 2.5;
const DISK_NOISE: f64 = 1.5;
const RESPONSE_NOISE_FRACTION: f64 = 0.3;

/// Response-time spike multiplier range
const SPIKE_MIN: f64 = 2.0;
const SPIKE_MAX: f64 = 10.0;

/// Floor for response times in milliseconds
pub const MIN_RESPONSE_MS: f64 = 1.0;

/// Raw metric values before clamping and rounding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub response_time_ms: f64,
}

impl RawSample {
    /// Clamp to valid domains, round, and classify into a record
    pub fn finalize(self, timestamp: DateTime<Utc>, server_id: &str) -> MetricRecord {
        let cpu = round2(self.cpu.clamp(0.0, 100.0));
        let memory = round2(self.memory.clamp(0.0, 100.0));
        let disk = round2(self.disk.clamp(0.0, 100.0));
        let response_time_ms = self.response_time_ms.max(MIN_RESPONSE_MS).round();

        MetricRecord {
            timestamp,
            server_id: server_id.to_string(),
            cpu,
            memory,
            disk,
            response_time_ms,
            status: classify(cpu, memory, disk, response_time_ms),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fractional hour of day of `start` plus `t` intervals
pub fn hour_of_day(start: DateTime<Utc>, t: usize, interval_minutes: u32) -> f64 {
    let start_hour = start.num_seconds_from_midnight() as f64 / 3600.0;
    (start_hour + (t as f64 * interval_minutes as f64) / 60.0).rem_euclid(24.0)
}

/// Timestamp of time-point `t`
pub fn timestamp_at(start: DateTime<Utc>, t: usize, interval_minutes: u32) -> DateTime<Utc> {
    start + Duration::minutes(t as i64 * interval_minutes as i64)
}

/// Produce one record for `server` at time-point `t`
pub fn synthesize_point<R: Rng + ?Sized>(
    server: &ServerDescriptor,
    engine: &FailureEngine,
    t: usize,
    interval_minutes: u32,
    start_time: DateTime<Utc>,
    rng: &mut R,
) -> MetricRecord {
    let base = &server.baseline;
    let traits = &server.characteristics;

    let lf = load_factor(hour_of_day(start_time, t, interval_minutes), rng);
    let mut cpu = base.cpu * lf;
    let mut response_time_ms = base.response_time_ms * lf;
    let mut memory = base.memory;
    let mut disk = base.disk;

    // Monotonic drift over the run
    memory += memory * traits.memory_growth_rate * t as f64;
    disk += disk * traits.disk_growth_rate * t as f64;

    cpu += (rng.gen::<f64>() - 0.5) * traits.cpu_volatility * cpu;

    if rng.gen::<f64>() < traits.response_spike_probability {
        response_time_ms *= rng.gen_range(SPIKE_MIN..=SPIKE_MAX);
    }

    cpu += rng.gen_range(-CPU_NOISE..=CPU_NOISE);
    memory += rng.gen_range(-MEMORY_NOISE..=MEMORY_NOISE);
    disk += rng.gen_range(-DISK_NOISE..=DISK_NOISE);
    response_time_ms +=
        response_time_ms * rng.gen_range(-RESPONSE_NOISE_FRACTION..=RESPONSE_NOISE_FRACTION);

    let impact = engine.impact_at(&server.id, t);
    cpu += impact.cpu_impact;
    memory += impact.memory_impact;
    disk += impact.disk_impact;
    response_time_ms *= impact.response_time_multiplier;

    RawSample {
        cpu,
        memory,
        disk,
        response_time_ms,
    }
    .finalize(timestamp_at(start_time, t, interval_minutes), &server.id)
}

/// Synthesize `horizon_points` records for every server.
///
/// Output is ordered by time-point, then by roster order.
pub fn synthesize<R: Rng + ?Sized>(
    roster: &[ServerDescriptor],
    schedule: &[FailureEvent],
    horizon_points: usize,
    interval_minutes: u32,
    start_time: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<MetricRecord>> {
    if roster.is_empty() {
        return Err(SimError::EmptyRoster);
    }
    if horizon_points == 0 {
        return Err(SimError::ZeroHorizon);
    }
    if interval_minutes == 0 {
        return Err(SimError::ZeroInterval);
    }
    validate_schedule(roster, schedule, horizon_points)?;

    let engine = FailureEngine::new(roster, schedule.to_vec())?;
    let mut records = Vec::with_capacity(roster.len() * horizon_points);

    for t in 0..horizon_points {
        for server in roster {
            records.push(synthesize_point(
                server,
                &engine,
                t,
                interval_minutes,
                start_time,
                rng,
            ));
        }
    }

    debug!(
        servers = roster.len(),
        horizon_points,
        records = records.len(),
        "Synthesized metric records"
    );
    Ok(records)
}
