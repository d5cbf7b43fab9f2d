//! Upsampling of coarse 10-minute series
//!
//! This module provides:
//! - Linear interpolation between consecutive 10-minute samples
//! - Metric-specific Gaussian noise and smoothing toward the segment midpoint
//! - Single-series, per-server and concurrent per-server entry points
//! - Summary statistics and quality validation of the output

mod noise;
mod quality;

pub use noise::{gaussian, metric_noise, MetricKind};
pub use quality::{stats, validate_quality, InterpolationStats, QualityReport, TimeRange};

use crate::error::{Result, SimError};
use crate::models::{InterpolatedMetricRecord, MetricRecord};
use crate::synthesizer::RawSample;
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Spacing of the coarse input series
pub const SOURCE_INTERVAL_SECS: i64 = 600;

/// Target spacing of the interpolated series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Resolution {
    OneMinute,
    TwoMinutes,
    FiveMinutes,
}

impl Resolution {
    pub fn minutes(&self) -> u32 {
        match self {
            Resolution::OneMinute => 1,
            Resolution::TwoMinutes => 2,
            Resolution::FiveMinutes => 5,
        }
    }

    /// Synthetic points strictly between two 10-minute samples
    pub fn points_per_gap(&self) -> usize {
        (SOURCE_INTERVAL_SECS / (self.minutes() as i64 * 60)) as usize - 1
    }
}

impl TryFrom<u32> for Resolution {
    type Error = SimError;

    fn try_from(minutes: u32) -> Result<Self> {
        match minutes {
            1 => Ok(Resolution::OneMinute),
            2 => Ok(Resolution::TwoMinutes),
            5 => Ok(Resolution::FiveMinutes),
            other => Err(SimError::InvalidOption {
                name: "resolution_minutes",
                value: other.to_string(),
                reason: "must be 1, 2 or 5",
            }),
        }
    }
}

impl From<Resolution> for u32 {
    fn from(resolution: Resolution) -> u32 {
        resolution.minutes()
    }
}

/// Interpolation tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterpolationOptions {
    #[serde(rename = "resolutionMinutes")]
    pub resolution: Resolution,
    /// In [0, 1]
    pub noise_level: f64,
    pub preserve_original: bool,
    /// In [0, 1]
    pub smoothing_factor: f64,
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::FiveMinutes,
            noise_level: 0.02,
            preserve_original: true,
            smoothing_factor: 0.1,
        }
    }
}

impl InterpolationOptions {
    pub fn with_resolution(resolution: Resolution) -> Self {
        Self {
            resolution,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_unit("noise_level", self.noise_level)?;
        check_unit("smoothing_factor", self.smoothing_factor)
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidOption {
            name,
            value: value.to_string(),
            reason: "must be within [0, 1]",
        })
    }
}

/// Interpolated records plus bookkeeping about the pairs processed
#[derive(Debug, Clone, Default)]
pub struct InterpolationOutcome {
    pub records: Vec<InterpolatedMetricRecord>,
    pub pairs_interpolated: usize,
    pub pairs_skipped: usize,
    pub points_generated: usize,
}

impl InterpolationOutcome {
    fn absorb(&mut self, other: InterpolationOutcome) {
        self.records.extend(other.records);
        self.pairs_interpolated += other.pairs_interpolated;
        self.pairs_skipped += other.pairs_skipped;
        self.points_generated += other.points_generated;
    }

    fn sort(&mut self) {
        self.records.sort_by(|a, b| {
            a.record
                .timestamp
                .cmp(&b.record.timestamp)
                .then_with(|| a.record.server_id.cmp(&b.record.server_id))
        });
    }
}

/// Interpolate one server's time-sorted series
pub fn interpolate<R: Rng + ?Sized>(
    series: &[MetricRecord],
    options: &InterpolationOptions,
    rng: &mut R,
) -> Result<Vec<InterpolatedMetricRecord>> {
    Ok(interpolate_with_outcome(series, options, rng)?.records)
}

/// Like [`interpolate`], also reporting how many pairs were used or skipped
pub fn interpolate_with_outcome<R: Rng + ?Sized>(
    series: &[MetricRecord],
    options: &InterpolationOptions,
    rng: &mut R,
) -> Result<InterpolationOutcome> {
    options.validate()?;

    if series.len() < 2 {
        warn!(
            event = "interpolation_insufficient_data",
            points = series.len(),
            "Need at least 2 points to interpolate, returning input unchanged"
        );
        return Ok(InterpolationOutcome {
            records: series
                .iter()
                .enumerate()
                .map(|(i, r)| InterpolatedMetricRecord::original(r.clone(), i))
                .collect(),
            ..Default::default()
        });
    }

    let per_gap = options.resolution.points_per_gap();
    let step = Duration::minutes(options.resolution.minutes() as i64);
    let mut outcome = InterpolationOutcome {
        records: Vec::with_capacity(series.len() * (per_gap + 1)),
        ..Default::default()
    };

    for (index, pair) in series.windows(2).enumerate() {
        let (current, next) = (&pair[0], &pair[1]);

        if options.preserve_original {
            outcome
                .records
                .push(InterpolatedMetricRecord::original(current.clone(), index));
        }

        if current.server_id != next.server_id {
            warn!(
                event = "interpolation_pair_skipped",
                pair_index = index,
                server_id = %current.server_id,
                next_server_id = %next.server_id,
                "Pair spans two servers, skipping"
            );
            outcome.pairs_skipped += 1;
            continue;
        }

        let gap_secs = (next.timestamp - current.timestamp).num_seconds();
        if gap_secs != SOURCE_INTERVAL_SECS {
            warn!(
                event = "interpolation_pair_skipped",
                pair_index = index,
                server_id = %current.server_id,
                gap_secs,
                "Pair is not exactly 10 minutes apart, skipping"
            );
            outcome.pairs_skipped += 1;
            continue;
        }

        for j in 1..=per_gap {
            let ratio = j as f64 / (per_gap + 1) as f64;
            let sample = RawSample {
                cpu: blend(MetricKind::Cpu, current.cpu, next.cpu, ratio, options, rng),
                memory: blend(MetricKind::Memory, current.memory, next.memory, ratio, options, rng),
                disk: blend(MetricKind::Disk, current.disk, next.disk, ratio, options, rng),
                response_time_ms: blend(
                    MetricKind::ResponseTime,
                    current.response_time_ms,
                    next.response_time_ms,
                    ratio,
                    options,
                    rng,
                ),
            };
            let timestamp = current.timestamp + step * j as i32;
            outcome.records.push(InterpolatedMetricRecord {
                record: sample.finalize(timestamp, &current.server_id),
                interpolated: true,
                source_index: index,
            });
        }
        outcome.pairs_interpolated += 1;
        outcome.points_generated += per_gap;
    }

    if options.preserve_original {
        let last = series.len() - 1;
        outcome
            .records
            .push(InterpolatedMetricRecord::original(series[last].clone(), last));
    }

    outcome
        .records
        .sort_by(|a, b| a.record.timestamp.cmp(&b.record.timestamp));

    debug!(
        input = series.len(),
        output = outcome.records.len(),
        pairs_interpolated = outcome.pairs_interpolated,
        pairs_skipped = outcome.pairs_skipped,
        "Interpolated series"
    );
    Ok(outcome)
}

/// Linear blend with noise, then pull toward the segment midpoint
fn blend<R: Rng + ?Sized>(
    kind: MetricKind,
    from: f64,
    to: f64,
    ratio: f64,
    options: &InterpolationOptions,
    rng: &mut R,
) -> f64 {
    let value = from + (to - from) * ratio;
    let noisy = value + metric_noise(kind, value, options.noise_level, rng);
    let midpoint = (from + to) / 2.0;
    noisy * (1.0 - options.smoothing_factor) + midpoint * options.smoothing_factor
}

/// Split a mixed series into per-server views, preserving input order.
///
/// Records are borrowed; callers copy one server's series when they process it.
pub fn group_by_server(series: &[MetricRecord]) -> BTreeMap<&str, Vec<&MetricRecord>> {
    let mut groups: BTreeMap<&str, Vec<&MetricRecord>> = BTreeMap::new();
    for record in series {
        groups
            .entry(record.server_id.as_str())
            .or_default()
            .push(record);
    }
    groups
}

fn owned_series(group: &[&MetricRecord]) -> Vec<MetricRecord> {
    group.iter().map(|r| (*r).clone()).collect()
}

/// Interpolate each server's series independently and merge by timestamp
pub fn interpolate_by_server<R: Rng + ?Sized>(
    series: &[MetricRecord],
    options: &InterpolationOptions,
    rng: &mut R,
) -> Result<Vec<InterpolatedMetricRecord>> {
    Ok(interpolate_by_server_with_outcome(series, options, rng)?.records)
}

/// Like [`interpolate_by_server`], also reporting pair bookkeeping
pub fn interpolate_by_server_with_outcome<R: Rng + ?Sized>(
    series: &[MetricRecord],
    options: &InterpolationOptions,
    rng: &mut R,
) -> Result<InterpolationOutcome> {
    options.validate()?;

    let mut merged = InterpolationOutcome::default();
    for group in group_by_server(series).values() {
        let owned = owned_series(group);
        merged.absorb(interpolate_with_outcome(&owned, options, rng)?);
    }
    merged.sort();
    Ok(merged)
}

/// Seed for the worker handling the `index`-th server in id order
pub fn worker_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Interpolate servers on blocking worker tasks, one generator per worker.
///
/// Output is identical for a fixed `seed` regardless of scheduling.
pub async fn interpolate_by_server_concurrent(
    series: &[MetricRecord],
    options: &InterpolationOptions,
    seed: u64,
) -> anyhow::Result<InterpolationOutcome> {
    options.validate()?;

    let handles: Vec<_> = group_by_server(series)
        .values()
        .enumerate()
        .map(|(index, group)| {
            let options = *options;
            let group = owned_series(group);
            tokio::task::spawn_blocking(move || {
                let mut rng = StdRng::seed_from_u64(worker_seed(seed, index));
                interpolate_with_outcome(&group, &options, &mut rng)
            })
        })
        .collect();

    let mut merged = InterpolationOutcome::default();
    for handle in handles {
        merged.absorb(handle.await??);
    }
    merged.sort();
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthStatus;
    use crate::status::classify;
    use chrono::{DateTime, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn record(server: &str, minutes: i64, cpu: f64) -> MetricRecord {
        let memory = 50.0;
        let disk = 40.0;
        let rt = 120.0;
        MetricRecord {
            timestamp: start() + Duration::minutes(minutes),
            server_id: server.to_string(),
            cpu,
            memory,
            disk,
            response_time_ms: rt,
            status: classify(cpu, memory, disk, rt),
        }
    }

    fn exact(resolution: Resolution) -> InterpolationOptions {
        InterpolationOptions {
            resolution,
            noise_level: 0.0,
            preserve_original: true,
            smoothing_factor: 0.0,
        }
    }

    #[test]
    fn test_midpoint_is_exact_without_noise() {
        let series = vec![record("web-01", 0, 40.0), record("web-01", 10, 60.0)];
        let mut rng = StdRng::seed_from_u64(1);
        let out = interpolate(&series, &exact(Resolution::FiveMinutes), &mut rng).unwrap();

        assert_eq!(out.len(), 3);
        let synthetic: Vec<_> = out.iter().filter(|r| r.interpolated).collect();
        assert_eq!(synthetic.len(), 1);
        assert_eq!(synthetic[0].record.cpu, 50.0);
        assert_eq!(synthetic[0].record.timestamp, start() + Duration::minutes(5));
        assert_eq!(synthetic[0].source_index, 0);
    }

    #[test]
    fn test_points_per_gap() {
        assert_eq!(Resolution::FiveMinutes.points_per_gap(), 1);
        assert_eq!(Resolution::TwoMinutes.points_per_gap(), 4);
        assert_eq!(Resolution::OneMinute.points_per_gap(), 9);

        let series = vec![record("api-01", 0, 30.0), record("api-01", 10, 35.0)];
        for (resolution, expected) in [
            (Resolution::FiveMinutes, 1),
            (Resolution::TwoMinutes, 4),
            (Resolution::OneMinute, 9),
        ] {
            let mut rng = StdRng::seed_from_u64(2);
            let out =
                interpolate(&series, &InterpolationOptions::with_resolution(resolution), &mut rng)
                    .unwrap();
            assert_eq!(out.iter().filter(|r| r.interpolated).count(), expected);
        }
    }

    #[test]
    fn test_originals_are_preserved() {
        let series: Vec<_> = (0..6)
            .map(|i| record("db-01", i * 10, 20.0 + i as f64 * 7.0))
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        let out = interpolate(
            &series,
            &InterpolationOptions::with_resolution(Resolution::TwoMinutes),
            &mut rng,
        )
        .unwrap();

        assert_eq!(out.len(), 6 + 5 * 4);
        for original in &series {
            let found = out
                .iter()
                .find(|r| r.record.timestamp == original.timestamp)
                .unwrap();
            assert!(!found.interpolated);
            assert_eq!(&found.record, original);
        }
        assert!(out.windows(2).all(|w| w[0].record.timestamp < w[1].record.timestamp));
    }

    #[test]
    fn test_without_preserve_only_synthetic_points() {
        let series = vec![
            record("db-01", 0, 20.0),
            record("db-01", 10, 30.0),
            record("db-01", 20, 40.0),
        ];
        let options = InterpolationOptions {
            preserve_original: false,
            ..exact(Resolution::FiveMinutes)
        };
        let out = interpolate(&series, &options, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.interpolated));
        assert_eq!(out[0].record.cpu, 25.0);
        assert_eq!(out[1].record.cpu, 35.0);
        assert_eq!(out[1].source_index, 1);
    }

    #[test]
    fn test_irregular_gap_is_skipped() {
        let series = vec![
            record("web-01", 0, 40.0),
            record("web-01", 15, 60.0),
            record("web-01", 25, 50.0),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let outcome =
            interpolate_with_outcome(&series, &exact(Resolution::FiveMinutes), &mut rng).unwrap();

        assert_eq!(outcome.pairs_skipped, 1);
        assert_eq!(outcome.pairs_interpolated, 1);
        assert_eq!(outcome.records.len(), 4);
        let synthetic: Vec<_> = outcome.records.iter().filter(|r| r.interpolated).collect();
        assert_eq!(synthetic.len(), 1);
        assert_eq!(synthetic[0].source_index, 1);
        assert_eq!(synthetic[0].record.timestamp, start() + Duration::minutes(20));
    }

    #[test]
    fn test_single_point_returned_unchanged() {
        let series = vec![record("web-01", 0, 40.0)];
        let options = InterpolationOptions::default();
        let out = interpolate(&series, &options, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(out.len(), 1);
        assert!(!out[0].interpolated);
        assert_eq!(out[0].record, series[0]);

        let empty = interpolate(&[], &options, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_smoothing_pulls_toward_midpoint() {
        let series = vec![record("web-01", 0, 10.0), record("web-01", 10, 90.0)];
        let options = InterpolationOptions {
            resolution: Resolution::OneMinute,
            noise_level: 0.0,
            preserve_original: false,
            smoothing_factor: 1.0,
        };
        let out = interpolate(&series, &options, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(out.iter().all(|r| r.record.cpu == 50.0));
    }

    #[test]
    fn test_noise_stays_near_linear_estimate() {
        let series = vec![record("web-01", 0, 40.0), record("web-01", 10, 60.0)];
        let options = InterpolationOptions {
            resolution: Resolution::OneMinute,
            noise_level: 0.1,
            preserve_original: false,
            smoothing_factor: 0.0,
        };
        let out = interpolate(&series, &options, &mut StdRng::seed_from_u64(8)).unwrap();
        for (j, r) in out.iter().enumerate() {
            let linear = 40.0 + 20.0 * (j + 1) as f64 / 10.0;
            assert!((r.record.cpu - linear).abs() <= linear * 0.1 + 0.01);
        }
    }

    #[test]
    fn test_status_is_reclassified() {
        let series = vec![record("db-01", 0, 60.0), record("db-01", 10, 100.0)];
        let mut rng = StdRng::seed_from_u64(1);
        let out = interpolate(&series, &exact(Resolution::FiveMinutes), &mut rng).unwrap();
        let synthetic = out.iter().find(|r| r.interpolated).unwrap();
        assert_eq!(synthetic.record.cpu, 80.0);
        assert_eq!(synthetic.record.status, HealthStatus::Warning);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let series = vec![record("web-01", 0, 40.0), record("web-01", 10, 60.0)];
        let options = InterpolationOptions {
            noise_level: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            interpolate(&series, &options, &mut StdRng::seed_from_u64(1)),
            Err(SimError::InvalidOption { name: "noise_level", .. })
        ));
        assert!(Resolution::try_from(3).is_err());
        assert_eq!(Resolution::try_from(2).unwrap(), Resolution::TwoMinutes);
    }

    #[test]
    fn test_by_server_groups_and_merges() {
        let mut series = Vec::new();
        for i in 0..4 {
            series.push(record("web-01", i * 10, 30.0));
            series.push(record("db-01", i * 10, 50.0));
        }
        let out = interpolate_by_server(
            &series,
            &InterpolationOptions::with_resolution(Resolution::FiveMinutes),
            &mut StdRng::seed_from_u64(4),
        )
        .unwrap();

        assert_eq!(out.len(), 2 * (4 + 3));
        assert!(out.windows(2).all(|w| w[0].record.timestamp <= w[1].record.timestamp));
        for server in ["web-01", "db-01"] {
            let own: Vec<_> = out.iter().filter(|r| r.record.server_id == server).collect();
            assert_eq!(own.len(), 7);
            assert!(own.windows(2).all(|w| w[0].record.timestamp < w[1].record.timestamp));
        }
    }

    #[test]
    fn test_grouping_borrows_input() {
        let series = vec![
            record("web-01", 0, 30.0),
            record("db-01", 0, 50.0),
            record("web-01", 10, 35.0),
        ];
        let groups = group_by_server(&series);

        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["db-01", "web-01"]);
        let web = &groups["web-01"];
        assert_eq!(web.len(), 2);
        assert!(std::ptr::eq(web[0], &series[0]));
        assert!(std::ptr::eq(web[1], &series[2]));
        assert!(std::ptr::eq(groups["db-01"][0], &series[1]));
    }

    #[test]
    fn test_options_wire_format() {
        let options: InterpolationOptions =
            serde_json::from_str(r#"{"resolutionMinutes": 1, "noiseLevel": 0.05}"#).unwrap();
        assert_eq!(options.resolution, Resolution::OneMinute);
        assert_eq!(options.noise_level, 0.05);
        assert!(options.preserve_original);
        assert_eq!(options.smoothing_factor, 0.1);

        let invalid = serde_json::from_str::<InterpolationOptions>(r#"{"resolutionMinutes": 4}"#);
        assert!(invalid.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_matches_for_same_seed() {
        let mut series = Vec::new();
        for i in 0..12 {
            for server in ["web-01", "api-01", "db-01"] {
                series.push(record(server, i * 10, 20.0 + i as f64));
            }
        }
        let options = InterpolationOptions::with_resolution(Resolution::TwoMinutes);

        let a = interpolate_by_server_concurrent(&series, &options, 77).await.unwrap();
        let b = interpolate_by_server_concurrent(&series, &options, 77).await.unwrap();

        assert_eq!(a.records, b.records);
        assert_eq!(a.records.len(), 3 * (12 + 11 * 4));
        assert_eq!(a.pairs_interpolated, 33);
        assert_eq!(a.pairs_skipped, 0);
    }
}
