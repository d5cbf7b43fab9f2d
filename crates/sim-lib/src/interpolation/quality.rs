//! Summary statistics and quality validation for interpolated output

use crate::models::{HealthStatus, InterpolatedMetricRecord, MetricRecord};
use crate::status::classify_record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Penalty per error in the quality score
const ERROR_PENALTY: u32 = 20;

/// Penalty per warning in the quality score
const WARNING_PENALTY: u32 = 5;

/// Individual findings kept per category before summarizing
const MAX_REPORTED_ISSUES: usize = 25;

/// First and last timestamp covered by a record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Summary of an interpolated record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationStats {
    pub total: usize,
    pub original_count: usize,
    pub interpolated_count: usize,
    /// Share of synthetic records in the output, 0 when empty
    pub interpolation_ratio: f64,
    pub status_distribution: BTreeMap<HealthStatus, usize>,
    pub server_distribution: BTreeMap<String, usize>,
    pub time_range: Option<TimeRange>,
}

pub fn stats(records: &[InterpolatedMetricRecord]) -> InterpolationStats {
    let total = records.len();
    let interpolated_count = records.iter().filter(|r| r.interpolated).count();

    let mut status_distribution = BTreeMap::new();
    let mut server_distribution = BTreeMap::new();
    for r in records {
        *status_distribution.entry(r.record.status).or_insert(0) += 1;
        *server_distribution
            .entry(r.record.server_id.clone())
            .or_insert(0) += 1;
    }

    let start = records.iter().map(|r| r.record.timestamp).min();
    let end = records.iter().map(|r| r.record.timestamp).max();
    let time_range = start.zip(end).map(|(start, end)| TimeRange { start, end });

    InterpolationStats {
        total,
        original_count: total - interpolated_count,
        interpolated_count,
        interpolation_ratio: if total == 0 {
            0.0
        } else {
            interpolated_count as f64 / total as f64
        },
        status_distribution,
        server_distribution,
        time_range,
    }
}

/// Outcome of [`validate_quality`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// max(0, 100 - 20 per error - 5 per warning)
    pub quality_score: u32,
}

/// Collects findings, summarizing past a per-category cap
#[derive(Default)]
struct Findings {
    items: Vec<String>,
    suppressed: usize,
}

impl Findings {
    fn push(&mut self, message: String) {
        if self.items.len() < MAX_REPORTED_ISSUES {
            self.items.push(message);
        } else {
            self.suppressed += 1;
        }
    }

    fn finish(mut self, what: &str) -> Vec<String> {
        if self.suppressed > 0 {
            self.items
                .push(format!("... and {} more {}", self.suppressed, what));
        }
        self.items
    }
}

/// Check interpolated output against its source series
pub fn validate_quality(
    original: &[MetricRecord],
    interpolated: &[InterpolatedMetricRecord],
) -> QualityReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if interpolated.len() < original.len() {
        errors.push(format!(
            "interpolated output has {} records, fewer than the {} original records",
            interpolated.len(),
            original.len()
        ));
    }

    if let Some(i) = interpolated
        .windows(2)
        .position(|w| w[1].record.timestamp < w[0].record.timestamp)
    {
        errors.push(format!(
            "timestamps are not monotonic: record {} ({}) precedes record {} ({})",
            i,
            interpolated[i].record.timestamp.to_rfc3339(),
            i + 1,
            interpolated[i + 1].record.timestamp.to_rfc3339()
        ));
    }

    let mut range_errors = Findings::default();
    let mut status_warnings = Findings::default();
    for (i, r) in interpolated.iter().enumerate() {
        let m = &r.record;
        for (name, value) in [("cpu", m.cpu), ("memory", m.memory), ("disk", m.disk)] {
            if !(0.0..=100.0).contains(&value) {
                range_errors.push(format!(
                    "record {} ({} @ {}): {}={} is outside [0, 100]",
                    i,
                    m.server_id,
                    m.timestamp.to_rfc3339(),
                    name,
                    value
                ));
            }
        }
        if m.response_time_ms.is_nan() || m.response_time_ms < 1.0 {
            range_errors.push(format!(
                "record {} ({} @ {}): responseTimeMs={} is below 1",
                i,
                m.server_id,
                m.timestamp.to_rfc3339(),
                m.response_time_ms
            ));
        }
        let expected = classify_record(m);
        if expected != m.status {
            status_warnings.push(format!(
                "record {} ({} @ {}): status {} does not match thresholds ({})",
                i,
                m.server_id,
                m.timestamp.to_rfc3339(),
                m.status,
                expected
            ));
        }
    }
    errors.extend(range_errors.finish("out-of-range values"));
    warnings.extend(status_warnings.finish("status mismatches"));

    let mut last_seen: HashMap<&str, DateTime<Utc>> = HashMap::new();
    let mut duplicate_servers = HashSet::new();
    for r in interpolated {
        let server = r.record.server_id.as_str();
        if let Some(prev) = last_seen.insert(server, r.record.timestamp) {
            if r.record.timestamp <= prev {
                duplicate_servers.insert(server);
            }
        }
    }
    let mut duplicate_servers: Vec<_> = duplicate_servers.into_iter().collect();
    duplicate_servers.sort_unstable();
    for server in duplicate_servers {
        warnings.push(format!(
            "server {} has repeated or out-of-order timestamps",
            server
        ));
    }

    if original.len() >= 2 && !interpolated.iter().any(|r| r.interpolated) {
        warnings.push("no interpolated points were produced".to_string());
    }

    let preserved: HashSet<(&str, DateTime<Utc>)> = interpolated
        .iter()
        .filter(|r| !r.interpolated)
        .map(|r| (r.record.server_id.as_str(), r.record.timestamp))
        .collect();
    let missing = original
        .iter()
        .filter(|o| !preserved.contains(&(o.server_id.as_str(), o.timestamp)))
        .count();
    if missing > 0 {
        warnings.push(format!(
            "{} of {} original records are not present in the output",
            missing,
            original.len()
        ));
    }

    let penalty = ERROR_PENALTY * errors.len() as u32 + WARNING_PENALTY * warnings.len() as u32;
    QualityReport {
        is_valid: errors.is_empty(),
        quality_score: 100u32.saturating_sub(penalty),
        errors,
        warnings,
    }
}
