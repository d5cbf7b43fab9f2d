//! Failure schedule generation
//!
//! Picks a random set of incidents for a run: pattern, origin server,
//! window, severity and (for cascades) the dependent servers.

use crate::error::{Result, SimError};
use crate::models::{FailureEvent, FailurePattern, ServerClass, ServerDescriptor};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::ops::RangeInclusive;
use tracing::debug;

/// Fewest events scheduled per run
pub const MIN_EVENTS: usize = 2;

/// Most events scheduled per run
pub const MAX_EVENTS: usize = 10;

/// Tail of the horizon where no event may start
pub const TAIL_RESERVE_POINTS: usize = 20;

/// Cascade target selection probabilities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Chance that each same-class server joins a cascade
    pub same_class_probability: f64,
    /// Chance that each web/api server joins a cascade originating on a db
    pub db_dependents_probability: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            same_class_probability: 0.6,
            db_dependents_probability: 0.8,
        }
    }
}

/// Duration/severity ranges and origin preference for a pattern
#[derive(Debug, Clone)]
pub struct PatternProfile {
    pub duration_points: RangeInclusive<usize>,
    pub severity: RangeInclusive<f64>,
    /// Classes preferred as origin; empty means any class
    pub preferred_origins: &'static [ServerClass],
}

impl PatternProfile {
    pub fn for_pattern(pattern: FailurePattern) -> Self {
        use ServerClass::*;
        match pattern {
            FailurePattern::CpuSpike => Self {
                duration_points: 1..=6,
                severity: 0.7..=1.0,
                preferred_origins: &[Web, Api, Worker],
            },
            FailurePattern::MemoryLeak => Self {
                duration_points: 12..=36,
                severity: 0.5..=0.9,
                preferred_origins: &[Api, Worker],
            },
            FailurePattern::DiskFull => Self {
                duration_points: 6..=42,
                severity: 0.8..=1.0,
                preferred_origins: &[Db, Worker],
            },
            FailurePattern::CascadeFailure => Self {
                duration_points: 6..=24,
                severity: 0.6..=1.0,
                preferred_origins: &[Db, Api],
            },
            FailurePattern::NetworkLatency => Self {
                duration_points: 3..=15,
                severity: 0.3..=0.8,
                preferred_origins: &[Web, Api],
            },
            FailurePattern::DatabaseLock => Self {
                duration_points: 2..=10,
                severity: 0.7..=1.0,
                preferred_origins: &[Db],
            },
            FailurePattern::GradualDegradation => Self {
                duration_points: 24..=72,
                severity: 0.2..=0.8,
                preferred_origins: &[],
            },
        }
    }
}

/// Generate a failure schedule over `horizon_points` time-points.
///
/// Events are returned ordered by start index.
pub fn schedule_events<R: Rng + ?Sized>(
    roster: &[ServerDescriptor],
    horizon_points: usize,
    cascade: &CascadeConfig,
    rng: &mut R,
) -> Result<Vec<FailureEvent>> {
    if roster.is_empty() {
        return Err(SimError::EmptyRoster);
    }
    if horizon_points == 0 {
        return Err(SimError::ZeroHorizon);
    }

    let event_count = rng.gen_range(MIN_EVENTS..=MAX_EVENTS);
    let start_span = horizon_points.saturating_sub(TAIL_RESERVE_POINTS).max(1);
    let mut events = Vec::with_capacity(event_count);

    for _ in 0..event_count {
        let pattern = *FailurePattern::ALL
            .choose(rng)
            .unwrap_or(&FailurePattern::CpuSpike);
        let profile = PatternProfile::for_pattern(pattern);
        let origin = pick_origin(roster, profile.preferred_origins, rng);

        let start_index = rng.gen_range(0..start_span);
        let duration_points = rng
            .gen_range(profile.duration_points.clone())
            .min(horizon_points - start_index)
            .max(1);
        let severity = rng.gen_range(profile.severity.clone());

        let cascade_targets = if pattern == FailurePattern::CascadeFailure {
            pick_cascade_targets(roster, origin, cascade, rng)
        } else {
            BTreeSet::new()
        };

        debug!(
            pattern = %pattern,
            origin = %origin.id,
            start_index,
            duration_points,
            severity,
            cascade_targets = cascade_targets.len(),
            "Scheduled failure event"
        );

        events.push(FailureEvent {
            pattern,
            origin_server_id: origin.id.clone(),
            start_index,
            duration_points,
            severity,
            cascade_targets,
        });
    }

    events.sort_by_key(|e| (e.start_index, e.origin_server_id.clone()));
    Ok(events)
}

/// Check that every event references a roster server and fits the horizon
pub fn validate_schedule(
    roster: &[ServerDescriptor],
    events: &[FailureEvent],
    horizon_points: usize,
) -> Result<()> {
    let known: HashSet<&str> = roster.iter().map(|s| s.id.as_str()).collect();

    for event in events {
        if !known.contains(event.origin_server_id.as_str()) {
            return Err(SimError::UnknownServer(event.origin_server_id.clone()));
        }
        if let Some(unknown) = event
            .cascade_targets
            .iter()
            .find(|id| !known.contains(id.as_str()))
        {
            return Err(SimError::UnknownServer(unknown.clone()));
        }
        if event.end_index() > horizon_points {
            return Err(SimError::EventOutOfHorizon {
                start: event.start_index,
                duration: event.duration_points,
                horizon: horizon_points,
            });
        }
    }

    Ok(())
}

fn pick_origin<'a, R: Rng + ?Sized>(
    roster: &'a [ServerDescriptor],
    preferred: &[ServerClass],
    rng: &mut R,
) -> &'a ServerDescriptor {
    let candidates: Vec<&ServerDescriptor> = roster
        .iter()
        .filter(|s| preferred.contains(&s.server_class))
        .collect();

    if candidates.is_empty() {
        &roster[rng.gen_range(0..roster.len())]
    } else {
        candidates[rng.gen_range(0..candidates.len())]
    }
}

fn pick_cascade_targets<R: Rng + ?Sized>(
    roster: &[ServerDescriptor],
    origin: &ServerDescriptor,
    cascade: &CascadeConfig,
    rng: &mut R,
) -> BTreeSet<String> {
    let mut targets = BTreeSet::new();

    for server in roster.iter().filter(|s| s.id != origin.id) {
        if server.server_class == origin.server_class
            && rng.gen_bool(cascade.same_class_probability.clamp(0.0, 1.0))
        {
            targets.insert(server.id.clone());
        }
    }

    if origin.server_class == ServerClass::Db {
        for server in roster
            .iter()
            .filter(|s| matches!(s.server_class, ServerClass::Web | ServerClass::Api))
        {
            if rng.gen_bool(cascade.db_dependents_probability.clamp(0.0, 1.0)) {
                targets.insert(server.id.clone());
            }
        }
    }

    targets
}
