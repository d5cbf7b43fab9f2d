//! Failure pattern engine
//!
//! This module provides:
//! - Schedule generation (pattern, origin, window, severity, cascade targets)
//! - Per-pattern impact formulas
//! - Aggregated, clamped impact lookups per (server, time-point)

mod impact;
mod schedule;

pub use impact::{
    pattern_impact, FailureImpact, CASCADE_ATTENUATION, MAX_CPU_IMPACT, MAX_DISK_IMPACT,
    MAX_MEMORY_IMPACT, MAX_RESPONSE_MULTIPLIER,
};
pub use schedule::{
    schedule_events, validate_schedule, CascadeConfig, PatternProfile, MAX_EVENTS, MIN_EVENTS,
    TAIL_RESERVE_POINTS,
};

use crate::error::Result;
use crate::models::{FailureEvent, ServerClass, ServerDescriptor};
use rand::Rng;
use std::collections::HashMap;

/// Lifecycle of an event relative to a time-point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Scheduled,
    Active,
    Expired,
}

impl FailureEvent {
    /// Phase of this event at time-point `t`
    pub fn phase_at(&self, t: usize) -> EventPhase {
        if t < self.start_index {
            EventPhase::Scheduled
        } else if t < self.end_index() {
            EventPhase::Active
        } else {
            EventPhase::Expired
        }
    }

    /// Elapsed fraction of the window at `t`, `None` outside the window
    pub fn progress_at(&self, t: usize) -> Option<f64> {
        if self.phase_at(t) != EventPhase::Active {
            return None;
        }
        Some((t - self.start_index) as f64 / self.duration_points as f64)
    }

    /// How strongly this event hits `server_id`: 1.0 for the origin,
    /// the cascade attenuation for targets, `None` otherwise
    pub fn exposure(&self, server_id: &str) -> Option<f64> {
        if self.origin_server_id == server_id {
            Some(1.0)
        } else if self.cascade_targets.contains(server_id) {
            Some(CASCADE_ATTENUATION)
        } else {
            None
        }
    }
}

/// An event affecting a server at a given time-point
#[derive(Debug, Clone, Copy)]
pub struct ActiveEvent<'a> {
    pub event: &'a FailureEvent,
    pub progress: f64,
    /// Whether the server is hit through a cascade rather than directly
    pub via_cascade: bool,
}

/// Read-only view over one run's failure schedule
#[derive(Debug, Clone)]
pub struct FailureEngine {
    events: Vec<FailureEvent>,
    classes: HashMap<String, ServerClass>,
}

impl FailureEngine {
    /// Wrap an existing schedule, rejecting events that reference unknown servers
    pub fn new(roster: &[ServerDescriptor], events: Vec<FailureEvent>) -> Result<Self> {
        let classes: HashMap<String, ServerClass> = roster
            .iter()
            .map(|s| (s.id.clone(), s.server_class))
            .collect();

        let horizon = events.iter().map(|e| e.end_index()).max().unwrap_or(0);
        validate_schedule(roster, &events, horizon)?;

        Ok(Self { events, classes })
    }

    /// Generate a fresh schedule for the roster
    pub fn schedule<R: Rng + ?Sized>(
        roster: &[ServerDescriptor],
        horizon_points: usize,
        cascade: &CascadeConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let events = schedule_events(roster, horizon_points, cascade, rng)?;
        Self::new(roster, events)
    }

    /// Engine with no events; every lookup returns no impact
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            classes: HashMap::new(),
        }
    }

    pub fn events(&self) -> &[FailureEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<FailureEvent> {
        self.events
    }

    /// Events affecting `server_id` at `t`
    pub fn active_events(&self, server_id: &str, t: usize) -> Vec<ActiveEvent<'_>> {
        self.events
            .iter()
            .filter_map(|event| {
                let exposure = event.exposure(server_id)?;
                let progress = event.progress_at(t)?;
                Some(ActiveEvent {
                    event,
                    progress,
                    via_cascade: exposure < 1.0,
                })
            })
            .collect()
    }

    /// Every event touching `server_id` with its phase at `t`
    pub fn timeline(&self, server_id: &str, t: usize) -> Vec<(&FailureEvent, EventPhase)> {
        self.events
            .iter()
            .filter(|event| event.exposure(server_id).is_some())
            .map(|event| (event, event.phase_at(t)))
            .collect()
    }

    /// Aggregate clamped impact on `server_id` at time-point `t`
    pub fn impact_at(&self, server_id: &str, t: usize) -> FailureImpact {
        let Some(&class) = self.classes.get(server_id) else {
            return FailureImpact::NONE;
        };

        self.active_events(server_id, t)
            .into_iter()
            .map(|active| {
                let severity = if active.via_cascade {
                    active.event.severity * CASCADE_ATTENUATION
                } else {
                    active.event.severity
                };
                pattern_impact(active.event.pattern, severity, active.progress, class)
            })
            .fold(FailureImpact::NONE, FailureImpact::combine)
            .clamped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassCounts, FailurePattern};
    use crate::roster::build_roster;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn roster() -> Vec<ServerDescriptor> {
        build_roster(&ClassCounts::default(), &mut StdRng::seed_from_u64(21)).unwrap()
    }

    fn event(pattern: FailurePattern, origin: &str, start: usize, duration: usize) -> FailureEvent {
        FailureEvent {
            pattern,
            origin_server_id: origin.to_string(),
            start_index: start,
            duration_points: duration,
            severity: 1.0,
            cascade_targets: BTreeSet::new(),
        }
    }

    #[test]
    fn test_phase_transitions() {
        let e = event(FailurePattern::CpuSpike, "web-01", 10, 6);
        assert_eq!(e.phase_at(9), EventPhase::Scheduled);
        assert_eq!(e.phase_at(10), EventPhase::Active);
        assert_eq!(e.phase_at(15), EventPhase::Active);
        assert_eq!(e.phase_at(16), EventPhase::Expired);
        assert_eq!(e.progress_at(13), Some(0.5));
        assert_eq!(e.progress_at(16), None);
    }

    #[test]
    fn test_cpu_spike_at_peak() {
        let engine =
            FailureEngine::new(&roster(), vec![event(FailurePattern::CpuSpike, "web-01", 10, 6)])
                .unwrap();

        let impact = engine.impact_at("web-01", 13);
        assert!((impact.cpu_impact - 70.0).abs() < 1e-9);
        assert!((impact.response_time_multiplier - 4.0).abs() < 1e-9);

        assert!(engine.impact_at("web-01", 9).is_none());
        assert!(engine.impact_at("web-01", 16).is_none());
        assert!(engine.impact_at("web-02", 13).is_none());
    }

    #[test]
    fn test_cascade_targets_are_attenuated() {
        let mut cascade = event(FailurePattern::CascadeFailure, "db-01", 0, 10);
        cascade.cascade_targets.insert("web-01".to_string());
        let engine = FailureEngine::new(&roster(), vec![cascade]).unwrap();

        let direct = engine.impact_at("db-01", 5);
        let indirect = engine.impact_at("web-01", 5);
        assert!((indirect.memory_impact - direct.memory_impact * 0.6).abs() < 1e-9);
        assert!(indirect.cpu_impact < direct.cpu_impact);

        let active = engine.active_events("web-01", 5);
        assert_eq!(active.len(), 1);
        assert!(active[0].via_cascade);
    }

    #[test]
    fn test_timeline_reports_phases() {
        let engine = FailureEngine::new(
            &roster(),
            vec![
                event(FailurePattern::MemoryLeak, "db-01", 0, 4),
                event(FailurePattern::DiskFull, "db-01", 10, 4),
                event(FailurePattern::CpuSpike, "web-01", 0, 30),
            ],
        )
        .unwrap();

        let phases: Vec<_> = engine
            .timeline("db-01", 6)
            .into_iter()
            .map(|(e, phase)| (e.pattern, phase))
            .collect();
        assert_eq!(
            phases,
            vec![
                (FailurePattern::MemoryLeak, EventPhase::Expired),
                (FailurePattern::DiskFull, EventPhase::Scheduled),
            ]
        );
        assert!(engine.active_events("db-01", 6).is_empty());
    }

    #[test]
    fn test_overlapping_events_are_clamped() {
        let roster = roster();
        let mut events = Vec::new();
        for pattern in FailurePattern::ALL {
            for _ in 0..3 {
                events.push(event(pattern, "db-01", 0, 20));
            }
        }
        let engine = FailureEngine::new(&roster, events).unwrap();

        for t in 0..20 {
            let impact = engine.impact_at("db-01", t);
            assert!(impact.cpu_impact <= MAX_CPU_IMPACT);
            assert!(impact.memory_impact <= MAX_MEMORY_IMPACT);
            assert!(impact.disk_impact <= MAX_DISK_IMPACT);
            assert!(impact.response_time_multiplier <= MAX_RESPONSE_MULTIPLIER);
            assert!(impact.response_time_multiplier >= 1.0);
        }
        assert_eq!(engine.impact_at("db-01", 10).response_time_multiplier, MAX_RESPONSE_MULTIPLIER);
    }

    #[test]
    fn test_unknown_server_rejected() {
        let result = FailureEngine::new(
            &roster(),
            vec![event(FailurePattern::DiskFull, "nope", 0, 4)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_random_schedules_stay_bounded() {
        let roster = roster();
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let engine =
                FailureEngine::schedule(&roster, 144, &CascadeConfig::default(), &mut rng).unwrap();
            for server in &roster {
                for t in 0..144 {
                    let impact = engine.impact_at(&server.id, t);
                    assert!(impact.cpu_impact >= 0.0 && impact.cpu_impact <= MAX_CPU_IMPACT);
                    assert!(
                        impact.memory_impact >= 0.0 && impact.memory_impact <= MAX_MEMORY_IMPACT
                    );
                    assert!(impact.disk_impact >= 0.0 && impact.disk_impact <= MAX_DISK_IMPACT);
                    assert!(impact.response_time_multiplier <= MAX_RESPONSE_MULTIPLIER);
                }
            }
        }
    }
}
