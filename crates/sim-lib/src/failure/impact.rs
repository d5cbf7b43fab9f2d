//! Per-pattern impact formulas
//!
//! Each pattern contributes additive CPU/memory/disk load and a multiplicative
//! response-time factor as a function of severity and event progress.

use crate::models::{FailurePattern, ServerClass};
use serde::Serialize;
use std::f64::consts::PI;

/// Upper bound on aggregate additive CPU impact
pub const MAX_CPU_IMPACT: f64 = 80.0;

/// Upper bound on aggregate additive memory impact
pub const MAX_MEMORY_IMPACT: f64 = 70.0;

/// Upper bound on aggregate additive disk impact
pub const MAX_DISK_IMPACT: f64 = 60.0;

/// Upper bound on aggregate response-time multiplier
pub const MAX_RESPONSE_MULTIPLIER: f64 = 20.0;

/// Severity scale applied to servers hit through a cascade
pub const CASCADE_ATTENUATION: f64 = 0.6;

/// Combined failure contribution for one server at one time-point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureImpact {
    pub cpu_impact: f64,
    pub memory_impact: f64,
    pub disk_impact: f64,
    pub response_time_multiplier: f64,
}

impl FailureImpact {
    pub const NONE: FailureImpact = FailureImpact {
        cpu_impact: 0.0,
        memory_impact: 0.0,
        disk_impact: 0.0,
        response_time_multiplier: 1.0,
    };

    /// Fold another contribution in: additive loads sum, multipliers compound
    pub fn combine(self, other: FailureImpact) -> FailureImpact {
        FailureImpact {
            cpu_impact: self.cpu_impact + other.cpu_impact,
            memory_impact: self.memory_impact + other.memory_impact,
            disk_impact: self.disk_impact + other.disk_impact,
            response_time_multiplier: self.response_time_multiplier
                * other.response_time_multiplier,
        }
    }

    /// Apply the aggregate caps
    pub fn clamped(self) -> FailureImpact {
        FailureImpact {
            cpu_impact: self.cpu_impact.min(MAX_CPU_IMPACT),
            memory_impact: self.memory_impact.min(MAX_MEMORY_IMPACT),
            disk_impact: self.disk_impact.min(MAX_DISK_IMPACT),
            response_time_multiplier: self.response_time_multiplier.min(MAX_RESPONSE_MULTIPLIER),
        }
    }

    pub fn is_none(&self) -> bool {
        *self == FailureImpact::NONE
    }
}

impl Default for FailureImpact {
    fn default() -> Self {
        FailureImpact::NONE
    }
}

/// Unclamped contribution of one event.
///
/// `progress` is the elapsed fraction of the event window in [0, 1];
/// `server_class` is the class of the server being evaluated.
pub fn pattern_impact(
    pattern: FailurePattern,
    severity: f64,
    progress: f64,
    server_class: ServerClass,
) -> FailureImpact {
    let p = progress.clamp(0.0, 1.0);
    let mut impact = FailureImpact::NONE;

    match pattern {
        FailurePattern::MemoryLeak => {
            impact.memory_impact = severity * p * 60.0;
            impact.cpu_impact = severity * p * 20.0;
            impact.response_time_multiplier = 1.0 + severity * p * 2.0;
        }
        FailurePattern::CpuSpike => {
            impact.cpu_impact = severity * 70.0 * (p * PI).sin();
            impact.response_time_multiplier = 1.0 + severity * 3.0;
        }
        FailurePattern::DiskFull => {
            impact.disk_impact = severity * p * 50.0;
            if p > 0.7 {
                impact.cpu_impact = severity * 30.0;
                impact.response_time_multiplier = 1.0 + severity * 4.0;
            }
        }
        FailurePattern::CascadeFailure => {
            impact.cpu_impact = severity * 40.0 * (1.0 - (-3.0 * p).exp());
            impact.memory_impact = severity * 30.0 * p;
            impact.response_time_multiplier = 1.0 + severity * p * 5.0;
        }
        FailurePattern::NetworkLatency => {
            impact.response_time_multiplier = 1.0 + severity * (2.0 + (p * 4.0 * PI).sin());
        }
        FailurePattern::DatabaseLock => {
            if server_class == ServerClass::Db {
                impact.cpu_impact = severity * 80.0;
                impact.response_time_multiplier = 1.0 + severity * 10.0;
            } else {
                impact.response_time_multiplier = 1.0 + severity * 3.0;
            }
        }
        FailurePattern::GradualDegradation => {
            let d = severity * p * 0.5;
            impact.cpu_impact = d * 40.0;
            impact.memory_impact = d * 30.0;
            impact.disk_impact = d * 20.0;
            impact.response_time_multiplier = 1.0 + d * 2.0;
        }
    }

    impact
}
