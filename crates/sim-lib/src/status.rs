//! Fixed-threshold health classification
//!
//! Shared by the synthesizer and the interpolator so both agree on what
//! "warning" and "critical" mean.

use crate::models::{HealthStatus, MetricRecord};

/// Critical thresholds (strictly greater than)
pub const CRITICAL_CPU: f64 = 90.0;
pub const CRITICAL_MEMORY: f64 = 95.0;
pub const CRITICAL_DISK: f64 = 95.0;
pub const CRITICAL_RESPONSE_MS: f64 = 3000.0;

/// Warning thresholds (strictly greater than)
pub const WARNING_CPU: f64 = 70.0;
pub const WARNING_MEMORY: f64 = 80.0;
pub const WARNING_DISK: f64 = 85.0;
pub const WARNING_RESPONSE_MS: f64 = 1000.0;

/// Map raw metric values to a health status
pub fn classify(cpu: f64, memory: f64, disk: f64, response_time_ms: f64) -> HealthStatus {
    if cpu > CRITICAL_CPU
        || memory > CRITICAL_MEMORY
        || disk > CRITICAL_DISK
        || response_time_ms > CRITICAL_RESPONSE_MS
    {
        HealthStatus::Critical
    } else if cpu > WARNING_CPU
        || memory > WARNING_MEMORY
        || disk > WARNING_DISK
        || response_time_ms > WARNING_RESPONSE_MS
    {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    }
}

/// Classify an existing record from its metric values
pub fn classify_record(record: &MetricRecord) -> HealthStatus {
    classify(
        record.cpu,
        record.memory,
        record.disk,
        record.response_time_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_below_all_thresholds() {
        assert_eq!(classify(50.0, 60.0, 40.0, 200.0), HealthStatus::Healthy);
        // Thresholds are exclusive
        assert_eq!(classify(70.0, 80.0, 85.0, 1000.0), HealthStatus::Healthy);
    }

    #[test]
    fn test_warning_on_any_metric() {
        assert_eq!(classify(70.1, 10.0, 10.0, 10.0), HealthStatus::Warning);
        assert_eq!(classify(10.0, 80.5, 10.0, 10.0), HealthStatus::Warning);
        assert_eq!(classify(10.0, 10.0, 86.0, 10.0), HealthStatus::Warning);
        assert_eq!(classify(10.0, 10.0, 10.0, 1500.0), HealthStatus::Warning);
    }

    #[test]
    fn test_critical_takes_precedence() {
        assert_eq!(classify(95.0, 85.0, 10.0, 10.0), HealthStatus::Critical);
        assert_eq!(classify(10.0, 96.0, 10.0, 10.0), HealthStatus::Critical);
        assert_eq!(classify(10.0, 10.0, 99.0, 10.0), HealthStatus::Critical);
        assert_eq!(classify(75.0, 10.0, 10.0, 3001.0), HealthStatus::Critical);
    }

    #[test]
    fn test_classification_is_pure() {
        let inputs = [(71.0, 50.0, 50.0, 999.0), (20.0, 20.0, 96.0, 1.0)];
        for (cpu, mem, disk, rt) in inputs {
            assert_eq!(classify(cpu, mem, disk, rt), classify(cpu, mem, disk, rt));
        }
    }
}
