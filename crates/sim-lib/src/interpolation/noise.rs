//! Metric-specific Gaussian noise

use rand::Rng;
use std::f64::consts::PI;

/// Metric channel being interpolated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Cpu,
    Memory,
    Disk,
    ResponseTime,
}

impl MetricKind {
    /// Relative noise magnitude; response time is the noisiest signal, disk the calmest
    pub fn noise_multiplier(&self) -> f64 {
        match self {
            MetricKind::Cpu => 1.2,
            MetricKind::Memory => 0.6,
            MetricKind::Disk => 0.4,
            MetricKind::ResponseTime => 1.5,
        }
    }
}

/// Standard normal sample (Box-Muller)
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // (0, 1] keeps ln() finite
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Noise for `value`, bounded to +-value*noise_level
pub fn metric_noise<R: Rng + ?Sized>(
    kind: MetricKind,
    value: f64,
    noise_level: f64,
    rng: &mut R,
) -> f64 {
    if noise_level <= 0.0 || value == 0.0 {
        return 0.0;
    }
    let bound = value.abs() * noise_level;
    (gaussian(rng) * noise_level * kind.noise_multiplier() * value).clamp(-bound, bound)
}
