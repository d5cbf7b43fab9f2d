//! Business-hour load model
//!
//! Maps an hour of day to a load multiplier: office-hour peak, morning
//! ramp-up, evening ramp-down and a jittered night trough.

use rand::Rng;
use std::f64::consts::PI;

/// Named regime of the daily load curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRegime {
    /// 09:00-18:00
    Peak,
    /// 06:00-09:00
    RampUp,
    /// 18:00-22:00
    RampDown,
    /// 22:00-06:00
    Trough,
}

impl LoadRegime {
    pub fn at(hour_of_day: f64) -> Self {
        let h = normalize_hour(hour_of_day);
        if (9.0..18.0).contains(&h) {
            LoadRegime::Peak
        } else if (6.0..9.0).contains(&h) {
            LoadRegime::RampUp
        } else if (18.0..22.0).contains(&h) {
            LoadRegime::RampDown
        } else {
            LoadRegime::Trough
        }
    }
}

/// Wrap any hour value into [0, 24)
pub fn normalize_hour(hour: f64) -> f64 {
    hour.rem_euclid(24.0)
}

/// Load multiplier for the given hour of day. Always > 0.
///
/// The night trough draws from `rng` to add nightly jitter.
pub fn load_factor<R: Rng + ?Sized>(hour_of_day: f64, rng: &mut R) -> f64 {
    let h = normalize_hour(hour_of_day);
    match LoadRegime::at(h) {
        LoadRegime::Peak => 1.0 + 0.5 * (((h - 9.0) / 9.0) * PI).sin(),
        LoadRegime::RampUp => 0.5 + 0.5 * (h - 6.0) / 3.0,
        LoadRegime::RampDown => 1.0 - 0.4 * (h - 18.0) / 4.0,
        LoadRegime::Trough => 0.3 + 0.2 * rng.gen::<f64>(),
    }
}
