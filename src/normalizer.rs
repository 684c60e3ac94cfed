//! Fixed-scale feature normalization.
//!
//! Raw speed and density are percentage-like readings; the rule engine works
//! on the same values divided by 100. There is deliberately no clamping:
//! a raw density of 150 normalizes to 1.5 and downstream thresholds see it
//! as such.

use crate::types::{NormalizedFeatures, SensorReading};

/// Divisor mapping the nominal 0-100 raw range onto 0-1.
pub const NORMALIZATION_SCALE: f64 = 100.0;

/// Scale a single raw reading.
#[inline]
pub fn normalize_value(raw: f64) -> f64 {
    raw / NORMALIZATION_SCALE
}

/// Normalize speed and density. Temperature is not part of the feature set.
pub fn normalize(reading: &SensorReading) -> NormalizedFeatures {
    NormalizedFeatures {
        speed_n: normalize_value(reading.traffic_speed),
        density_n: normalize_value(reading.density),
    }
}
