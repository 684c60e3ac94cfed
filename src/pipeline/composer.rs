//! Response assembly: flow-product level, binary class, rule label.

use crate::types::{CongestionEstimate, CongestionLabel, NormalizedFeatures};

/// Level at or above which a reading is class 1 (inclusive).
pub const CLASS_THRESHOLD: f64 = 0.5;

/// Published congestion level: `density_n * speed_n`, a traffic-flow proxy.
#[inline]
pub fn flow_level(features: &NormalizedFeatures) -> f64 {
    features.density_n * features.speed_n
}

/// Binary severity flag from the level alone.
#[inline]
pub fn congestion_class(level: f64) -> u8 {
    u8::from(level >= CLASS_THRESHOLD)
}

/// Merge the three independent results. No further transformation.
pub const fn compose(level: f64, class: u8, label: CongestionLabel) -> CongestionEstimate {
    CongestionEstimate {
        congestion_level: level,
        congestion_class: class,
        congestion_label: label,
    }
}
