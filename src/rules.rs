//! Deterministic congestion labelling.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! ```text
//! 1. High    (speed_n < 0.2 AND density_n > 0.8) OR density_n > 0.50
//! 2. Medium  (speed_n < 0.5 AND density_n > 0.5) OR 0.35 <= density_n < 45
//! 3. Low     otherwise
//! ```
//!
//! The upper bound `45` in rule 2 is in raw units while every other bound is
//! normalized, so the band is effectively `density_n >= 0.35`. It is kept as
//! deployed; see DESIGN.md.
//!
//! The label is independent of the congestion level/class computed by the
//! composer, and the two may disagree for the same reading.

use serde::Serialize;

use crate::types::{CongestionLabel, NormalizedFeatures};

// ============================================================================
// Thresholds
// ============================================================================

/// Rule 1, slow-and-dense branch: speed below this...
pub const HIGH_JAM_SPEED_MAX: f64 = 0.2;
/// ...and density above this.
pub const HIGH_JAM_DENSITY_MIN: f64 = 0.8;
/// Rule 1, density-only branch.
pub const HIGH_DENSITY_MIN: f64 = 0.50;

/// Rule 2, slow-and-dense branch.
pub const MEDIUM_SLOW_SPEED_MAX: f64 = 0.5;
pub const MEDIUM_SLOW_DENSITY_MIN: f64 = 0.5;
/// Rule 2, density band (inclusive lower bound).
pub const MEDIUM_BAND_DENSITY_MIN: f64 = 0.35;
/// Rule 2, density band (exclusive upper bound). Raw-unit literal.
pub const MEDIUM_BAND_DENSITY_MAX: f64 = 45.0;

// ============================================================================
// Evaluation
// ============================================================================

/// Which branch of which rule produced the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedRule {
    HighJam,
    HighDensity,
    MediumSlowDense,
    MediumDensityBand,
    Fallthrough,
}

impl MatchedRule {
    pub const fn label(self) -> CongestionLabel {
        match self {
            Self::HighJam | Self::HighDensity => CongestionLabel::High,
            Self::MediumSlowDense | Self::MediumDensityBand => CongestionLabel::Medium,
            Self::Fallthrough => CongestionLabel::Low,
        }
    }

    /// 1-based rule number in evaluation order.
    pub const fn rank(self) -> u8 {
        match self {
            Self::HighJam | Self::HighDensity => 1,
            Self::MediumSlowDense | Self::MediumDensityBand => 2,
            Self::Fallthrough => 3,
        }
    }
}

/// Run the ordered rule list and report the first branch that matched.
pub fn evaluate(features: &NormalizedFeatures) -> MatchedRule {
    let speed = features.speed_n;
    let density = features.density_n;

    if speed < HIGH_JAM_SPEED_MAX && density > HIGH_JAM_DENSITY_MIN {
        return MatchedRule::HighJam;
    }
    if density > HIGH_DENSITY_MIN {
        return MatchedRule::HighDensity;
    }
    if speed < MEDIUM_SLOW_SPEED_MAX && density > MEDIUM_SLOW_DENSITY_MIN {
        return MatchedRule::MediumSlowDense;
    }
    if (MEDIUM_BAND_DENSITY_MIN..MEDIUM_BAND_DENSITY_MAX).contains(&density) {
        return MatchedRule::MediumDensityBand;
    }
    MatchedRule::Fallthrough
}

/// Label for a normalized reading.
pub fn classify(features: &NormalizedFeatures) -> CongestionLabel {
    evaluate(features).label()
}
