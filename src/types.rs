//! Request and response records for congestion scoring.
//!
//! A [`SensorReading`] arrives from the HTTP boundary, is checked with
//! [`SensorReading::validate`], and is turned into a [`CongestionEstimate`]
//! by the pipeline. Everything here is request-scoped and `Copy`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Input
// ============================================================================

/// One set of raw sensor values for a road segment.
///
/// Speed and density are expected in the 0-100 range (percentage-like units).
/// Values above 100 are accepted and flow through unclamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub traffic_speed: f64,
    pub density: f64,
    /// Accepted for forward compatibility; no current rule or score reads it.
    pub temperature: f64,
}

/// Boundary-level rejection of a reading before it reaches the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
}

impl SensorReading {
    pub const fn new(traffic_speed: f64, density: f64, temperature: f64) -> Self {
        Self {
            traffic_speed,
            density,
            temperature,
        }
    }

    /// Type/range checks applied by the boundary layer.
    ///
    /// Speed and density must be finite and non-negative; temperature must be
    /// finite. No upper bound is enforced.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("traffic_speed", self.traffic_speed),
            ("density", self.density),
            ("temperature", self.temperature),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field, value });
            }
        }
        for (field, value) in [("traffic_speed", self.traffic_speed), ("density", self.density)] {
            if value < 0.0 {
                return Err(ValidationError::Negative { field, value });
            }
        }
        Ok(())
    }
}

/// Speed and density divided down to the nominal [0, 1] scale.
///
/// Not clamped: raw values above 100 produce components above 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedFeatures {
    pub speed_n: f64,
    pub density_n: f64,
}

// ============================================================================
// Output
// ============================================================================

/// Discrete congestion label produced by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CongestionLabel {
    Low,
    Medium,
    High,
}

impl CongestionLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for CongestionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored result for one reading, serialized as the `/predict` response body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CongestionEstimate {
    /// Flow proxy: `density_n * speed_n`.
    #[serde(rename = "predicted_congestion_level")]
    pub congestion_level: f64,
    /// 1 when `congestion_level >= 0.5`, else 0.
    #[serde(rename = "predicted_class")]
    pub congestion_class: u8,
    pub congestion_label: CongestionLabel,
}
