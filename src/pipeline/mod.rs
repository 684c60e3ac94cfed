//! Per-request scoring pipeline.
//!
//! ```text
//! SensorReading ──► normalize ──► rules::evaluate ──► label ─┐
//!                             └─► composer::flow_level ──────┼─► compose ──► CongestionEstimate
//!                                  └─► composer::congestion_class ┘
//! ```
//!
//! The pipeline is a pure function of the reading. The LSTM-CNN model lives in
//! [`CongestionService`] and is not consulted for the published level.

pub mod composer;
mod service;

pub use service::{
    CongestionPredictor, CongestionService, ModelSummary, PredictionError, StartupError,
    WeightsSource,
};

use tracing::debug;

use crate::normalizer::normalize;
use crate::rules;
use crate::types::{CongestionEstimate, SensorReading};

/// Score one reading: normalize, label, compose.
pub fn estimate(reading: &SensorReading) -> Result<CongestionEstimate, PredictionError> {
    let features = normalize(reading);

    let rule = rules::evaluate(&features);
    let level = composer::flow_level(&features);
    if !level.is_finite() {
        return Err(PredictionError::NonFiniteLevel { level });
    }
    let class = composer::congestion_class(level);

    debug!(
        speed_n = features.speed_n,
        density_n = features.density_n,
        rule = ?rule,
        level,
        class,
        "Reading scored"
    );

    Ok(composer::compose(level, class, rule.label()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CongestionLabel;

    fn score(speed: f64, density: f64) -> CongestionEstimate {
        estimate(&SensorReading::new(speed, density, 20.0)).expect("finite inputs")
    }

    #[test]
    fn test_empty_road() {
        let e = score(0.0, 0.0);
        assert_eq!(e.congestion_level, 0.0);
        assert_eq!(e.congestion_class, 0);
        assert_eq!(e.congestion_label, CongestionLabel::Low);
    }

    #[test]
    fn test_dense_fast_traffic() {
        let e = score(90.0, 90.0);
        assert!((e.congestion_level - 0.81).abs() < 1e-12);
        assert_eq!(e.congestion_class, 1);
        assert_eq!(e.congestion_label, CongestionLabel::High);
    }

    #[test]
    fn test_medium_band_example() {
        let e = score(60.0, 40.0);
        assert!((e.congestion_level - 0.24).abs() < 1e-12);
        assert_eq!(e.congestion_class, 0);
        assert_eq!(e.congestion_label, CongestionLabel::Medium);
    }

    #[test]
    fn test_level_is_exact_product_over_grid() {
        for density in (0..=100).step_by(5) {
            for speed in (0..=100).step_by(5) {
                let (d, s) = (f64::from(density), f64::from(speed));
                let e = score(s, d);
                assert_eq!(e.congestion_level, (d / 100.0) * (s / 100.0));
                assert_eq!(e.congestion_class, u8::from(e.congestion_level >= 0.5));
            }
        }
    }

    #[test]
    fn test_label_and_class_may_disagree() {
        // Low density, high speed: flow is low but class comes from level only.
        let e = score(100.0, 50.0);
        assert_eq!(e.congestion_class, 1);
        assert_eq!(e.congestion_label, CongestionLabel::Medium);

        // Slow and very dense: High label, low flow.
        let e = score(10.0, 95.0);
        assert_eq!(e.congestion_class, 0);
        assert_eq!(e.congestion_label, CongestionLabel::High);
    }

    #[test]
    fn test_idempotent() {
        let reading = SensorReading::new(37.5, 62.25, -3.0);
        assert_eq!(estimate(&reading).ok(), estimate(&reading).ok());
    }

    #[test]
    fn test_overflow_is_a_computation_error() {
        let err = estimate(&SensorReading::new(f64::MAX, f64::MAX, 0.0)).unwrap_err();
        assert!(matches!(err, PredictionError::NonFiniteLevel { .. }));
    }
}
