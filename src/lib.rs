//! Traffic Congestion: real-time congestion scoring for road segments
//!
//! Scores a single sensor reading (speed, density, temperature) and serves
//! the result over HTTP.
//!
//! ## Architecture
//!
//! - **Normalizer**: scales raw readings to the nominal [0, 1] range
//! - **Rules**: threshold rules producing the Low / Medium / High label
//! - **Pipeline**: composes the flow-product level, binary class and label
//! - **Model**: LSTM-CNN regressor loaded non-strictly from a JSON state dict
//! - **API**: axum router exposing `/predict`, `/health` and `/api/v1/model`

pub mod api;
pub mod config;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod rules;
pub mod types;

// Re-export configuration
pub use config::ServiceConfig;

// Re-export request/response types
pub use types::{CongestionEstimate, CongestionLabel, NormalizedFeatures, SensorReading};

// Re-export the scoring service
pub use pipeline::{estimate, CongestionPredictor, CongestionService, PredictionError, StartupError};

// Re-export model components
pub use model::{LoadReport, LstmCnn, ModelArchitecture};
