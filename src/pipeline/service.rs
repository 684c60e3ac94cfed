//! The immutable scoring service shared by every request handler.

use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::{info, warn};

use crate::model::{self, CheckpointError, LoadReport, LstmCnn, ModelArchitecture, ModelError};
use crate::types::{CongestionEstimate, SensorReading};

/// Per-request computation failure. Never fatal to the process.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("congestion level is not finite ({level}); inputs out of numeric range")]
    NonFiniteLevel { level: f64 },

    #[error("model inference failed: {0}")]
    Model(#[from] ModelError),
}

/// Failure while building the service. The process must not start serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("warm-up forward pass failed: {0}")]
    Warmup(#[source] ModelError),

    #[error("weights incomplete and complete weights are required; degraded groups: {}", .degraded.join(", "))]
    IncompleteWeights { degraded: Vec<String> },
}

/// Where the model's parameters came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightsSource {
    File { path: String },
    Initialized { seed: u64 },
}

/// Read-only description of the loaded model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub architecture: ModelArchitecture,
    pub num_params: usize,
    pub weights: WeightsSource,
    pub weights_complete: bool,
    pub load_report: LoadReport,
}

/// What the HTTP layer needs from a scorer.
pub trait CongestionPredictor: Send + Sync + Debug {
    /// Score one validated reading.
    fn predict(&self, reading: &SensorReading) -> Result<CongestionEstimate, PredictionError>;

    /// Describe the model backing this predictor.
    fn model_summary(&self) -> ModelSummary;
}

/// Loaded model plus its load report, constructed once at startup.
///
/// There is no `&mut self` method: after construction the model is frozen and
/// can be shared across threads behind an `Arc` without locking.
#[derive(Debug)]
pub struct CongestionService {
    model: LstmCnn,
    weights: WeightsSource,
    load_report: LoadReport,
}

impl CongestionService {
    /// Initialize the architecture from `seed`, overlay whatever matches in
    /// the weights file, then warm up.
    ///
    /// Fails only if the file cannot be read or is corrupt, or the warm-up
    /// pass fails. Shape mismatches are tolerated and listed in the report.
    pub fn from_weights_file(
        architecture: ModelArchitecture,
        path: &Path,
        seed: u64,
    ) -> Result<Self, StartupError> {
        let dict = model::load_from_disk(path)?;
        if let Some(saved) = dict.architecture {
            if saved != architecture {
                warn!(saved = ?saved, configured = ?architecture, "Weights were exported from a different architecture");
            }
        }

        let mut model = LstmCnn::new(architecture, seed);
        let load_report = model.load_state_dict(&dict);

        info!(
            path = %path.display(),
            loaded = load_report.loaded.len(),
            mismatched = load_report.shape_mismatched.len(),
            missing = load_report.missing.len(),
            unexpected = load_report.unexpected.len(),
            "Model weights loaded (non-strict)"
        );
        if !load_report.is_complete() {
            warn!(
                degraded = ?load_report.degraded_groups(),
                "Some parameter groups kept initialized values; model accuracy is degraded"
            );
        }

        Self::finish(
            model,
            WeightsSource::File {
                path: path.display().to_string(),
            },
            load_report,
        )
    }

    /// Service over freshly initialized parameters (no weights file).
    pub fn with_initialized_weights(
        architecture: ModelArchitecture,
        seed: u64,
    ) -> Result<Self, StartupError> {
        let model = LstmCnn::new(architecture, seed);
        let load_report = LoadReport::initialized_only(&model);
        Self::finish(model, WeightsSource::Initialized { seed }, load_report)
    }

    fn finish(
        model: LstmCnn,
        weights: WeightsSource,
        load_report: LoadReport,
    ) -> Result<Self, StartupError> {
        let warmup = vec![0.0; model.architecture().input_dim];
        let raw = model.predict(&warmup).map_err(StartupError::Warmup)?;
        info!(raw_estimate = raw, "Warm-up forward pass ok");

        Ok(Self {
            model,
            weights,
            load_report,
        })
    }

    /// Refuse to continue with a partially loaded model.
    pub fn require_complete_weights(self) -> Result<Self, StartupError> {
        if self.load_report.is_complete() {
            Ok(self)
        } else {
            Err(StartupError::IncompleteWeights {
                degraded: self
                    .load_report
                    .degraded_groups()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
        }
    }

    pub const fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub const fn model(&self) -> &LstmCnn {
        &self.model
    }

    /// Raw scalar output of the LSTM-CNN for a model-width feature vector.
    ///
    /// Not part of the `/predict` response, which publishes the flow product.
    pub fn model_estimate(&self, features: &[f64]) -> Result<f64, PredictionError> {
        Ok(self.model.predict(features)?)
    }
}

impl CongestionPredictor for CongestionService {
    fn predict(&self, reading: &SensorReading) -> Result<CongestionEstimate, PredictionError> {
        super::estimate(reading)
    }

    fn model_summary(&self) -> ModelSummary {
        ModelSummary {
            architecture: *self.model.architecture(),
            num_params: self.model.num_params(),
            weights: self.weights.clone(),
            weights_complete: self.load_report.is_complete(),
            load_report: self.load_report.clone(),
        }
    }
}
