//! LSTM-CNN congestion regressor.
//!
//! ```text
//! x [D] ──► LSTM (L layers, width H, seq len 1) ──► h [H]
//!       ──► Conv1d(1 → C, k=3, p=1) on h as a 1-channel signal ──► [C, H]
//!       ──► flatten (channel-major) ──► Linear(H*C → 64) ──► ReLU
//!       ──► Linear(64 → 1) ──► raw estimate
//! ```
//!
//! Built once, then shared read-only: `forward` takes `&self` and there is no
//! dropout or other stochastic layer, so every call is deterministic.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::model::conv::Conv1d;
use crate::model::linear::{relu_in_place, Linear};
use crate::model::lstm::Lstm;
use crate::model::tensor::Tensor;

/// Width of the first fully-connected layer.
pub const FC1_UNITS: usize = 64;

/// Shape constants the persisted weights were trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArchitecture {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub lstm_layers: usize,
    pub cnn_out_channels: usize,
    pub output_dim: usize,
}

impl Default for ModelArchitecture {
    fn default() -> Self {
        Self {
            input_dim: 40,
            hidden_dim: 32,
            lstm_layers: 2,
            cnn_out_channels: 16,
            output_dim: 1,
        }
    }
}

impl ModelArchitecture {
    /// Input width of `fc1`: the flattened convolution output.
    pub const fn flattened_dim(&self) -> usize {
        self.hidden_dim * self.cnn_out_channels
    }
}

/// Failure inside a forward pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    InputDimMismatch { expected: usize, got: usize },

    #[error("model produced a non-finite output at index {index}: {value}")]
    NonFiniteOutput { index: usize, value: f64 },

    #[error("model has no outputs")]
    EmptyOutput,
}

/// Hybrid recurrent/convolutional network.
#[derive(Debug, Clone)]
pub struct LstmCnn {
    architecture: ModelArchitecture,
    lstm: Lstm,
    cnn: Conv1d,
    fc1: Linear,
    fc2: Linear,
}

impl LstmCnn {
    /// Build with freshly initialized parameters. Same seed, same weights.
    pub fn new(architecture: ModelArchitecture, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let lstm = Lstm::init(
            architecture.input_dim,
            architecture.hidden_dim,
            architecture.lstm_layers,
            &mut rng,
        );
        let cnn = Conv1d::init(architecture.cnn_out_channels, &mut rng);
        let fc1 = Linear::init(architecture.flattened_dim(), FC1_UNITS, &mut rng);
        let fc2 = Linear::init(FC1_UNITS, architecture.output_dim, &mut rng);
        Self {
            architecture,
            lstm,
            cnn,
            fc1,
            fc2,
        }
    }

    pub const fn architecture(&self) -> &ModelArchitecture {
        &self.architecture
    }

    /// Full forward pass returning `output_dim` values.
    pub fn forward(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let expected = self.architecture.input_dim;
        if features.len() != expected {
            return Err(ModelError::InputDimMismatch {
                expected,
                got: features.len(),
            });
        }

        // The feature vector is a sequence of length one.
        let encoded = self.lstm.forward(&[features.to_vec()]);
        let hidden = encoded.last().ok_or(ModelError::EmptyOutput)?;

        let channels = self.cnn.forward(hidden);
        let flat: Vec<f64> = channels.into_iter().flatten().collect();

        let mut x = self.fc1.forward(&flat);
        relu_in_place(&mut x);
        let out = self.fc2.forward(&x);

        if let Some((index, &value)) = out.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ModelError::NonFiniteOutput { index, value });
        }
        Ok(out)
    }

    /// Scalar congestion estimate (first output).
    pub fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.forward(features)?
            .first()
            .copied()
            .ok_or(ModelError::EmptyOutput)
    }

    /// Parameters under their persisted names, in a stable order.
    pub fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        let mut params = Vec::new();
        for (k, layer) in self.lstm.layers.iter().enumerate() {
            params.push((format!("lstm.weight_ih_l{k}"), &layer.weight_ih));
            params.push((format!("lstm.weight_hh_l{k}"), &layer.weight_hh));
            params.push((format!("lstm.bias_ih_l{k}"), &layer.bias_ih));
            params.push((format!("lstm.bias_hh_l{k}"), &layer.bias_hh));
        }
        params.push(("cnn.weight".to_string(), &self.cnn.weight));
        params.push(("cnn.bias".to_string(), &self.cnn.bias));
        params.push(("fc1.weight".to_string(), &self.fc1.weight));
        params.push(("fc1.bias".to_string(), &self.fc1.bias));
        params.push(("fc2.weight".to_string(), &self.fc2.weight));
        params.push(("fc2.bias".to_string(), &self.fc2.bias));
        params
    }

    /// Mutable view of [`named_parameters`](Self::named_parameters), same order.
    /// Only the loader uses this, before the model is frozen in a service.
    pub(crate) fn named_parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        let mut params = Vec::new();
        for (k, layer) in self.lstm.layers.iter_mut().enumerate() {
            params.push((format!("lstm.weight_ih_l{k}"), &mut layer.weight_ih));
            params.push((format!("lstm.weight_hh_l{k}"), &mut layer.weight_hh));
            params.push((format!("lstm.bias_ih_l{k}"), &mut layer.bias_ih));
            params.push((format!("lstm.bias_hh_l{k}"), &mut layer.bias_hh));
        }
        params.push(("cnn.weight".to_string(), &mut self.cnn.weight));
        params.push(("cnn.bias".to_string(), &mut self.cnn.bias));
        params.push(("fc1.weight".to_string(), &mut self.fc1.weight));
        params.push(("fc1.bias".to_string(), &mut self.fc1.bias));
        params.push(("fc2.weight".to_string(), &mut self.fc2.weight));
        params.push(("fc2.bias".to_string(), &mut self.fc2.bias));
        params
    }

    /// Total number of scalar parameters.
    pub fn num_params(&self) -> usize {
        self.named_parameters().iter().map(|(_, t)| t.data.len()).sum()
    }
}

/// Group a parameter name belongs to: `lstm.l{k}`, `cnn`, `fc1` or `fc2`.
pub fn parameter_group(name: &str) -> String {
    if let Some(rest) = name.strip_prefix("lstm.") {
        if let Some(idx) = rest.rfind("_l") {
            return format!("lstm.l{}", &rest[idx + 2..]);
        }
        return "lstm".to_string();
    }
    name.split('.').next().unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ModelArchitecture {
        ModelArchitecture {
            input_dim: 6,
            hidden_dim: 4,
            lstm_layers: 2,
            cnn_out_channels: 3,
            output_dim: 1,
        }
    }

    #[test]
    fn test_default_architecture_matches_trained_artifact() {
        let arch = ModelArchitecture::default();
        assert_eq!(arch.input_dim, 40);
        assert_eq!(arch.hidden_dim, 32);
        assert_eq!(arch.lstm_layers, 2);
        assert_eq!(arch.cnn_out_channels, 16);
        assert_eq!(arch.output_dim, 1);
        assert_eq!(arch.flattened_dim(), 512);
    }

    #[test]
    fn test_forward_default_shape_finite() {
        let model = LstmCnn::new(ModelArchitecture::default(), 42);
        let out = model.forward(&[0.25; 40]).expect("forward");
        assert_eq!(out.len(), 1);
        assert!(out[0].is_finite());
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let model = LstmCnn::new(small(), 1);
        let err = model.predict(&[0.0; 5]).unwrap_err();
        assert_eq!(err, ModelError::InputDimMismatch { expected: 6, got: 5 });
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = LstmCnn::new(small(), 11);
        let b = LstmCnn::new(small(), 11);
        let x = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        assert_eq!(a.predict(&x).expect("a"), b.predict(&x).expect("b"));
    }

    #[test]
    fn test_parameter_names_and_shapes() {
        let model = LstmCnn::new(ModelArchitecture::default(), 42);
        let params = model.named_parameters();
        let names: Vec<&str> = params.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(params.len(), 2 * 4 + 6);
        assert_eq!(names[0], "lstm.weight_ih_l0");
        assert!(names.contains(&"lstm.bias_hh_l1"));

        let shape_of = |name: &str| {
            params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, t)| t.shape.clone())
                .unwrap_or_default()
        };
        assert_eq!(shape_of("lstm.weight_ih_l0"), vec![128, 40]);
        assert_eq!(shape_of("cnn.weight"), vec![16, 1, 3]);
        assert_eq!(shape_of("fc1.weight"), vec![64, 512]);
        assert_eq!(shape_of("fc2.weight"), vec![1, 64]);
    }

    #[test]
    fn test_num_params_default() {
        let model = LstmCnn::new(ModelArchitecture::default(), 42);
        let lstm_l0 = 128 * 40 + 128 * 32 + 2 * 128;
        let lstm_l1 = 128 * 32 + 128 * 32 + 2 * 128;
        let cnn = 16 * 3 + 16;
        let fc1 = 64 * 512 + 64;
        let fc2 = 64 + 1;
        assert_eq!(model.num_params(), lstm_l0 + lstm_l1 + cnn + fc1 + fc2);
    }

    #[test]
    fn test_relu_zeroes_hidden_layer() {
        // fc1 forced strongly negative: every ReLU unit is zero, so the
        // output collapses to fc2's bias.
        let mut model = LstmCnn::new(small(), 3);
        for (name, t) in model.named_parameters_mut() {
            if name == "fc1.weight" {
                t.data.iter_mut().for_each(|v| *v = 0.0);
            }
            if name == "fc1.bias" {
                t.data.iter_mut().for_each(|v| *v = -1.0);
            }
        }
        let bias = model.fc2.bias.data[0];
        let y = model.predict(&[0.5; 6]).expect("forward");
        assert!((y - bias).abs() < 1e-12);
    }

    #[test]
    fn test_parameter_group() {
        assert_eq!(parameter_group("lstm.weight_ih_l0"), "lstm.l0");
        assert_eq!(parameter_group("lstm.bias_hh_l1"), "lstm.l1");
        assert_eq!(parameter_group("cnn.weight"), "cnn");
        assert_eq!(parameter_group("fc2.bias"), "fc2");
    }
}
