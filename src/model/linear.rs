//! Fully-connected layer: `y = W x + b`.

use rand::rngs::StdRng;

use crate::model::tensor::{dot, Tensor};

/// Affine layer with weight `[out, in]` and bias `[out]`.
#[derive(Debug, Clone)]
pub struct Linear {
    pub weight: Tensor,
    pub bias: Tensor,
}

impl Linear {
    /// Uniform init in `±1/sqrt(in_features)` for both weight and bias.
    pub fn init(in_features: usize, out_features: usize, rng: &mut StdRng) -> Self {
        let bound = 1.0 / (in_features.max(1) as f64).sqrt();
        Self {
            weight: Tensor::uniform(&[out_features, in_features], bound, rng),
            bias: Tensor::uniform(&[out_features], bound, rng),
        }
    }

    pub fn in_features(&self) -> usize {
        self.weight.shape[1]
    }

    pub fn out_features(&self) -> usize {
        self.weight.shape[0]
    }

    /// Caller guarantees `x.len() == in_features()`.
    pub fn forward(&self, x: &[f64]) -> Vec<f64> {
        (0..self.out_features())
            .map(|o| self.bias.data[o] + dot(self.weight.row(o), x))
            .collect()
    }
}

/// Rectifier: negative values become zero.
#[inline]
pub fn relu_in_place(x: &mut [f64]) {
    for v in x.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
}
