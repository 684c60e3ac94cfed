//! Single-input-channel 1-D convolution.
//!
//! ```text
//! out[c][t] = bias[c] + sum_k weight[c][0][k] * x[t + k - padding]
//! ```
//!
//! with zero padding outside `x`. Kernel 3, stride 1, padding 1 keeps the
//! output length equal to the input length.

use rand::rngs::StdRng;

use crate::model::tensor::Tensor;

pub const KERNEL_SIZE: usize = 3;
pub const PADDING: usize = 1;
const IN_CHANNELS: usize = 1;

/// Conv1d with weight `[out_channels, 1, KERNEL_SIZE]` and bias `[out_channels]`.
#[derive(Debug, Clone)]
pub struct Conv1d {
    pub weight: Tensor,
    pub bias: Tensor,
}

impl Conv1d {
    pub fn init(out_channels: usize, rng: &mut StdRng) -> Self {
        let fan_in = IN_CHANNELS * KERNEL_SIZE;
        let bound = 1.0 / (fan_in as f64).sqrt();
        Self {
            weight: Tensor::uniform(&[out_channels, IN_CHANNELS, KERNEL_SIZE], bound, rng),
            bias: Tensor::uniform(&[out_channels], bound, rng),
        }
    }

    pub fn out_channels(&self) -> usize {
        self.weight.shape[0]
    }

    /// Convolve a single-channel signal. Returns `out_channels` rows, each
    /// the same length as `signal`.
    pub fn forward(&self, signal: &[f64]) -> Vec<Vec<f64>> {
        let len = signal.len();
        (0..self.out_channels())
            .map(|c| {
                let kernel = &self.weight.data[c * KERNEL_SIZE..(c + 1) * KERNEL_SIZE];
                let bias = self.bias.data[c];
                (0..len)
                    .map(|t| {
                        let mut acc = bias;
                        for (k, w) in kernel.iter().enumerate() {
                            // index into the padded signal: t + k - PADDING
                            if let Some(x) = (t + k)
                                .checked_sub(PADDING)
                                .and_then(|i| signal.get(i))
                            {
                                acc += w * x;
                            }
                        }
                        acc
                    })
                    .collect()
            })
            .collect()
    }
}
