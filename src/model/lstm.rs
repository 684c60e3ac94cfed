//! Stacked LSTM encoder.
//!
//! Per layer and timestep, with gate blocks laid out `[input, forget, cell, output]`:
//!
//! ```text
//! z  = W_ih x_t + b_ih + W_hh h_{t-1} + b_hh      (4H)
//! i  = sigmoid(z[0..H])
//! f  = sigmoid(z[H..2H])
//! g  = tanh(z[2H..3H])
//! o  = sigmoid(z[3H..4H])
//! c_t = f * c_{t-1} + i * g
//! h_t = o * tanh(c_t)
//! ```
//!
//! Hidden and cell state start at zero for every call; nothing carries over
//! between requests.

use rand::rngs::StdRng;

use crate::model::tensor::{dot, Tensor};

/// Number of gate blocks stacked in each weight matrix.
pub const NUM_GATES: usize = 4;

/// One LSTM layer.
#[derive(Debug, Clone)]
pub struct LstmLayer {
    /// `[4H, input_size]`
    pub weight_ih: Tensor,
    /// `[4H, H]`
    pub weight_hh: Tensor,
    /// `[4H]`
    pub bias_ih: Tensor,
    /// `[4H]`
    pub bias_hh: Tensor,
}

impl LstmLayer {
    /// Uniform init in `±1/sqrt(hidden_size)` for every parameter.
    pub fn init(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let bound = 1.0 / (hidden_size.max(1) as f64).sqrt();
        let gates = NUM_GATES * hidden_size;
        Self {
            weight_ih: Tensor::uniform(&[gates, input_size], bound, rng),
            weight_hh: Tensor::uniform(&[gates, hidden_size], bound, rng),
            bias_ih: Tensor::uniform(&[gates], bound, rng),
            bias_hh: Tensor::uniform(&[gates], bound, rng),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weight_ih.shape[1]
    }

    pub fn hidden_size(&self) -> usize {
        self.weight_hh.shape[1]
    }

    /// One timestep. Updates `h` and `c` in place.
    fn step(&self, x: &[f64], h: &mut [f64], c: &mut [f64]) {
        let hidden = self.hidden_size();
        let z: Vec<f64> = (0..NUM_GATES * hidden)
            .map(|r| {
                self.bias_ih.data[r]
                    + self.bias_hh.data[r]
                    + dot(self.weight_ih.row(r), x)
                    + dot(self.weight_hh.row(r), h)
            })
            .collect();

        for j in 0..hidden {
            let i_gate = sigmoid(z[j]);
            let f_gate = sigmoid(z[hidden + j]);
            let g_gate = z[2 * hidden + j].tanh();
            let o_gate = sigmoid(z[3 * hidden + j]);
            c[j] = f_gate * c[j] + i_gate * g_gate;
            h[j] = o_gate * c[j].tanh();
        }
    }

    /// Run the layer over a sequence and return the hidden state per timestep.
    pub fn forward_sequence(&self, inputs: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let hidden = self.hidden_size();
        let mut h = vec![0.0; hidden];
        let mut c = vec![0.0; hidden];
        inputs
            .iter()
            .map(|x| {
                self.step(x, &mut h, &mut c);
                h.clone()
            })
            .collect()
    }
}

/// A stack of [`LstmLayer`]s; layer `k+1` consumes layer `k`'s hidden sequence.
#[derive(Debug, Clone)]
pub struct Lstm {
    pub layers: Vec<LstmLayer>,
}

impl Lstm {
    pub fn init(input_size: usize, hidden_size: usize, num_layers: usize, rng: &mut StdRng) -> Self {
        let layers = (0..num_layers)
            .map(|k| {
                let in_size = if k == 0 { input_size } else { hidden_size };
                LstmLayer::init(in_size, hidden_size, rng)
            })
            .collect();
        Self { layers }
    }

    /// Hidden-state sequence of the top layer.
    pub fn forward(&self, inputs: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let mut seq = inputs.to_vec();
        for layer in &self.layers {
            seq = layer.forward_sequence(&seq);
        }
        seq
    }
}

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
