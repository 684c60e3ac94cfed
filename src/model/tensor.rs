//! Dense row-major parameter storage.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A named parameter's values plus its logical shape.
///
/// `data` is row-major; `data.len()` must equal the product of `shape`
/// (see [`Tensor::is_consistent`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl Tensor {
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            data: vec![0.0; shape.iter().product()],
        }
    }

    /// Uniform init in `[-bound, bound)`.
    pub fn uniform(shape: &[usize], bound: f64, rng: &mut StdRng) -> Self {
        let numel = shape.iter().product();
        let data = (0..numel)
            .map(|_| rng.gen::<f64>() * 2.0 * bound - bound)
            .collect();
        Self {
            shape: shape.to_vec(),
            data,
        }
    }

    /// Number of elements implied by `shape`, or `None` if the product
    /// does not fit in `usize`.
    pub fn checked_numel(&self) -> Option<usize> {
        self.shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    pub fn is_consistent(&self) -> bool {
        self.checked_numel() == Some(self.data.len())
    }

    /// Row `r` of a 2-D tensor.
    #[inline]
    pub fn row(&self, r: usize) -> &[f64] {
        let cols = self.shape.last().copied().unwrap_or(0);
        &self.data[r * cols..(r + 1) * cols]
    }
}

/// Dot product over the shorter of the two slices.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_zeros_shape() {
        let t = Tensor::zeros(&[4, 3]);
        assert_eq!(t.checked_numel(), Some(12));
        assert!(t.is_consistent());
        assert!(t.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_uniform_within_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let t = Tensor::uniform(&[16, 8], 0.25, &mut rng);
        assert!(t.data.iter().all(|v| v.abs() <= 0.25));
    }

    #[test]
    fn test_row_slicing() {
        let t = Tensor {
            shape: vec![2, 3],
            data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        };
        assert_eq!(t.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_inconsistent_detected() {
        let t = Tensor {
            shape: vec![2, 2],
            data: vec![1.0, 2.0, 3.0],
        };
        assert!(!t.is_consistent());
    }

    #[test]
    fn test_overflowing_shape_is_inconsistent() {
        let t = Tensor {
            shape: vec![1 << 32, 1 << 32, 16],
            data: vec![],
        };
        assert_eq!(t.checked_numel(), None);
        assert!(!t.is_consistent());
    }
}
