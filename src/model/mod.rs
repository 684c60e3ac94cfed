//! LSTM-CNN congestion model.
//!
//! A fixed-architecture regressor mapping a feature vector to a scalar
//! congestion estimate:
//!
//! - **tensor**: row-major parameter storage
//! - **lstm**: stacked LSTM encoder (zero initial state, gate order i/f/g/o)
//! - **conv**: single-channel Conv1d, kernel 3, padding 1
//! - **linear**: fully-connected layers and ReLU
//! - **network**: the assembled [`LstmCnn`] and its [`ModelArchitecture`]
//! - **checkpoint**: JSON state dict persistence
//! - **loader**: non-strict weight loading with a [`LoadReport`]
//!
//! Weights are loaded once at startup; after that the model is only ever
//! reached through a shared reference.

pub mod tensor;
pub mod linear;
pub mod conv;
pub mod lstm;
pub mod network;
pub mod checkpoint;
pub mod loader;

pub use checkpoint::{load_from_disk, save_to_disk, CheckpointError, StateDict, STATE_DICT_VERSION};
pub use loader::{GroupStatus, LoadReport, ShapeMismatch};
pub use network::{LstmCnn, ModelArchitecture, ModelError, FC1_UNITS};
pub use tensor::Tensor;
