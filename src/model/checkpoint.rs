//! Persisted model weights.
//!
//! A [`StateDict`] maps parameter names (`lstm.weight_ih_l0`, `cnn.bias`, ...)
//! to tensors and is stored as JSON. Reading a file only checks that the file
//! is internally sane (parseable, supported version, every tensor's data
//! length agrees with its shape); matching it against an architecture is the
//! loader's job and is tolerant of mismatches.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::network::{LstmCnn, ModelArchitecture};
use crate::model::tensor::Tensor;

/// Current on-disk format version.
pub const STATE_DICT_VERSION: u32 = 1;

/// Name → tensor map plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDict {
    /// Format version for forward compatibility.
    pub version: u32,
    /// Architecture the weights were exported from, if recorded.
    #[serde(default)]
    pub architecture: Option<ModelArchitecture>,
    pub tensors: BTreeMap<String, Tensor>,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("weights I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("weights parse error ({}): {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("weights serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unsupported weights format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("corrupt tensor '{name}': shape {shape:?} needs {expected} values, found {found}")]
    Corrupt {
        name: String,
        shape: Vec<usize>,
        expected: usize,
        found: usize,
    },

    #[error("corrupt tensor '{name}': shape {shape:?} has more elements than fit in memory")]
    ShapeOverflow { name: String, shape: Vec<usize> },
}

impl StateDict {
    /// Export every parameter of `model`.
    pub fn from_model(model: &LstmCnn) -> Self {
        let tensors = model
            .named_parameters()
            .into_iter()
            .map(|(name, t)| (name, t.clone()))
            .collect();
        Self {
            version: STATE_DICT_VERSION,
            architecture: Some(*model.architecture()),
            tensors,
        }
    }

    /// Reject files that are damaged independent of any architecture.
    pub fn check_integrity(&self) -> Result<(), CheckpointError> {
        if self.version != STATE_DICT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: STATE_DICT_VERSION,
            });
        }
        for (name, t) in &self.tensors {
            match t.checked_numel() {
                Some(expected) if expected == t.data.len() => {}
                Some(expected) => {
                    return Err(CheckpointError::Corrupt {
                        name: name.clone(),
                        shape: t.shape.clone(),
                        expected,
                        found: t.data.len(),
                    });
                }
                None => {
                    return Err(CheckpointError::ShapeOverflow {
                        name: name.clone(),
                        shape: t.shape.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Save to disk atomically (write temp file, then rename).
pub fn save_to_disk(dict: &StateDict, path: &Path) -> Result<(), CheckpointError> {
    let json = serde_json::to_vec(dict)?;

    let io_err = |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path = path.with_extension("json.tmp");
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    std::fs::write(&tmp_path, &json).map_err(io_err)?;
    std::fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}

/// Read and integrity-check a state dict.
pub fn load_from_disk(path: &Path) -> Result<StateDict, CheckpointError> {
    let data = std::fs::read(path).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dict: StateDict = serde_json::from_slice(&data).map_err(|source| CheckpointError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    dict.check_integrity()?;
    Ok(dict)
}
