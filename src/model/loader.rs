//! Best-effort (non-strict) weight loading.
//!
//! Every parameter of the architecture is looked up by name in the state
//! dict. It is copied only when the stored shape equals the expected shape;
//! otherwise it keeps its initialized value. Names the architecture does not
//! know are ignored. Loading never fails: the [`LoadReport`] says what
//! happened so the caller can decide whether a partially populated model is
//! acceptable.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::model::checkpoint::StateDict;
use crate::model::network::{parameter_group, LstmCnn};

/// A stored tensor whose shape disagrees with the architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeMismatch {
    pub name: String,
    pub expected: Vec<usize>,
    pub found: Vec<usize>,
}

/// How much of one parameter group came from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Every parameter in the group was loaded.
    Loaded,
    /// Some parameters loaded, others kept initial values.
    Partial,
    /// Nothing loaded; the whole group is at initial values.
    Initialized,
}

/// Outcome of [`LstmCnn::load_state_dict`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub shape_mismatched: Vec<ShapeMismatch>,
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
    /// Per-group status keyed by group name (`lstm.l0`, `cnn`, `fc1`, ...).
    pub groups: BTreeMap<String, GroupStatus>,
}

impl LoadReport {
    /// True when every architecture parameter came from the file.
    pub fn is_complete(&self) -> bool {
        self.shape_mismatched.is_empty() && self.missing.is_empty()
    }

    /// Groups that were not fully populated.
    pub fn degraded_groups(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|(_, s)| **s != GroupStatus::Loaded)
            .map(|(g, _)| g.as_str())
            .collect()
    }

    /// Report for a model that was never loaded from a file.
    pub fn initialized_only(model: &LstmCnn) -> Self {
        let mut report = Self::default();
        for (name, _) in model.named_parameters() {
            report
                .groups
                .insert(parameter_group(&name), GroupStatus::Initialized);
            report.missing.push(name);
        }
        report
    }
}

impl LstmCnn {
    /// Copy every shape-matching parameter from `dict` into this model.
    pub fn load_state_dict(&mut self, dict: &StateDict) -> LoadReport {
        let mut report = LoadReport::default();
        let mut known = BTreeSet::new();
        // group -> (loaded, total)
        let mut tally: BTreeMap<String, (usize, usize)> = BTreeMap::new();

        for (name, param) in self.named_parameters_mut() {
            known.insert(name.clone());
            let entry = tally.entry(parameter_group(&name)).or_insert((0, 0));
            entry.1 += 1;

            match dict.tensors.get(&name) {
                Some(stored) if stored.shape == param.shape => {
                    param.data.clone_from(&stored.data);
                    entry.0 += 1;
                    report.loaded.push(name);
                }
                Some(stored) => {
                    tracing::warn!(
                        parameter = %name,
                        expected = ?param.shape,
                        found = ?stored.shape,
                        "Shape mismatch, keeping initialized values"
                    );
                    report.shape_mismatched.push(ShapeMismatch {
                        name,
                        expected: param.shape.clone(),
                        found: stored.shape.clone(),
                    });
                }
                None => {
                    tracing::debug!(parameter = %name, "Parameter missing from weights file");
                    report.missing.push(name);
                }
            }
        }

        report.unexpected = dict
            .tensors
            .keys()
            .filter(|k| !known.contains(*k))
            .cloned()
            .collect();

        report.groups = tally
            .into_iter()
            .map(|(group, (loaded, total))| {
                let status = match loaded {
                    0 => GroupStatus::Initialized,
                    n if n == total => GroupStatus::Loaded,
                    _ => GroupStatus::Partial,
                };
                (group, status)
            })
            .collect();

        report
    }
}
