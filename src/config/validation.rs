//! Unknown-key detection with "did you mean?" suggestions.
//!
//! The raw TOML is walked as a `toml::Value` tree before serde sees it, so a
//! misspelt key produces a warning instead of being silently defaulted.
//! Warnings never reject a config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `ServiceConfig`.
///
/// Kept by hand; a new field in `service_config.rs` needs an entry here.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [server]
        "server",
        "server.addr",
        "server.cors_origins",
        // [model]
        "model",
        "model.weights_path",
        "model.input_dim",
        "model.hidden_dim",
        "model.lstm_layers",
        "model.cnn_out_channels",
        "model.output_dim",
        "model.init_seed",
        "model.require_complete_weights",
        // [logging]
        "logging",
        "logging.json",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Collect all dotted key paths of a table tree.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest known key within edit distance 3, if any.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Entry Points
// ============================================================================

/// Warnings for every key in `raw_toml` that `ServiceConfig` does not know.
///
/// Unparseable input yields no warnings; serde reports the parse error.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

/// Values that parse and validate but are probably not what the operator meant.
pub fn suspicious_values(config: &super::ServiceConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let origins = &config.server.cors_origins;
    if origins.len() > 1 && origins.iter().any(|o| o == "*") {
        warnings.push(ValidationWarning {
            field: "server.cors_origins".to_string(),
            message: "cors_origins contains '*' alongside explicit origins; any origin is allowed"
                .to_string(),
            suggestion: None,
        });
    }

    if config.model.input_dim < 2 {
        warnings.push(ValidationWarning {
            field: "model.input_dim".to_string(),
            message: format!(
                "model.input_dim = {} is smaller than the reading itself (speed, density)",
                config.model.input_dim
            ),
            suggestion: None,
        });
    }

    warnings
}
