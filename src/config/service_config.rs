//! Service configuration: server, model and logging sections.
//!
//! Every section implements `Default`, so an empty or partial TOML file yields
//! a working configuration matching the deployed model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::model::ModelArchitecture;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {1}", path = .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({path}): {1}", path = .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with [`ServiceConfig::load`], which searches:
/// 1. an explicit path (the `--config` flag)
/// 2. `$CONGESTION_CONFIG`
/// 3. `./congestion.toml`
/// 4. built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener and cross-origin policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Overridden by `CONGESTION_SERVER_ADDR` and `--addr`.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Allowed cross-origin callers. Empty means same-origin only, `"*"`
    /// allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            cors_origins: Vec::new(),
        }
    }
}

/// Model shape and weight source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_weights_path")]
    pub weights_path: PathBuf,

    #[serde(default = "default_input_dim")]
    pub input_dim: usize,
    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: usize,
    #[serde(default = "default_lstm_layers")]
    pub lstm_layers: usize,
    #[serde(default = "default_cnn_out_channels")]
    pub cnn_out_channels: usize,
    #[serde(default = "default_output_dim")]
    pub output_dim: usize,

    /// Seed for parameters the weights file does not supply.
    #[serde(default = "default_init_seed")]
    pub init_seed: u64,

    /// Abort startup unless every parameter came from the weights file.
    #[serde(default)]
    pub require_complete_weights: bool,
}

fn default_weights_path() -> PathBuf {
    PathBuf::from(defaults::WEIGHTS_PATH)
}
fn default_input_dim() -> usize {
    ModelArchitecture::default().input_dim
}
fn default_hidden_dim() -> usize {
    ModelArchitecture::default().hidden_dim
}
fn default_lstm_layers() -> usize {
    ModelArchitecture::default().lstm_layers
}
fn default_cnn_out_channels() -> usize {
    ModelArchitecture::default().cnn_out_channels
}
fn default_output_dim() -> usize {
    ModelArchitecture::default().output_dim
}
fn default_init_seed() -> u64 {
    defaults::INIT_SEED
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: default_weights_path(),
            input_dim: default_input_dim(),
            hidden_dim: default_hidden_dim(),
            lstm_layers: default_lstm_layers(),
            cnn_out_channels: default_cnn_out_channels(),
            output_dim: default_output_dim(),
            init_seed: default_init_seed(),
            require_complete_weights: false,
        }
    }
}

impl ModelConfig {
    pub const fn architecture(&self) -> ModelArchitecture {
        ModelArchitecture {
            input_dim: self.input_dim,
            hidden_dim: self.hidden_dim,
            lstm_layers: self.lstm_layers,
            cnn_out_channels: self.cnn_out_channels,
            output_dim: self.output_dim,
        }
    }
}

/// Log output format. Level comes from `RUST_LOG`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

// ============================================================================
// Loading
// ============================================================================

impl ServiceConfig {
    /// Load using the standard search order.
    ///
    /// An explicit path must load cleanly; env and local files fall back to
    /// defaults with a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), "Loaded config from --config");
            return Ok(config);
        }

        if let Ok(path) = std::env::var(defaults::CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", defaults::CONFIG_ENV);
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV);
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return Ok(config);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Load from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse, warn about unknown keys, validate.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        for w in super::validation::suspicious_values(&config) {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Apply `CONGESTION_SERVER_ADDR`, `CONGESTION_WEIGHTS` and
    /// `CONGESTION_CORS_ORIGINS` on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(defaults::SERVER_ADDR_ENV) {
            self.server.addr = addr;
        }
        if let Ok(path) = std::env::var(defaults::WEIGHTS_ENV) {
            self.model.weights_path = PathBuf::from(path);
        }
        if let Ok(origins) = std::env::var(defaults::CORS_ORIGINS_ENV) {
            self.server.cors_origins = parse_origin_list(&origins);
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check dimensions and addresses for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let m = &self.model;

        for (name, value) in [
            ("model.input_dim", m.input_dim),
            ("model.hidden_dim", m.hidden_dim),
            ("model.lstm_layers", m.lstm_layers),
            ("model.cnn_out_channels", m.cnn_out_channels),
        ] {
            if value == 0 {
                errors.push(format!("{name} must be > 0"));
            }
        }
        if m.output_dim != 1 {
            errors.push(format!(
                "model.output_dim must be 1 (scalar congestion estimate), got {}",
                m.output_dim
            ));
        }
        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }
        if m.weights_path.as_os_str().is_empty() {
            errors.push("model.weights_path must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config = ServiceConfig::from_toml_str("").expect("empty TOML should parse");
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.server.addr, "0.0.0.0:8000");
        assert_eq!(config.model.architecture(), ModelArchitecture::default());
        assert_eq!(config.model.weights_path, PathBuf::from("lstm_cnn_model.json"));
    }

    #[test]
    fn test_partial_toml_override() {
        let config = ServiceConfig::from_toml_str(
            r#"
[server]
cors_origins = ["http://localhost:3000"]

[model]
hidden_dim = 64
require_complete_weights = true
"#,
        )
        .expect("partial TOML should parse");
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.model.hidden_dim, 64);
        assert!(config.model.require_complete_weights);
        // untouched values keep defaults
        assert_eq!(config.model.input_dim, 40);
        assert_eq!(config.server.addr, "0.0.0.0:8000");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_validation_rejects_zero_dims_and_vector_output() {
        let mut config = ServiceConfig::default();
        config.model.hidden_dim = 0;
        config.model.output_dim = 3;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.iter().any(|e| e.contains("hidden_dim")));
                assert!(errors.iter().any(|e| e.contains("output_dim")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_type_error_is_parse_error() {
        let err = ServiceConfig::from_toml_str("[model]\ninput_dim = \"forty\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("congestion.toml");
        std::fs::write(&path, "[server]\naddr = \"127.0.0.1:9100\"\n").expect("write");

        let config = ServiceConfig::load(Some(&path)).expect("load");
        assert_eq!(config.server.addr, "127.0.0.1:9100");
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let err = ServiceConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_roundtrip_toml() {
        let defaults = ServiceConfig::default();
        let toml_str = defaults.to_toml().expect("serialization should work");
        let roundtripped = ServiceConfig::from_toml_str(&toml_str).expect("deserialization should work");
        assert_eq!(defaults, roundtripped);
    }

    #[test]
    fn test_parse_origin_list() {
        assert_eq!(
            parse_origin_list(" http://a.example , ,http://b.example"),
            vec!["http://a.example", "http://b.example"]
        );
        assert!(parse_origin_list("").is_empty());
    }
}
