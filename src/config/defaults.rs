//! Built-in defaults and environment variable names.

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8000";

// ============================================================================
// Model
// ============================================================================

/// Default weights file, relative to the working directory.
pub const WEIGHTS_PATH: &str = "lstm_cnn_model.json";

/// Seed for parameters not supplied by the weights file.
pub const INIT_SEED: u64 = 42;

// ============================================================================
// Config discovery
// ============================================================================

/// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "congestion.toml";

pub const CONFIG_ENV: &str = "CONGESTION_CONFIG";
pub const SERVER_ADDR_ENV: &str = "CONGESTION_SERVER_ADDR";
pub const WEIGHTS_ENV: &str = "CONGESTION_WEIGHTS";
pub const CORS_ORIGINS_ENV: &str = "CONGESTION_CORS_ORIGINS";
