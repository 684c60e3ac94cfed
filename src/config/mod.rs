//! Service Configuration Module
//!
//! TOML configuration for the HTTP listener, model shape and weights, and log
//! format.
//!
//! ## Loading Order
//!
//! 1. `--config <path>` on the command line
//! 2. `CONGESTION_CONFIG` environment variable (path to TOML file)
//! 3. `congestion.toml` in the current working directory
//! 4. Built-in defaults
//!
//! `CONGESTION_SERVER_ADDR`, `CONGESTION_WEIGHTS` and
//! `CONGESTION_CORS_ORIGINS` then override the loaded values. The resulting
//! config is passed explicitly; there is no global.

pub mod defaults;
mod service_config;
pub mod validation;

pub use service_config::*;
