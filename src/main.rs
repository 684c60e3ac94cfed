//! Traffic Congestion - congestion scoring service
//!
//! # Usage
//!
//! ```bash
//! # Serve /predict on the configured address
//! ./traffic-congestion --weights lstm_cnn_model.json
//!
//! # Write a freshly initialized weights file
//! ./traffic-congestion init-weights --out lstm_cnn_model.json --seed 7
//!
//! # Score one reading without starting the server
//! ./traffic-congestion predict --speed 60 --density 40
//!
//! # Check a weights file against the configured architecture
//! ./traffic-congestion inspect-weights lstm_cnn_model.json
//! ```
//!
//! # Environment Variables
//!
//! - `CONGESTION_CONFIG`: path to a TOML config file
//! - `CONGESTION_SERVER_ADDR`, `CONGESTION_WEIGHTS`, `CONGESTION_CORS_ORIGINS`:
//!   override the matching config values
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use traffic_congestion::api::envelope::ErrorBody;
use traffic_congestion::api::{create_app, ApiState};
use traffic_congestion::config::{ModelConfig, ServiceConfig};
use traffic_congestion::model::{self, LstmCnn, StateDict};
use traffic_congestion::pipeline::{self, CongestionService, StartupError};
use traffic_congestion::types::SensorReading;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "traffic-congestion")]
#[command(about = "Real-time traffic congestion scoring service")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides CONGESTION_CONFIG)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the server address (default: "0.0.0.0:8000")
    #[arg(short, long, value_name = "HOST:PORT")]
    addr: Option<String>,

    /// Override the model weights file
    #[arg(long, value_name = "PATH")]
    weights: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Load weights and serve HTTP (default)
    Serve,

    /// Write a freshly initialized weights file for the configured architecture
    InitWeights {
        #[arg(long, value_name = "PATH")]
        out: PathBuf,

        /// Initialization seed (default: model.init_seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Score one reading offline and print the response JSON
    #[command(allow_negative_numbers = true)]
    Predict {
        #[arg(long)]
        speed: f64,

        #[arg(long)]
        density: f64,

        #[arg(long, default_value = "0")]
        temperature: f64,
    },

    /// Load a weights file non-strictly and print the load report
    InspectWeights {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

// ============================================================================
// Setup
// ============================================================================

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve the config: file search, then env overrides, then CLI flags.
///
/// Runs under a temporary plain-text subscriber so that config warnings are
/// visible before the configured log format is known.
fn resolve_config(args: &CliArgs) -> Result<ServiceConfig> {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .finish();

    let mut config = tracing::subscriber::with_default(bootstrap, || {
        ServiceConfig::load(args.config.as_deref())
    })
    .context("Failed to load configuration")?;

    config.apply_env_overrides();
    if let Some(ref addr) = args.addr {
        config.server.addr = addr.clone();
    }
    if let Some(ref weights) = args.weights {
        config.model.weights_path = weights.clone();
    }
    config.validate().context("Invalid configuration after overrides")?;
    Ok(config)
}

fn build_service(model: &ModelConfig) -> Result<CongestionService, StartupError> {
    let service = CongestionService::from_weights_file(
        model.architecture(),
        &model.weights_path,
        model.init_seed,
    )?;
    if model.require_complete_weights {
        service.require_complete_weights()
    } else {
        Ok(service)
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn run_server(config: ServiceConfig) -> Result<()> {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Traffic Congestion - {}", env!("CARGO_PKG_VERSION"));
    info!("  Real-time congestion scoring");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let arch = config.model.architecture();
    info!(
        input_dim = arch.input_dim,
        hidden_dim = arch.hidden_dim,
        lstm_layers = arch.lstm_layers,
        cnn_out_channels = arch.cnn_out_channels,
        output_dim = arch.output_dim,
        weights = %config.model.weights_path.display(),
        "Model architecture"
    );

    let service = build_service(&config.model).with_context(|| {
        format!(
            "Failed to load model weights from {}",
            config.model.weights_path.display()
        )
    })?;

    let state = ApiState::new(Arc::new(service));
    let app = create_app(state, &config.server.cors_origins);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.addr))?;
    info!("✓ HTTP server listening on {}", config.server.addr);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await
        .context("HTTP server error")?;

    info!("✓ Traffic Congestion shutdown complete");
    Ok(())
}

fn init_weights(config: &ServiceConfig, out: &Path, seed: Option<u64>) -> Result<()> {
    let seed = seed.unwrap_or(config.model.init_seed);
    let network = LstmCnn::new(config.model.architecture(), seed);
    model::save_to_disk(&StateDict::from_model(&network), out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!(
        path = %out.display(),
        seed,
        num_params = network.num_params(),
        "Wrote initialized weights"
    );
    Ok(())
}

fn predict_once(reading: SensorReading) -> Result<()> {
    reading.validate().context("Invalid reading")?;
    let output = match pipeline::estimate(&reading) {
        Ok(estimate) => serde_json::to_string_pretty(&estimate)?,
        Err(e) => serde_json::to_string_pretty(&ErrorBody {
            error: e.to_string(),
        })?,
    };
    println!("{output}");
    Ok(())
}

fn inspect_weights(config: &ServiceConfig, path: &Path) -> Result<()> {
    let dict = model::load_from_disk(path)
        .with_context(|| format!("Failed to read weights from {}", path.display()))?;
    let mut network = LstmCnn::new(config.model.architecture(), config.model.init_seed);
    let report = network.load_state_dict(&dict);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = resolve_config(&args)?;
    init_logging(config.logging.json);

    match args.command {
        None | Some(SubCommand::Serve) => run_server(config).await,
        Some(SubCommand::InitWeights { out, seed }) => init_weights(&config, &out, seed),
        Some(SubCommand::Predict {
            speed,
            density,
            temperature,
        }) => predict_once(SensorReading::new(speed, density, temperature)),
        Some(SubCommand::InspectWeights { path }) => inspect_weights(&config, &path),
    }
}
