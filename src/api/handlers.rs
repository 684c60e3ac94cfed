//! API route handlers
//!
//! - `POST /predict`: validate a reading and score it
//! - `GET /health`: liveness plus whether the model weights loaded completely
//! - `GET /api/v1/model`: architecture and load report

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

use super::envelope::ErrorBody;
use crate::pipeline::{CongestionPredictor, ModelSummary};
use crate::types::SensorReading;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers. Read-only after startup.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub predictor: Arc<dyn CongestionPredictor>,
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    pub fn new(predictor: Arc<dyn CongestionPredictor>) -> Self {
        Self {
            predictor,
            started_at: Utc::now(),
        }
    }
}

// ============================================================================
// Prediction
// ============================================================================

/// POST /predict
///
/// Malformed bodies and invalid readings get 422 without touching the
/// predictor. A scoring failure is reported in-band as `{"error": ..}`.
pub async fn predict(
    State(state): State<ApiState>,
    payload: Result<Json<SensorReading>, JsonRejection>,
) -> Response {
    let reading = match payload {
        Ok(Json(reading)) => reading,
        Err(rejection) => {
            warn!(status = %rejection.status(), reason = %rejection.body_text(), "Rejected /predict body");
            return ErrorBody::unprocessable(rejection.body_text());
        }
    };

    if let Err(e) = reading.validate() {
        warn!(error = %e, "Rejected /predict reading");
        return ErrorBody::unprocessable(e.to_string());
    }

    match state.predictor.predict(&reading) {
        Ok(estimate) => Json(estimate).into_response(),
        Err(e) => {
            error!(
                error = %e,
                traffic_speed = reading.traffic_speed,
                density = reading.density,
                "Prediction failed"
            );
            ErrorBody::computation_failed(e.to_string())
        }
    }
}

// ============================================================================
// Health & Model
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub started_at: DateTime<Utc>,
    pub weights_complete: bool,
}

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        started_at: state.started_at,
        weights_complete: state.predictor.model_summary().weights_complete,
    })
}

/// GET /api/v1/model
pub async fn model_summary(State(state): State<ApiState>) -> Json<ModelSummary> {
    Json(state.predictor.model_summary())
}
