//! API route definitions

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

/// Scoring and liveness endpoints at the root.
pub fn service_routes(state: ApiState) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Introspection endpoints, nested under `/api/v1`.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/model", get(handlers::model_summary))
        .with_state(state)
}
