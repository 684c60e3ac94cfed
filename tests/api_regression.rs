//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every endpoint using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use traffic_congestion::api::{create_app, ApiState};
use traffic_congestion::model::{save_to_disk, LstmCnn, ModelArchitecture, StateDict, Tensor};
use traffic_congestion::pipeline::{
    CongestionPredictor, CongestionService, ModelSummary, PredictionError,
};
use traffic_congestion::types::{CongestionEstimate, SensorReading};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// Helpers
// ============================================================================

/// Wraps the real service and counts how often the HTTP layer reaches it.
#[derive(Debug)]
struct CountingPredictor {
    inner: CongestionService,
    calls: AtomicUsize,
}

impl CountingPredictor {
    fn new() -> Self {
        Self {
            inner: CongestionService::with_initialized_weights(ModelArchitecture::default(), 11)
                .unwrap(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CongestionPredictor for CountingPredictor {
    fn predict(&self, reading: &SensorReading) -> Result<CongestionEstimate, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.predict(reading)
    }

    fn model_summary(&self) -> ModelSummary {
        self.inner.model_summary()
    }
}

/// Always fails, to exercise the in-band computation error path.
#[derive(Debug)]
struct FailingPredictor(CongestionService);

impl CongestionPredictor for FailingPredictor {
    fn predict(&self, _reading: &SensorReading) -> Result<CongestionEstimate, PredictionError> {
        Err(PredictionError::NonFiniteLevel { level: f64::NAN })
    }

    fn model_summary(&self) -> ModelSummary {
        self.0.model_summary()
    }
}

fn post_predict(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn app_with(predictor: Arc<dyn CongestionPredictor>) -> axum::Router {
    create_app(ApiState::new(predictor), &[])
}

// ============================================================================
// /predict
// ============================================================================

#[tokio::test]
async fn test_predict_reference_cases() {
    let cases = [
        (r#"{"traffic_speed": 0, "density": 0, "temperature": 20}"#, 0.0, 0, "Low"),
        (r#"{"traffic_speed": 90, "density": 90, "temperature": 20}"#, 0.81, 1, "High"),
        (r#"{"traffic_speed": 60, "density": 40, "temperature": 20}"#, 0.24, 0, "Medium"),
    ];

    let predictor = Arc::new(CountingPredictor::new());
    for (body, level, class, label) in cases {
        let resp = app_with(predictor.clone())
            .oneshot(post_predict(body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "body: {body}");

        let v = json_body(resp).await;
        let got = v["predicted_congestion_level"].as_f64().unwrap();
        assert!((got - level).abs() < 1e-12, "{body}: level {got} != {level}");
        assert_eq!(v["predicted_class"], class, "body: {body}");
        assert_eq!(v["congestion_label"], label, "body: {body}");
        assert_eq!(v.as_object().unwrap().len(), 3, "no extra fields");
    }
    assert_eq!(predictor.calls(), 3);
}

#[tokio::test]
async fn test_malformed_requests_never_reach_predictor() {
    let bad_bodies = [
        "not json",
        r#"{"traffic_speed": 50, "temperature": 20}"#,
        r#"{"traffic_speed": "fast", "density": 50, "temperature": 20}"#,
        r#"{"traffic_speed": -1, "density": 50, "temperature": 20}"#,
        r#"{"traffic_speed": 50, "density": -0.5, "temperature": 20}"#,
        r#"{"traffic_speed": 50, "density": 50}"#,
    ];

    let predictor = Arc::new(CountingPredictor::new());
    for body in bad_bodies {
        let resp = app_with(predictor.clone())
            .oneshot(post_predict(body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
        let v = json_body(resp).await;
        assert!(v["error"].is_string(), "body: {body}");
    }
    assert_eq!(predictor.calls(), 0);
}

#[tokio::test]
async fn test_missing_content_type_is_422() {
    let predictor = Arc::new(CountingPredictor::new());
    let resp = app_with(predictor.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .body(Body::from(r#"{"traffic_speed": 1, "density": 1, "temperature": 1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(predictor.calls(), 0);
}

#[tokio::test]
async fn test_computation_error_is_in_band() {
    let inner =
        CongestionService::with_initialized_weights(ModelArchitecture::default(), 1).unwrap();
    let resp = app_with(Arc::new(FailingPredictor(inner)))
        .oneshot(post_predict(
            r#"{"traffic_speed": 10, "density": 10, "temperature": 10}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    assert!(v["error"].as_str().unwrap().contains("not finite"));
    assert!(v.get("predicted_class").is_none());
}

#[tokio::test]
async fn test_values_above_100_are_not_clamped() {
    let predictor = Arc::new(CountingPredictor::new());
    let resp = app_with(predictor)
        .oneshot(post_predict(
            r#"{"traffic_speed": 200, "density": 150, "temperature": 0}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    assert_eq!(v["predicted_congestion_level"].as_f64().unwrap(), 3.0);
    assert_eq!(v["congestion_label"], "High");
}

#[tokio::test]
async fn test_predict_get_is_405() {
    let resp = app_with(Arc::new(CountingPredictor::new()))
        .oneshot(Request::builder().uri("/predict").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ============================================================================
// /health and /api/v1/model with a real weights file
// ============================================================================

#[tokio::test]
async fn test_health_and_model_reflect_partial_weights() {
    let arch = ModelArchitecture::default();
    let mut dict = StateDict::from_model(&LstmCnn::new(arch, 5));
    dict.tensors
        .insert("fc1.weight".to_string(), Tensor::zeros(&[64, 100]));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lstm_cnn_model.json");
    save_to_disk(&dict, &path).unwrap();

    let service = CongestionService::from_weights_file(arch, &path, 42).unwrap();
    let app = app_with(Arc::new(service));

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let health = json_body(resp).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["weights_complete"], false);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/model")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let model = json_body(resp).await;
    assert_eq!(model["weights"]["kind"], "file");
    assert_eq!(model["load_report"]["groups"]["fc1"], "partial");
    assert_eq!(model["load_report"]["groups"]["cnn"], "loaded");
    assert_eq!(
        model["load_report"]["shape_mismatched"][0]["name"],
        "fc1.weight"
    );
}
