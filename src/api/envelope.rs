//! Error body shared by every endpoint: `{ "error": "<message>" }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    fn build(status: StatusCode, msg: impl Into<String>) -> Response {
        let body = Self { error: msg.into() };
        (status, axum::Json(body)).into_response()
    }

    /// 422: the request was rejected before scoring.
    pub fn unprocessable(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }

    /// Scoring failed on a valid request.
    ///
    /// Sent with 200 so existing clients, which branch on the `error` key,
    /// keep working.
    pub fn computation_failed(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::OK, msg)
    }
}
