use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

const PERSIST_FAILED: &str = "failed to persist credential";

/// Error body returned by every endpoint: `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match &e {
            ServiceError::Validation(msg) => {
                warn!(code = e.code(), error = %msg, "rejected request");
                ApiError::new(StatusCode::BAD_REQUEST, msg.clone())
            }
            ServiceError::Storage(_) => {
                // the detailed error names the data file; keep it in the log only
                error!(code = e.code(), error = %e, "storage failure");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, PERSIST_FAILED)
            }
        }
    }
}

// an unparseable body carries no identifier, so it is a client error
impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        warn!(error = %e.body_text(), "invalid request body");
        ApiError::new(StatusCode::BAD_REQUEST, e.body_text())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("credential store unavailable: {0}")]
    Storage(#[from] ServiceError),
}
