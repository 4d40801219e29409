use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use feedbox_db::StoreError;

/// Request-level failure taxonomy. Authentication failures share one
/// message whatever actually went wrong, and ownership failures never
/// reveal whether the channel exists.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid url")]
    InvalidUrl,

    #[error("authentication failed")]
    AuthFailed,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::InvalidUrl => (StatusCode::BAD_REQUEST, "invalid url".into()),
            ApiError::AuthFailed => (StatusCode::BAD_REQUEST, "authentication failed".into()),
            ApiError::NotFound => (StatusCode::BAD_REQUEST, "not found".into()),
            // A conflict that reaches this point is a race the handler was
            // supposed to translate; answer 400 rather than a raw 5xx.
            ApiError::Store(StoreError::Conflict(_)) => {
                (StatusCode::BAD_REQUEST, "conflict".into())
            }
            ApiError::Store(e) => {
                error!("storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
            ApiError::Internal(e) => {
                error!("internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
