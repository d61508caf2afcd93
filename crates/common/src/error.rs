use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to the hosting event system as failed invocations.
#[derive(Debug, Error)]
pub enum AppError {
    /// The push provider rejected or failed the message. Carries the provider's message verbatim.
    #[error("{0}")]
    Delivery(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Delivery(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
