//! Webhook error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Reasons an inbound delivery is rejected.
///
/// Messages are fixed strings; the payload is never echoed back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// A secret is configured but the delivery carries no signature.
    #[error("Missing signature")]
    MissingSignature,

    /// The signature does not match the body.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The body is not a JSON issue event.
    #[error("Malformed payload")]
    MalformedPayload,

    /// The service is draining and accepts no new runs.
    #[error("Service is shutting down")]
    ShuttingDown,
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingSignature | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::MalformedPayload => StatusCode::BAD_REQUEST,
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
