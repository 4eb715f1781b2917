//! Inbound webhook endpoint.
//!
//! `POST /webhook` verifies the delivery, turns `issues` events into
//! [`IssueEvent`](crate::issues::IssueEvent)s and hands them to the
//! [`Dispatcher`] without waiting for the run. `GET /health` and `GET /` are
//! side-effect free.

mod error;
mod payload;
mod signature;

pub use error::WebhookError;
pub use payload::WebhookPayload;
pub use signature::verify_signature;

use crate::config::Secret;
use crate::dispatcher::{DispatchError, Dispatcher};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Header carrying the HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Header naming the delivery's event type.
pub const EVENT_HEADER: &str = "x-github-event";

/// Shared state for the webhook handlers.
pub struct WebhookState {
    dispatcher: Arc<Dispatcher>,
    secret: Option<Secret>,
}

impl WebhookState {
    /// Creates handler state. A `None` or blank secret disables signature
    /// verification.
    pub fn new(dispatcher: Arc<Dispatcher>, secret: Option<Secret>) -> Self {
        let secret = secret.filter(|secret| !secret.is_blank());
        if secret.is_none() {
            warn!("No webhook secret configured, deliveries will not be verified");
        }
        Self { dispatcher, secret }
    }
}

/// Builds the service router.
pub fn router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/webhook", post(handle_webhook))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "app": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn handle_webhook(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, WebhookError> {
    match &state.secret {
        Some(secret) => {
            let header = headers
                .get(SIGNATURE_HEADER)
                .and_then(|value| value.to_str().ok());
            if let Err(e) = verify_signature(secret.expose().as_bytes(), header, &body) {
                warn!(error = %e, "Rejected webhook delivery");
                return Err(e);
            }
        }
        None => warn!("Accepting unverified webhook delivery"),
    }

    if let Some(event_type) = headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok()) {
        if event_type != "issues" {
            debug!(event_type, "Ignoring non-issue event");
            return Ok(ignored(format!("event type '{event_type}' is not handled")));
        }
    }

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "Failed to parse webhook payload");
        WebhookError::MalformedPayload
    })?;
    let event = match payload.into_event() {
        Ok(event) => event,
        Err(reason) => {
            debug!(reason = %reason, "Ignoring webhook delivery");
            return Ok(ignored(reason));
        }
    };

    let issue_number = event.issue_number;
    let event_action = event.action.as_str();
    let repo = event.repository.clone();
    let handle = state
        .dispatcher
        .dispatch(event)
        .map_err(|DispatchError::ShuttingDown| WebhookError::ShuttingDown)?;
    info!(
        run_id = handle.id(),
        repo = %repo,
        issue_number,
        action = event_action,
        "Dispatched pipeline run"
    );

    Ok(Json(json!({
        "status": "processing",
        "event_type": event_action,
        "issue_number": issue_number,
        "run_id": handle.id(),
    })))
}

fn ignored(reason: String) -> Json<Value> {
    Json(json!({ "status": "ignored", "reason": reason }))
}
