//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries, optionally validates signatures, and
//! forwards them to the dispatch loop before returning 202 Accepted. The
//! actual decoding and mail fan-out happen asynchronously in the dispatcher.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, warn};

use super::AppState;
use crate::dispatch::Delivery;
use crate::webhooks::verify_signature;

/// Header name for the GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for the GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that can occur when accepting a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Invalid signature.
    #[error("invalid signature")]
    InvalidSignature,

    /// Invalid JSON body.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The dispatch loop is gone; nothing can consume deliveries.
    #[error("dispatcher unavailable")]
    DispatcherUnavailable,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            WebhookError::DispatcherUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: Event type (e.g. "issues", "issue_comment")
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature (required only when a
///     secret is configured)
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 202 Accepted: delivery forwarded to the dispatcher
/// - 400 Bad Request: missing header or invalid JSON
/// - 401 Unauthorized: invalid signature
/// - 500 Internal Server Error: dispatcher unavailable
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event_kind = get_header(&headers, HEADER_EVENT)?;

    // Verify the signature before any parsing when a secret is configured.
    if let Some(secret) = app_state.webhook_secret() {
        let signature = get_header(&headers, HEADER_SIGNATURE)?;
        if !verify_signature(&body, &signature, secret) {
            warn!(event_kind = %event_kind, "Invalid webhook signature");
            return Err(WebhookError::InvalidSignature);
        }
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)?;

    debug!(event_kind = %event_kind, "Received webhook");

    app_state
        .tx()
        .send(Delivery::new(event_kind, payload))
        .await
        .map_err(|_| WebhookError::DispatcherUnavailable)?;

    Ok((StatusCode::ACCEPTED, "Accepted"))
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}
