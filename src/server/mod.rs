//! HTTP server for the duty bot.
//!
//! The server's only job is to accept webhook deliveries and forward them to
//! the dispatch loop; it never blocks on mail transmission.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries (returns 202 Accepted)
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dispatch::Delivery;

pub mod webhook;

pub use webhook::webhook_handler;

/// Shared application state, passed to handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Channel into the dispatch loop.
    tx: mpsc::Sender<Delivery>,

    /// Webhook secret for HMAC-SHA256 signature verification.
    /// When `None`, signatures are not checked.
    webhook_secret: Option<Vec<u8>>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `tx` - Sender half of the dispatch loop's delivery channel
    /// * `webhook_secret` - Optional secret for verifying delivery signatures
    pub fn new(tx: mpsc::Sender<Delivery>, webhook_secret: Option<Vec<u8>>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { tx, webhook_secret }),
        }
    }

    /// Returns the delivery channel sender.
    pub fn tx(&self) -> &mpsc::Sender<Delivery> {
        &self.inner.tx
    }

    /// Returns the webhook secret, if configured.
    pub fn webhook_secret(&self) -> Option<&[u8]> {
        self.inner.webhook_secret.as_deref()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

/// Liveness probe.
async fn health_handler() -> &'static str {
    "OK"
}
