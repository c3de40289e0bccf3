//! Receives PayPal webhook notifications and records completed captures in
//! the Supabase `payments` table.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod event;
pub mod payment;
pub mod paypal_handler;
pub mod store;

use paypal_handler::{paypal_webhook_handler, PayPalState};

/// `POST /` serves the webhook at the root path as well, for edge-function style deployments.
pub fn build_router(paypal_state: Arc<PayPalState>) -> Router {
    let paypal_router = Router::new()
        .route("/webhook", post(paypal_webhook_handler))
        .with_state(paypal_state.clone());

    Router::new()
        .route("/", post(paypal_webhook_handler))
        .with_state(paypal_state)
        .nest("/paypal", paypal_router)
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
}
