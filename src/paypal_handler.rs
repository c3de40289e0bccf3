// PayPal webhook handler: decode, classify, persist completed captures.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::SupabaseConfig;
use crate::event::{InvalidEvent, PayPalEvent};
use crate::payment::PaymentRecord;
use crate::store::{PaymentStore, StoreError, SupabaseStore};

// ═══════════════════════════════════════════════════════════════════════════════
// PAYPAL STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct PayPalState {
    pub store: Arc<dyn PaymentStore>,
}

impl PayPalState {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self { store }
    }

    pub fn supabase(config: SupabaseConfig) -> Self {
        Self::new(Arc::new(SupabaseStore::new(config)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOMES & ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// Record written; carries the store's response verbatim.
    Stored(Value),
    /// Soft-accept for events this service does not act on.
    Ignored { event_type: String },
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("{0}")]
    Body(String),

    #[error("{0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("Cannot read webhook event from a null body")]
    NullBody,

    #[error(transparent)]
    InvalidEvent(#[from] InvalidEvent),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            WebhookError::Body(_)
            | WebhookError::MalformedJson(_)
            | WebhookError::NullBody
            | WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match &self {
            // already logged where the insert failed
            WebhookError::Store(_) => {}
            WebhookError::InvalidEvent(e) => warn!(error = %e, "Rejected PayPal webhook"),
            WebhookError::Body(_) | WebhookError::MalformedJson(_) | WebhookError::NullBody => {
                error!(error = %self, "Error processing webhook")
            }
        }

        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl IntoResponse for WebhookOutcome {
    fn into_response(self) -> Response {
        let body = match self {
            WebhookOutcome::Stored(data) => json!({ "success": true, "data": data }),
            WebhookOutcome::Ignored { event_type } => json!({
                "message": format!("Event type '{}' not processed", event_type)
            }),
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROCESSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Handles one webhook body. At most one insert is attempted, and only for
/// `PAYMENT.CAPTURE.COMPLETED`; nothing is deduplicated, so a redelivered
/// event is inserted again.
pub async fn process_webhook(
    store: &dyn PaymentStore,
    body: &[u8],
) -> Result<WebhookOutcome, WebhookError> {
    let envelope: Value = serde_json::from_slice(body)?;
    if envelope.is_null() {
        return Err(WebhookError::NullBody);
    }
    let raw_event = envelope.get("event");

    let echoed = raw_event
        .map(|e| e.to_string())
        .unwrap_or_else(|| "undefined".to_string());
    info!(event = %echoed, "Received PayPal webhook");

    let resource = match PayPalEvent::from_value(raw_event)? {
        PayPalEvent::CaptureCompleted(resource) => resource,
        other => {
            info!(event_type = other.type_name(), "Event not processed");
            return Ok(WebhookOutcome::Ignored {
                event_type: other.type_name().to_string(),
            });
        }
    };

    let record = PaymentRecord::from_capture(&resource);

    match store.insert_payment(&record).await {
        Ok(data) => {
            info!(user_id = %record.user_id, data = %data, "Payment data saved successfully");
            Ok(WebhookOutcome::Stored(data))
        }
        Err(e) => {
            error!(
                user_id = %record.user_id,
                error = %e,
                store_status = ?e.status(),
                store_code = ?e.code(),
                "Error saving payment data"
            );
            Err(e.into())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WEBHOOK HANDLER
// ═══════════════════════════════════════════════════════════════════════════════

/// Accepts any content type; the body is decoded here so decode failures get the JSON error shape.
pub async fn paypal_webhook_handler(
    State(state): State<Arc<PayPalState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<WebhookOutcome, WebhookError> {
    let body = body.map_err(|e| WebhookError::Body(e.body_text()))?;
    process_webhook(state.store.as_ref(), &body).await
}
