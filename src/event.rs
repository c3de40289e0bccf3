// PayPal webhook event schema.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const PAYMENT_CAPTURE_COMPLETED: &str = "PAYMENT.CAPTURE.COMPLETED";

#[derive(Debug, Error, PartialEq)]
#[error("{0}")]
pub struct InvalidEvent(pub String);

// ═══════════════════════════════════════════════════════════════════════════════
// PAYPAL EVENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal text; a bare JSON number is accepted and kept in its JSON text form.
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResource {
    pub payer_id: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayPalEvent {
    CaptureCompleted(CaptureResource),
    Unrecognized { event_type: Option<String> },
}

impl PayPalEvent {
    /// Classifies the `event` member of a webhook body.
    ///
    /// `None`, `null` and non-object values count as a missing event. Only the
    /// capture-completed type is decoded further; its resource must carry a
    /// string `payer_id` and a string or numeric `amount.value`.
    pub fn from_value(event: Option<&Value>) -> Result<Self, InvalidEvent> {
        let Some(Value::Object(fields)) = event else {
            return Ok(PayPalEvent::Unrecognized { event_type: None });
        };

        let event_type = fields.get("type").and_then(type_label);
        if event_type.as_deref() != Some(PAYMENT_CAPTURE_COMPLETED) {
            return Ok(PayPalEvent::Unrecognized { event_type });
        }

        let resource = match fields.get("resource") {
            Some(resource) if !resource.is_null() => resource,
            _ => {
                return Err(InvalidEvent(format!(
                    "{} event is missing its resource",
                    PAYMENT_CAPTURE_COMPLETED
                )))
            }
        };

        CaptureResource::deserialize(resource)
            .map(PayPalEvent::CaptureCompleted)
            .map_err(|e| {
                InvalidEvent(format!(
                    "Invalid {} resource: {}",
                    PAYMENT_CAPTURE_COMPLETED, e
                ))
            })
    }

    /// Name used in the "not processed" acknowledgement.
    pub fn type_name(&self) -> &str {
        match self {
            PayPalEvent::CaptureCompleted(_) => PAYMENT_CAPTURE_COMPLETED,
            PayPalEvent::Unrecognized { event_type } => event_type.as_deref().unwrap_or("unknown"),
        }
    }
}

/// Falsy types (`null`, `false`, `""`, `0`) have no label; other scalars use their JSON text.
fn type_label(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
