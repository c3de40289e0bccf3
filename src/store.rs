// Persistent store collaborator: the Supabase `payments` table over PostgREST.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::SupabaseConfig;
use crate::payment::PaymentRecord;

pub const PAYMENTS_TABLE: &str = "payments";

/// Display is the store's own message, unchanged, so it can be echoed to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("{message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("{0}")]
    Transport(String),
}

impl StoreError {
    /// HTTP status the store answered with; `None` when it was never reached.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Rejected { status, .. } => Some(*status),
            StoreError::Transport(_) => None,
        }
    }

    /// PostgREST / Postgres error code, e.g. `23505` for a unique violation.
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Rejected { code, .. } => code.as_deref(),
            StoreError::Transport(_) => None,
        }
    }
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts one record and returns whatever the store echoed back.
    async fn insert_payment(&self, record: &PaymentRecord) -> Result<Value, StoreError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUPABASE STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SupabaseStore {
    config: SupabaseConfig,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    code: Option<String>,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    fn prefer_header(&self) -> &'static str {
        if self.config.return_representation {
            "return=representation"
        } else {
            "return=minimal"
        }
    }
}

#[async_trait]
impl PaymentStore for SupabaseStore {
    async fn insert_payment(&self, record: &PaymentRecord) -> Result<Value, StoreError> {
        let key = &self.config.service_role_key;

        let resp = self
            .http_client
            .post(self.config.table_url(PAYMENTS_TABLE))
            .header("apikey", key.as_str())
            .header("Authorization", format!("Bearer {}", key))
            .header("Prefer", self.prefer_header())
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| StoreError::Transport(format!("Invalid store response: {}", e)))
    }
}

fn rejection(status: StatusCode, body: &str) -> StoreError {
    let parsed = serde_json::from_str::<PostgrestError>(body).ok();
    let code = parsed.as_ref().and_then(|p| p.code.clone());

    let message = parsed
        .and_then(|p| p.message)
        .filter(|m| !m.is_empty())
        .or_else(|| {
            let text = body.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        });

    StoreError::Rejected {
        status: status.as_u16(),
        code,
        message,
    }
}
