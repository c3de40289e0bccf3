//! SupabaseStore against a stub PostgREST server on an ephemeral port.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use paypal_payments_webhook::config::SupabaseConfig;
use paypal_payments_webhook::payment::PaymentRecord;
use paypal_payments_webhook::store::{PaymentStore, StoreError, SupabaseStore};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct CapturedRequest {
    apikey: Option<String>,
    authorization: Option<String>,
    prefer: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct StubState {
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    status: StatusCode,
    response: String,
}

async fn insert_payments(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.captured.lock().unwrap().push(CapturedRequest {
        apikey: header("apikey"),
        authorization: header("authorization"),
        prefer: header("prefer"),
        body,
    });

    (state.status, state.response.clone())
}

async fn spawn_stub(status: StatusCode, response: &str) -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/rest/v1/payments", post(insert_payments))
        .with_state(StubState {
            captured: captured.clone(),
            status,
            response: response.to_string(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), captured)
}

fn record() -> PaymentRecord {
    PaymentRecord {
        user_id: "U123".to_string(),
        amount: 19.99,
        provider: "paypal",
        status: "completed",
    }
}

#[tokio::test]
async fn minimal_insert_sends_credentials_and_returns_null() {
    let (base_url, captured) = spawn_stub(StatusCode::CREATED, "").await;
    let config = SupabaseConfig::new(&base_url, "service-role-key").unwrap();
    let store = SupabaseStore::new(config);

    let data = store.insert_payment(&record()).await.unwrap();

    assert_eq!(data, Value::Null);
    let captured = captured.lock().unwrap().clone();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].apikey.as_deref(), Some("service-role-key"));
    assert_eq!(
        captured[0].authorization.as_deref(),
        Some("Bearer service-role-key")
    );
    assert_eq!(captured[0].prefer.as_deref(), Some("return=minimal"));
    assert_eq!(
        captured[0].body,
        json!({
            "user_id": "U123",
            "amount": 19.99,
            "provider": "paypal",
            "status": "completed"
        })
    );
}

#[tokio::test]
async fn representation_insert_returns_echoed_rows() {
    let echoed = r#"[{"id":1,"user_id":"U123","amount":19.99,"provider":"paypal","status":"completed"}]"#;
    let (base_url, captured) = spawn_stub(StatusCode::CREATED, echoed).await;
    let config = SupabaseConfig::new(&base_url, "k")
        .unwrap()
        .with_return_representation(true);
    let store = SupabaseStore::new(config);

    let data = store.insert_payment(&record()).await.unwrap();

    assert_eq!(data, serde_json::from_str::<Value>(echoed).unwrap());
    assert_eq!(
        captured.lock().unwrap()[0].prefer.as_deref(),
        Some("return=representation")
    );
}

#[tokio::test]
async fn postgrest_error_message_is_surfaced() {
    let (base_url, _) = spawn_stub(
        StatusCode::BAD_REQUEST,
        r#"{"code":"PGRST204","details":null,"hint":null,"message":"Could not find the 'amount' column of 'payments' in the schema cache"}"#,
    )
    .await;
    let store = SupabaseStore::new(SupabaseConfig::new(&base_url, "k").unwrap());

    let err = store.insert_payment(&record()).await.unwrap_err();

    assert_eq!(
        err,
        StoreError::Rejected {
            status: 400,
            code: Some("PGRST204".to_string()),
            message: "Could not find the 'amount' column of 'payments' in the schema cache"
                .to_string(),
        }
    );
}

#[tokio::test]
async fn unreachable_store_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = SupabaseStore::new(SupabaseConfig::new(&format!("http://{}", addr), "k").unwrap());

    let err = store.insert_payment(&record()).await.unwrap_err();

    assert!(matches!(err, StoreError::Transport(ref m) if !m.is_empty()));
}
