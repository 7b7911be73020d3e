//! Full lifecycle against a mock backend: schema in, validated
//! payload out, submission polled to completion, credits reconciled.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use rungate::client::{RestClientConfig, RestJobClient};
use rungate::{
    CreditLedger, ExecutionController, FormSession, GenerationStatus, PollConfig, RunMetadata,
    RunState, TokioScheduler,
};

#[derive(Clone, Default)]
struct Backend {
    status_fetches: Arc<AtomicU32>,
}

async fn submit_run(Path(model_id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "id": "gen-7",
        "modelId": model_id,
        "status": "pending",
        "input": body["input"],
        "creditsUsed": 6,
    }))
}

async fn generation_status(State(backend): State<Backend>, Path(id): Path<String>) -> Json<Value> {
    let n = backend.status_fetches.fetch_add(1, Ordering::SeqCst);
    if n < 2 {
        Json(json!({ "id": id, "status": "processing", "creditsUsed": 6 }))
    } else {
        Json(json!({
            "id": id,
            "modelId": "sdxl",
            "status": "completed",
            "input": { "prompt": "a cat", "width": 1024 },
            "outputUrl": "https://cdn.example/out.png",
            "creditsUsed": 6,
            "executionTimeMs": 2040,
        }))
    }
}

async fn balance() -> Json<Value> {
    Json(json!({
        "totalCredits": 94,
        "subscriptionCredits": 80,
        "purchasedCredits": 14,
    }))
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/v1/models/{model_id}/runs", post(submit_run))
        .route("/v1/generations/{id}", get(generation_status))
        .route("/v1/credits/balance", get(balance))
        .with_state(Backend::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn schema_to_completed_generation_with_credit_reconciliation() {
    let base = spawn_backend().await;
    let client = Arc::new(RestJobClient::new(RestClientConfig {
        base_url: base,
        api_key: "test-key".to_string(),
    }));

    // Build the payload from the model's declared schema.
    let schema = serde_json::from_value(json!({
        "type": "object",
        "properties": {
            "prompt": { "type": "string" },
            "width": { "type": "integer", "minimum": 256, "maximum": 2048, "default": 1024 }
        },
        "required": ["prompt"]
    }))
    .unwrap();
    let mut form = FormSession::new(schema);
    form.set_value("prompt", json!("a cat"));
    let payload = form.build_payload().unwrap();
    assert_eq!(payload, json!({ "prompt": "a cat", "width": 1024 }));

    // Gate on credits, then submit and poll to a terminal state.
    let mut ledger = CreditLedger::new();
    ledger.refresh(client.as_ref()).await;
    assert!(ledger.can_afford(6));

    let mut ctl = ExecutionController::new(
        client.clone(),
        Arc::new(TokioScheduler),
        PollConfig {
            interval: Duration::from_millis(5),
            max_attempts: 60,
        },
    );
    let done = ctl
        .submit("sdxl", payload, RunMetadata::default())
        .await
        .unwrap();

    assert_eq!(ctl.state(), RunState::Completed);
    assert_eq!(done.status, GenerationStatus::Completed);
    assert_eq!(done.output_url.as_deref(), Some("https://cdn.example/out.png"));
    form.reset();

    // Optimistic debit, then the authoritative read wins outright.
    ledger.apply_optimistic_debit(done.credits_used);
    assert_eq!(ledger.balance().unwrap().total_credits, 88);
    assert!(ledger.has_pending_debit());
    ledger.refresh(client.as_ref()).await;
    assert_eq!(ledger.balance().unwrap().total_credits, 94);
    assert!(!ledger.has_pending_debit());
}
