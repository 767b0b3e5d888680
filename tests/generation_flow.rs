//! Integration tests for the generation flow over the HTTP API.
//!
//! These tests run the full router against in-memory adapters and a
//! scripted provider: quota checks, the submit + poll loop, token
//! accounting, and billing webhook effects.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use hmac::{Hmac, Mac};
use secrecy::Secret;
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tower::ServiceExt;

use genstudio::adapters::http::dto::ProviderKind;
use genstudio::adapters::http::{app_router, AppState};
use genstudio::adapters::memory::{
    InMemoryTierDirectory, InMemoryTokenLedger, InMemoryUsageStore,
};
use genstudio::adapters::providers::PollOptions;
use genstudio::application::{GenerationOrchestrator, TierResolver, UsageLimiter};
use genstudio::domain::billing::BillingWebhookVerifier;
use genstudio::domain::foundation::{TaskId, UserId};
use genstudio::domain::generation::TaskSnapshot;
use genstudio::domain::tier::{Tier, TierRow};
use genstudio::domain::usage::FeatureType;
use genstudio::ports::{GenerationProvider, ProviderError, SubmitParams, TierSource, TokenLedger};

const WEBHOOK_SECRET: &str = "whsec_integration";

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Provider that replays a scripted sequence of status snapshots.
struct ScriptedProvider {
    feature: FeatureType,
    script: Mutex<Vec<TaskSnapshot>>,
}

impl ScriptedProvider {
    fn new(feature: FeatureType, mut script: Vec<TaskSnapshot>) -> Self {
        script.reverse();
        Self {
            feature,
            script: Mutex::new(script),
        }
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn feature(&self) -> FeatureType {
        self.feature
    }

    async fn submit(&self, _params: SubmitParams) -> Result<TaskId, ProviderError> {
        Ok(TaskId::new("task-1").expect("static id"))
    }

    async fn check_status(&self, _task_id: &TaskId) -> Result<TaskSnapshot, ProviderError> {
        Ok(self
            .script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(TaskSnapshot::pending))
    }
}

struct Harness {
    state: AppState,
    directory: Arc<InMemoryTierDirectory>,
    ledger: Arc<InMemoryTokenLedger>,
}

fn harness(providers: Vec<(ProviderKind, Arc<dyn GenerationProvider>)>) -> Harness {
    let directory = Arc::new(InMemoryTierDirectory::new());
    let ledger = Arc::new(InMemoryTokenLedger::new());
    let store = Arc::new(InMemoryUsageStore::new());

    let resolver = Arc::new(TierResolver::new(
        vec![directory.clone() as Arc<dyn TierSource>],
        3,
    ));
    let limiter = Arc::new(UsageLimiter::new(store));
    let orchestrator = Arc::new(GenerationOrchestrator::new(
        resolver.clone(),
        limiter.clone(),
        ledger.clone(),
    ));

    let providers: HashMap<ProviderKind, Arc<dyn GenerationProvider>> =
        providers.into_iter().collect();

    let state = AppState {
        resolver,
        limiter,
        orchestrator,
        providers: Arc::new(providers),
        poll_options: PollOptions::new(10, Duration::ZERO),
        webhook_verifier: Arc::new(BillingWebhookVerifier::new(Secret::new(
            WEBHOOK_SECRET.to_string(),
        ))),
        tier_admin: directory.clone(),
        ledger: ledger.clone(),
    };

    Harness {
        state,
        directory,
        ledger,
    }
}

fn user_id() -> UserId {
    UserId::new("user-1").expect("valid id")
}

async fn send_json(
    state: AppState,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-User-Id", "user-1");
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        })
        .expect("request builds");

    let response = app_router(state).oneshot(request).await.expect("routed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is json")
    };
    (status, value)
}

fn signed_webhook_request(payload: &str) -> Request<Body> {
    let ts = chrono::Utc::now().timestamp();
    let signed = format!("{}.{}", ts, payload);
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).expect("hmac key");
    mac.update(signed.as_bytes());
    let header = format!("t={},v1={}", ts, hex::encode(mac.finalize().into_bytes()));

    Request::post("/api/webhooks/billing")
        .header("Billing-Signature", header)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

// =============================================================================
// Generation Flow
// =============================================================================

#[tokio::test]
async fn paid_user_generates_video_and_is_charged() {
    let provider = Arc::new(ScriptedProvider::new(
        FeatureType::Video,
        vec![
            TaskSnapshot::pending(),
            TaskSnapshot::running(Some(40)),
            TaskSnapshot::succeeded("https://cdn.example.com/fox.mp4"),
        ],
    ));
    let hx = harness(vec![(ProviderKind::Video, provider)]);
    hx.directory.insert(
        &user_id(),
        TierRow {
            tier: Some(Tier::Pro),
            ..Default::default()
        },
    );
    hx.ledger.set_balance(&user_id(), 500);

    let (status, body) = send_json(
        hx.state.clone(),
        "POST",
        "/api/generation",
        Some(json!({
            "action": "generate",
            "provider": "video",
            "prompt": "a red fox at dawn"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["data"]["url"], "https://cdn.example.com/fox.mp4");

    // Video costs 50 tokens at the default model factor.
    assert_eq!(hx.ledger.balance(&user_id()).await.unwrap(), 450);

    let (status, usage) = send_json(hx.state, "GET", "/api/usage", None).await;
    assert_eq!(status, StatusCode::OK);
    let video_row = usage["features"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["feature"] == "video")
        .expect("video feature present");
    assert_eq!(video_row["used"], 1);
}

#[tokio::test]
async fn free_user_slides_request_requires_upgrade() {
    // Free tier has no slides quota at all. The script is empty, so any
    // poll would run to timeout and surface as 502; a clean 429 proves the
    // provider was never invoked.
    let provider = Arc::new(ScriptedProvider::new(FeatureType::Ppt, vec![]));
    let hx = harness(vec![(ProviderKind::Slides, provider)]);

    let (status, body) = send_json(
        hx.state,
        "POST",
        "/api/generation",
        Some(json!({
            "action": "generate",
            "provider": "slides",
            "prompt": "quarterly review"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["outcome"], "limit_reached");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("upgrade"), "got: {}", message);
}

#[tokio::test]
async fn quota_exhaustion_returns_limit_reached() {
    // Free tier music quota is 2. The third request is denied and the
    // provider script proves it was never polled again.
    let provider = Arc::new(ScriptedProvider::new(
        FeatureType::Music,
        vec![
            TaskSnapshot::succeeded("https://cdn.example.com/a.wav"),
            TaskSnapshot::succeeded("https://cdn.example.com/b.wav"),
        ],
    ));
    let hx = harness(vec![(ProviderKind::Music, provider)]);

    let request = json!({
        "action": "generate",
        "provider": "music",
        "prompt": "lofi beats"
    });

    for _ in 0..2 {
        let (status, body) = send_json(
            hx.state.clone(),
            "POST",
            "/api/generation",
            Some(request.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "completed");
    }

    let (status, body) = send_json(hx.state, "POST", "/api/generation", Some(request)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["outcome"], "limit_reached");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("remaining"), "got: {}", message);
}

#[tokio::test]
async fn paid_user_without_tokens_is_told_to_top_up() {
    let provider = Arc::new(ScriptedProvider::new(
        FeatureType::Video,
        vec![TaskSnapshot::succeeded("https://cdn.example.com/v.mp4")],
    ));
    let hx = harness(vec![(ProviderKind::Video, provider)]);
    hx.directory.insert(
        &user_id(),
        TierRow {
            tier: Some(Tier::Starter),
            ..Default::default()
        },
    );

    let (status, body) = send_json(
        hx.state,
        "POST",
        "/api/generation",
        Some(json!({
            "action": "generate",
            "provider": "video",
            "prompt": "a red fox"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["outcome"], "insufficient_tokens");
}

#[tokio::test]
async fn failed_generation_reports_classified_message() {
    struct FailingProvider;

    #[async_trait]
    impl GenerationProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn feature(&self) -> FeatureType {
            FeatureType::Tts
        }

        async fn submit(&self, _params: SubmitParams) -> Result<TaskId, ProviderError> {
            Err(ProviderError::Http {
                status: 429,
                message: "too many requests".to_string(),
            })
        }

        async fn check_status(&self, _task_id: &TaskId) -> Result<TaskSnapshot, ProviderError> {
            Ok(TaskSnapshot::pending())
        }
    }

    let hx = harness(vec![(ProviderKind::Speech, Arc::new(FailingProvider))]);

    let (status, body) = send_json(
        hx.state,
        "POST",
        "/api/generation",
        Some(json!({
            "action": "generate",
            "provider": "speech",
            "prompt": "hello world"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["outcome"], "failed");
    assert!(body["message"].as_str().unwrap().contains("Rate limit"));
}

// =============================================================================
// Billing Webhook Flow
// =============================================================================

#[tokio::test]
async fn checkout_webhook_upgrades_tier_visible_on_tier_endpoint() {
    let hx = harness(vec![]);

    let payload = json!({
        "id": "evt_1",
        "created": chrono::Utc::now().timestamp(),
        "type": "checkout.completed",
        "data": {
            "user_id": "user-1",
            "tier": "premium",
            "current_period_end": chrono::Utc::now().timestamp() + 30 * 86_400
        }
    })
    .to_string();

    let response = app_router(hx.state.clone())
        .oneshot(signed_webhook_request(&payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send_json(hx.state, "GET", "/api/tier", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "premium");
    assert_eq!(body["is_paid"], true);
}

#[tokio::test]
async fn token_grant_webhook_funds_a_generation() {
    let provider = Arc::new(ScriptedProvider::new(
        FeatureType::Video,
        vec![TaskSnapshot::succeeded("https://cdn.example.com/v.mp4")],
    ));
    let hx = harness(vec![(ProviderKind::Video, provider)]);
    hx.directory.insert(
        &user_id(),
        TierRow {
            tier: Some(Tier::Pro),
            ..Default::default()
        },
    );

    let payload = json!({
        "id": "evt_2",
        "created": chrono::Utc::now().timestamp(),
        "type": "tokens.granted",
        "data": { "user_id": "user-1", "amount": 60 }
    })
    .to_string();

    let response = app_router(hx.state.clone())
        .oneshot(signed_webhook_request(&payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send_json(
        hx.state,
        "POST",
        "/api/generation",
        Some(json!({
            "action": "generate",
            "provider": "video",
            "prompt": "a red fox"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "completed");
    assert_eq!(hx.ledger.balance(&user_id()).await.unwrap(), 10);
}

#[tokio::test]
async fn cancellation_webhook_downgrades_tier_but_keeps_tokens() {
    let hx = harness(vec![]);
    let now = chrono::Utc::now().timestamp();

    let checkout = json!({
        "id": "evt_4",
        "created": now,
        "type": "checkout.completed",
        "data": {
            "user_id": "user-1",
            "tier": "pro",
            "current_period_end": now + 30 * 86_400
        }
    })
    .to_string();
    let grant = json!({
        "id": "evt_5",
        "created": now,
        "type": "tokens.granted",
        "data": { "user_id": "user-1", "amount": 120 }
    })
    .to_string();
    let cancel = json!({
        "id": "evt_6",
        "created": now,
        "type": "subscription.canceled",
        "data": { "user_id": "user-1" }
    })
    .to_string();

    for payload in [&checkout, &grant, &cancel] {
        let response = app_router(hx.state.clone())
            .oneshot(signed_webhook_request(payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Cancellation downgrades the tier but never claws back purchased tokens.
    let (status, body) = send_json(hx.state, "GET", "/api/tier", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "free");
    assert_eq!(hx.ledger.balance(&user_id()).await.unwrap(), 120);
}

#[tokio::test]
async fn tampered_webhook_is_rejected_and_has_no_effect() {
    let hx = harness(vec![]);

    let payload = json!({
        "id": "evt_3",
        "created": chrono::Utc::now().timestamp(),
        "type": "tokens.granted",
        "data": { "user_id": "user-1", "amount": 1000000 }
    })
    .to_string();

    let mut request = signed_webhook_request(&payload);
    // Replace the body after signing.
    *request.body_mut() = Body::from(payload.replace("1000000", "9000000"));

    let response = app_router(hx.state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(hx.ledger.balance(&user_id()).await.unwrap(), 0);
}
