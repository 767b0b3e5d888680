//! HTTP handlers wiring the Axum routes to the application layer.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::providers::{poll_until_done, PollOptions};
use crate::application::{GenerationOrchestrator, GenerationOutcome, GenerationRequest};
use crate::application::{TierResolver, UsageLimiter};
use crate::domain::billing::{BillingEvent, BillingEventKind, BillingWebhookVerifier, WebhookError};
use crate::domain::foundation::{TaskId, Timestamp, UserId};
use crate::domain::generation::classify_error;
use crate::ports::{
    GenerationProvider, ProviderError, SubmitParams, TierAdmin, TierSourceError, TokenLedger,
    TokenLedgerError, UsageStoreError,
};

use super::dto::{
    ErrorResponse, GenerationRequestBody, HealthResponse, ProviderKind, TierResponse,
    UsageOverviewResponse, WebhookAck,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<TierResolver>,
    pub limiter: Arc<UsageLimiter>,
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub providers: Arc<HashMap<ProviderKind, Arc<dyn GenerationProvider>>>,
    pub poll_options: PollOptions,
    pub webhook_verifier: Arc<BillingWebhookVerifier>,
    pub tier_admin: Arc<dyn TierAdmin>,
    pub ledger: Arc<dyn TokenLedger>,
}

impl AppState {
    fn provider(&self, kind: ProviderKind) -> Result<Arc<dyn GenerationProvider>, ApiError> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or(ApiError::ProviderUnavailable(kind))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from the request.
///
/// The gateway in front of this service resolves sessions and forwards the
/// user id in the X-User-Id header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| UserId::new(s).ok())
                .ok_or(AuthenticationRequired)?;

            Ok(AuthenticatedUser { user_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Generation
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/generation - submit a generation or check a task.
pub async fn handle_generation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<GenerationRequestBody>,
) -> Result<Response, ApiError> {
    match body {
        GenerationRequestBody::Generate {
            provider,
            prompt,
            model,
            extra,
        } => {
            let provider_impl = state.provider(provider)?;
            let request_id = Uuid::new_v4();
            info!(
                %request_id,
                user_id = %user.user_id,
                provider = %provider,
                model = model.as_deref().unwrap_or("default"),
                "generation requested"
            );

            let request = GenerationRequest {
                user_id: user.user_id,
                feature: provider.feature(),
                model: model.clone(),
            };
            let params = SubmitParams {
                prompt,
                model,
                extra,
            };
            let poll_options = state.poll_options.clone();

            let outcome = state
                .orchestrator
                .execute(request, || async move {
                    let task_id = provider_impl.submit(params).await?;
                    poll_until_done(provider_impl.as_ref(), &task_id, &poll_options, None).await
                })
                .await;

            let status = outcome_status(&outcome);
            Ok((status, Json(outcome)).into_response())
        }
        GenerationRequestBody::Status { provider, task_id } => {
            let provider_impl = state.provider(provider)?;
            let task_id =
                TaskId::new(task_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            let snapshot = provider_impl
                .check_status(&task_id)
                .await
                .map_err(ApiError::Provider)?;
            Ok(Json(snapshot).into_response())
        }
    }
}

fn outcome_status<T>(outcome: &GenerationOutcome<T>) -> StatusCode {
    match outcome {
        GenerationOutcome::Completed { .. } => StatusCode::OK,
        GenerationOutcome::LimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
        GenerationOutcome::InsufficientTokens { .. } => StatusCode::PAYMENT_REQUIRED,
        GenerationOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Queries
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/tier - the resolved tier of the current user.
pub async fn get_tier(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let info = state.resolver.resolve(&user.user_id).await;
    Ok(Json(TierResponse {
        user_id: info.user_id.to_string(),
        tier: info.tier,
        is_paid: info.is_paid,
        token_balance: info.token_balance,
    }))
}

/// GET /api/usage - per-feature remaining/limit for the current user.
pub async fn get_usage(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let info = state.resolver.resolve(&user.user_id).await;
    let features = state.limiter.overview(&user.user_id, info.tier).await?;
    Ok(Json(UsageOverviewResponse {
        user_id: info.user_id.to_string(),
        tier: info.tier,
        features,
    }))
}

/// GET /health - liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Billing Webhook
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/billing - apply signed billing events.
pub async fn handle_billing_webhook(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    let signature = headers
        .get("Billing-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing Billing-Signature header".to_string()))?;

    let event = state
        .webhook_verifier
        .verify_and_parse(&body, signature)
        .map_err(ApiError::WebhookRejected)?;

    info!(event_id = %event.id, event = event.kind.name(), "billing event received");
    apply_billing_event(&state, &event).await?;

    Ok(Json(WebhookAck {
        received: true,
        event: event.kind.name().to_string(),
    }))
}

async fn apply_billing_event(state: &AppState, event: &BillingEvent) -> Result<(), ApiError> {
    match &event.kind {
        BillingEventKind::CheckoutCompleted {
            user_id,
            tier,
            current_period_end,
        }
        | BillingEventKind::SubscriptionUpdated {
            user_id,
            tier,
            current_period_end,
        } => {
            let user = UserId::new(user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            state
                .tier_admin
                .set_tier(
                    &user,
                    *tier,
                    Some(Timestamp::from_unix_secs(*current_period_end)),
                )
                .await?;
        }
        BillingEventKind::SubscriptionCanceled { user_id } => {
            let user = UserId::new(user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            state.tier_admin.clear_tier(&user).await?;
        }
        BillingEventKind::TokensGranted { user_id, amount } => {
            let user = UserId::new(user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            let amount = u64::try_from(*amount)
                .map_err(|_| ApiError::BadRequest("token grant must be positive".to_string()))?;
            state.ledger.grant(&user, amount).await?;
        }
        BillingEventKind::Unknown => {
            // Acknowledged without side effects so the sender stops retrying.
            warn!(event_id = %event.id, "ignoring unknown billing event type");
        }
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type mapping internal failures to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    WebhookRejected(WebhookError),
    ProviderUnavailable(ProviderKind),
    Provider(ProviderError),
    Tier(TierSourceError),
    Ledger(TokenLedgerError),
    Usage(UsageStoreError),
}

impl From<TierSourceError> for ApiError {
    fn from(err: TierSourceError) -> Self {
        ApiError::Tier(err)
    }
}

impl From<TokenLedgerError> for ApiError {
    fn from(err: TokenLedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<UsageStoreError> for ApiError {
    fn from(err: UsageStoreError) -> Self {
        ApiError::Usage(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message),
            ApiError::WebhookRejected(err) => (
                StatusCode::BAD_REQUEST,
                "WEBHOOK_REJECTED",
                err.to_string(),
            ),
            ApiError::ProviderUnavailable(kind) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "PROVIDER_UNAVAILABLE",
                format!("the {} provider is not configured", kind),
            ),
            ApiError::Provider(err) => (
                StatusCode::BAD_GATEWAY,
                "PROVIDER_ERROR",
                classify_error(&err.to_string()),
            ),
            ApiError::Tier(err) => {
                warn!(error = %err, "tier storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Ledger(err) => {
                warn!(error = %err, "token ledger failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Usage(err) => {
                warn!(error = %err, "usage store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hmac::{Hmac, Mac};
    use secrecy::Secret;
    use sha2::Sha256;
    use std::time::Duration;

    use crate::adapters::memory::{InMemoryTierDirectory, InMemoryTokenLedger, InMemoryUsageStore};
    use crate::domain::generation::TaskSnapshot;
    use crate::domain::tier::Tier;
    use crate::domain::usage::FeatureType;
    use crate::ports::TierSource;

    const WEBHOOK_SECRET: &str = "whsec_test";

    // ════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════

    /// Provider that succeeds on the first status check.
    struct InstantProvider {
        feature: FeatureType,
        url: String,
    }

    #[async_trait]
    impl GenerationProvider for InstantProvider {
        fn name(&self) -> &str {
            "instant"
        }

        fn feature(&self) -> FeatureType {
            self.feature
        }

        async fn submit(&self, _params: SubmitParams) -> Result<TaskId, ProviderError> {
            Ok(TaskId::new("task-1").unwrap())
        }

        async fn check_status(&self, _task_id: &TaskId) -> Result<TaskSnapshot, ProviderError> {
            Ok(TaskSnapshot::succeeded(self.url.clone()))
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════

    fn test_user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId::new("user-1").unwrap(),
        }
    }

    fn test_state() -> (AppState, Arc<InMemoryTierDirectory>, Arc<InMemoryTokenLedger>) {
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

        let mut providers: HashMap<ProviderKind, Arc<dyn GenerationProvider>> = HashMap::new();
        providers.insert(
            ProviderKind::Video,
            Arc::new(InstantProvider {
                feature: FeatureType::Video,
                url: "https://cdn.example.com/v.mp4".to_string(),
            }),
        );

        let state = AppState {
            resolver,
            limiter,
            orchestrator,
            providers: Arc::new(providers),
            poll_options: PollOptions::new(5, Duration::ZERO),
            webhook_verifier: Arc::new(BillingWebhookVerifier::new(Secret::new(
                WEBHOOK_SECRET.to_string(),
            ))),
            tier_admin: directory.clone(),
            ledger: ledger.clone(),
        };
        (state, directory, ledger)
    }

    fn sign(payload: &[u8]) -> (axum::http::HeaderMap, axum::body::Bytes) {
        let ts = chrono::Utc::now().timestamp();
        let signed = format!("{}.{}", ts, String::from_utf8_lossy(payload));
        let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        let header = format!("t={},v1={}", ts, hex::encode(mac.finalize().into_bytes()));

        let mut headers = axum::http::HeaderMap::new();
        headers.insert("Billing-Signature", header.parse().unwrap());
        (headers, axum::body::Bytes::copy_from_slice(payload))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Generation Handler
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn generate_returns_completed_outcome() {
        let (state, _, _) = test_state();
        let body = GenerationRequestBody::Generate {
            provider: ProviderKind::Video,
            prompt: "a red fox".to_string(),
            model: None,
            extra: None,
        };

        let response = handle_generation(State(state), test_user(), Json(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn generate_with_unconfigured_provider_is_503() {
        let (state, _, _) = test_state();
        let body = GenerationRequestBody::Generate {
            provider: ProviderKind::Music,
            prompt: "lofi beats".to_string(),
            model: None,
            extra: None,
        };

        let err = handle_generation(State(state), test_user(), Json(body))
            .await
            .unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn status_action_returns_snapshot() {
        let (state, _, _) = test_state();
        let body = GenerationRequestBody::Status {
            provider: ProviderKind::Video,
            task_id: "task-1".to_string(),
        };

        let response = handle_generation(State(state), test_user(), Json(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn quota_denial_maps_to_429() {
        // Free tier video quota is 1, so the second call is denied.
        let (state, _, _) = test_state();
        let body = GenerationRequestBody::Generate {
            provider: ProviderKind::Video,
            prompt: "fox".to_string(),
            model: None,
            extra: None,
        };
        let response = handle_generation(State(state.clone()), test_user(), Json(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = GenerationRequestBody::Generate {
            provider: ProviderKind::Video,
            prompt: "fox".to_string(),
            model: None,
            extra: None,
        };
        let response = handle_generation(State(state), test_user(), Json(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Queries
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn tier_endpoint_defaults_to_free() {
        let (state, _, _) = test_state();
        let result = get_tier(State(state), test_user()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn usage_endpoint_returns_all_features() {
        let (state, _, _) = test_state();
        let response = get_usage(State(state), test_user())
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Webhook
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn webhook_missing_signature_is_400() {
        let (state, _, _) = test_state();
        let headers = axum::http::HeaderMap::new();
        let body = axum::body::Bytes::from_static(b"{}");

        let err = handle_billing_webhook(State(state), headers, body)
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_bad_signature_is_400() {
        let (state, _, _) = test_state();
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("Billing-Signature", "t=1,v1=deadbeef".parse().unwrap());
        let body = axum::body::Bytes::from_static(b"{}");

        let err = handle_billing_webhook(State(state), headers, body)
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn checkout_completed_sets_tier() {
        let (state, directory, _) = test_state();
        let payload = br#"{
            "id": "evt_1",
            "created": 1700000000,
            "type": "checkout.completed",
            "data": { "user_id": "user-1", "tier": "pro", "current_period_end": 4102444800 }
        }"#;
        let (headers, body) = sign(payload);

        handle_billing_webhook(State(state.clone()), headers, body)
            .await
            .unwrap();

        let info = state
            .resolver
            .resolve(&UserId::new("user-1").unwrap())
            .await;
        assert_eq!(info.tier, Tier::Pro);
        let _ = directory;
    }

    #[tokio::test]
    async fn cancellation_clears_tier() {
        let (state, _, _) = test_state();
        let checkout = br#"{
            "id": "evt_1",
            "created": 1700000000,
            "type": "checkout.completed",
            "data": { "user_id": "user-1", "tier": "pro", "current_period_end": 4102444800 }
        }"#;
        let (headers, body) = sign(checkout);
        handle_billing_webhook(State(state.clone()), headers, body)
            .await
            .unwrap();

        let cancel = br#"{
            "id": "evt_2",
            "created": 1700000000,
            "type": "subscription.canceled",
            "data": { "user_id": "user-1" }
        }"#;
        let (headers, body) = sign(cancel);
        handle_billing_webhook(State(state.clone()), headers, body)
            .await
            .unwrap();

        let info = state
            .resolver
            .resolve(&UserId::new("user-1").unwrap())
            .await;
        assert_eq!(info.tier, Tier::Free);
    }

    #[tokio::test]
    async fn token_grant_raises_balance() {
        let (state, _, ledger) = test_state();
        let payload = br#"{
            "id": "evt_3",
            "created": 1700000000,
            "type": "tokens.granted",
            "data": { "user_id": "user-1", "amount": 500 }
        }"#;
        let (headers, body) = sign(payload);

        handle_billing_webhook(State(state), headers, body)
            .await
            .unwrap();

        let balance = ledger
            .balance(&UserId::new("user-1").unwrap())
            .await
            .unwrap();
        assert_eq!(balance, 500);
    }

    #[tokio::test]
    async fn negative_token_grant_is_rejected() {
        let (state, _, _) = test_state();
        let payload = br#"{
            "id": "evt_4",
            "created": 1700000000,
            "type": "tokens.granted",
            "data": { "user_id": "user-1", "amount": -500 }
        }"#;
        let (headers, body) = sign(payload);

        let err = handle_billing_webhook(State(state), headers, body)
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_event_is_acknowledged() {
        let (state, _, _) = test_state();
        let payload = br#"{
            "id": "evt_5",
            "created": 1700000000,
            "type": "invoice.finalized"
        }"#;
        let (headers, body) = sign(payload);

        let response = handle_billing_webhook(State(state), headers, body)
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
