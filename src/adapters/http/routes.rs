//! Axum router assembly.
//!
//! The browser client calls this API cross-origin, so CORS is permissive;
//! authentication happens upstream and arrives as the X-User-Id header.
//! Webhooks skip that header and are verified by signature instead.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    get_tier, get_usage, handle_billing_webhook, handle_generation, health, AppState,
};

/// User-facing API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/generation", post(handle_generation))
        .route("/usage", get(get_usage))
        .route("/tier", get(get_tier))
        .route("/webhooks/billing", post(handle_billing_webhook))
}

/// The complete application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
