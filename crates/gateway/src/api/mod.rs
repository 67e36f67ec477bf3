pub mod admin;
pub mod auth;
pub mod events_ws;
pub mod health;
pub mod models;
pub mod openai_compat;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (no auth required — health probes need
/// to work before any token is configured) and **protected** (gated behind
/// the `API_TOKEN` bearer middleware). Admin routes sit under `/v1/admin`
/// and are separately gated per-handler by the `AdminGuard` extractor, so a
/// deployment can hand out API tokens and admin tokens independently.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health::health));

    let protected = Router::new()
        .route("/v1/chat/completions", post(openai_compat::chat_completions))
        .route("/v1/models", get(models::list_models))
        .route("/v1/events", get(events_ws::events_ws))
        .nest("/v1/admin", admin::router())
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_token));

    public.merge(protected).layer(tower_http::trace::TraceLayer::new_for_http())
}
