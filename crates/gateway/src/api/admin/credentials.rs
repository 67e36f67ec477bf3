//! `/v1/admin/credentials/:backend` — scraped browser-session credentials
//! for stateful backends (in practice, just `qwen_web`). `Credential`'s
//! manual `Debug` impl already redacts the token/cookie fields, so returning
//! it directly never leaks secrets into logs.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use gw_domain::error::{Error, Result};
use gw_domain::event::GatewayEvent;
use gw_store::now_ms;

use super::AdminGuard;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:backend", axum::routing::get(get_one).put(upsert)).route("/:backend/invalidate", post(invalidate))
}

async fn get_one(_guard: AdminGuard, State(state): State<AppState>, Path(backend): Path<String>) -> Result<impl IntoResponse> {
    let credential = state
        .store
        .credentials()
        .get_current(&backend)
        .await?
        .ok_or_else(|| Error::NotFound(format!("credential for {backend}")))?;
    Ok(Json(credential))
}

#[derive(Debug, Deserialize)]
pub struct UpsertCredentialRequest {
    bearer_token: String,
    cookie_jar: String,
    expires_at: Option<i64>,
}

async fn upsert(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(backend): Path<String>,
    Json(req): Json<UpsertCredentialRequest>,
) -> Result<impl IntoResponse> {
    state
        .store
        .credentials()
        .upsert(&backend, &req.bearer_token, &req.cookie_jar, req.expires_at, now_ms())
        .await?;
    state.events.publish(GatewayEvent::CredentialsUpdated { backend: backend.clone() });
    Ok(Json(json!({ "backend": backend, "updated": true })))
}

async fn invalidate(_guard: AdminGuard, State(state): State<AppState>, Path(backend): Path<String>) -> Result<impl IntoResponse> {
    state.store.credentials().mark_stale(&backend, now_ms()).await?;
    state.events.publish(GatewayEvent::CredentialsInvalid { backend: backend.clone() });
    Ok(Json(json!({ "backend": backend, "stale": true })))
}
