//! `/v1/admin/settings` — read/write through [`gw_router::SettingsService`]
//! rather than the raw repo, so every write publishes `SettingsChanged` and
//! reports whether a restart is needed.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use gw_domain::error::{Error, Result};
use gw_domain::models::SettingValue;
use gw_store::now_ms;

use super::AdminGuard;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list)).route("/:key", get(get_one).put(set))
}

async fn list(_guard: AdminGuard, State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.store.settings().find_all().await?))
}

async fn get_one(_guard: AdminGuard, State(state): State<AppState>, Path(key): Path<String>) -> Result<impl IntoResponse> {
    let value = state
        .settings
        .effective(&key)
        .await?
        .ok_or_else(|| Error::NotFound(format!("setting {key}")))?;
    Ok(Json(json!({ "key": key, "value": value })))
}

#[derive(Debug, Deserialize)]
pub struct SetSettingRequest {
    value: SettingValue,
}

async fn set(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetSettingRequest>,
) -> Result<impl IntoResponse> {
    let requires_restart = state.settings.update(&key, req.value, now_ms()).await?;
    Ok(Json(json!({ "key": key, "requires_restart": requires_restart })))
}
