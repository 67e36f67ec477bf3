//! `/v1/admin/providers` — CRUD plus lifecycle actions (enable/disable feed
//! into the registry, not just the row) and a config sub-resource with
//! sensitive values redacted on read.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use gw_domain::error::{Error, Result};
use gw_domain::event::GatewayEvent;
use gw_domain::models::{ConfigValue, Provider, ProviderConfig, ProviderType};
use gw_store::now_ms;

use super::AdminGuard;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(remove))
        .route("/:id/enable", post(enable))
        .route("/:id/disable", post(disable))
        .route("/:id/reload", post(reload))
        .route("/:id/health", get(health))
        .route("/:id/config", get(list_config).put(set_config))
}

#[derive(Debug, Deserialize)]
pub struct CreateProviderRequest {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    priority: i64,
    description: Option<String>,
}

async fn list(_guard: AdminGuard, State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.store.providers().find_all(false).await?))
}

async fn create(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Json(req): Json<CreateProviderRequest>,
) -> Result<impl IntoResponse> {
    let kind = ProviderType::parse(&req.kind)
        .ok_or_else(|| Error::Validation(format!("unknown provider type '{}'", req.kind)))?;
    let now = now_ms();
    let provider = Provider {
        id: req.id,
        name: req.name,
        kind,
        enabled: true,
        priority: req.priority,
        description: req.description,
        created_at: now,
        updated_at: now,
    };
    state.store.providers().create(&provider).await?;
    Ok(Json(provider))
}

async fn get_one(_guard: AdminGuard, State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    Ok(Json(state.store.providers().get(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProviderRequest {
    name: Option<String>,
    priority: Option<i64>,
    description: Option<String>,
}

async fn update(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProviderRequest>,
) -> Result<impl IntoResponse> {
    let mut provider = state.store.providers().get(&id).await?;
    if let Some(name) = req.name {
        provider.name = name;
    }
    if let Some(priority) = req.priority {
        provider.priority = priority;
    }
    if let Some(description) = req.description {
        provider.description = Some(description);
    }
    provider.updated_at = now_ms();
    state.store.providers().update(&provider).await?;
    Ok(Json(provider))
}

async fn remove(_guard: AdminGuard, State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    state.registry.unload(&id);
    state.store.providers().delete(&id).await?;
    state.events.publish(GatewayEvent::ProvidersUpdated);
    Ok(Json(json!({ "deleted": id })))
}

async fn enable(_guard: AdminGuard, State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    set_enabled(&state, &id, true).await
}

async fn disable(_guard: AdminGuard, State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    set_enabled(&state, &id, false).await
}

async fn set_enabled(state: &AppState, id: &str, enabled: bool) -> Result<impl IntoResponse> {
    let mut provider = state.store.providers().get(id).await?;
    provider.enabled = enabled;
    provider.updated_at = now_ms();
    state.store.providers().update(&provider).await?;

    if enabled {
        state.registry.load(id).await?;
    } else {
        state.registry.unload(id);
    }
    state.events.publish(GatewayEvent::ProvidersUpdated);
    Ok(Json(provider))
}

async fn reload(_guard: AdminGuard, State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    state.registry.reload(&id).await?;
    state.events.publish(GatewayEvent::ProvidersUpdated);
    Ok(Json(json!({ "reloaded": id })))
}

async fn health(_guard: AdminGuard, State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let provider = state.registry.get(&id)?;
    let health = provider.health_check().await?;
    Ok(Json(json!({
        "healthy": health.healthy,
        "latency_ms": health.latency_ms,
        "message": health.message,
    })))
}

async fn list_config(_guard: AdminGuard, State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let configs: Vec<_> = state
        .store
        .providers()
        .get_configs(&id)
        .await?
        .into_iter()
        .map(|c| {
            let value = if c.is_sensitive { c.value.redacted() } else { c.value };
            ProviderConfig { value, ..c }
        })
        .collect();
    Ok(Json(configs))
}

#[derive(Debug, Deserialize)]
pub struct SetConfigRequest {
    key: String,
    value: ConfigValue,
    #[serde(default)]
    is_sensitive: bool,
}

async fn set_config(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetConfigRequest>,
) -> Result<impl IntoResponse> {
    state
        .store
        .providers()
        .set_config(&ProviderConfig { provider_id: id, key: req.key, value: req.value, is_sensitive: req.is_sensitive })
        .await?;
    Ok(Json(json!({ "ok": true })))
}
