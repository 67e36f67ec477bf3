//! `/v1/admin/models` — model catalogue plus provider/model linking.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use gw_domain::capability::CapabilitySet;
use gw_domain::error::Result;
use gw_domain::event::GatewayEvent;
use gw_domain::models::{Model, ProviderModel};

use super::AdminGuard;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", axum::routing::delete(remove))
        .route("/:provider_id/link/:model_id", post(link).delete(unlink))
}

#[derive(Debug, Deserialize)]
pub struct CreateModelRequest {
    id: String,
    name: String,
    description: Option<String>,
}

async fn list(_guard: AdminGuard, State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.store.models().find_all().await?))
}

async fn create(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Json(req): Json<CreateModelRequest>,
) -> Result<impl IntoResponse> {
    let model = Model { id: req.id, name: req.name, description: req.description, capabilities: CapabilitySet::default() };
    state.store.models().create(&model).await?;
    state.events.publish(GatewayEvent::ModelsUpdated);
    Ok(Json(model))
}

async fn remove(_guard: AdminGuard, State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    state.store.models().delete(&id).await?;
    state.events.publish(GatewayEvent::ModelsUpdated);
    Ok(Json(json!({ "deleted": id })))
}

#[derive(Debug, Deserialize, Default)]
pub struct LinkRequest {
    #[serde(default)]
    default: bool,
}

async fn link(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path((provider_id, model_id)): Path<(String, String)>,
    body: Option<Json<LinkRequest>>,
) -> Result<impl IntoResponse> {
    let default = body.map(|Json(r)| r.default).unwrap_or(false);
    state
        .store
        .models()
        .link(&ProviderModel { provider_id, model_id, is_default: default, config: None })
        .await?;
    state.events.publish(GatewayEvent::ModelsUpdated);
    Ok(Json(json!({ "linked": true })))
}

async fn unlink(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path((provider_id, model_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    state.store.models().unlink(&provider_id, &model_id).await?;
    state.events.publish(GatewayEvent::ModelsUpdated);
    Ok(Json(json!({ "unlinked": true })))
}
