//! `GET /v1/models` — OpenAI-shaped listing, aggregated across every
//! enabled, loaded provider by [`gw_router::ModelsCache`].

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Serialize;

use gw_domain::error::Error;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ModelObject {
    id: String,
    object: &'static str,
    owned_by: &'static str,
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
    object: &'static str,
    data: Vec<ModelObject>,
}

pub async fn list_models(State(state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let ids = state.models_cache.list().await?;
    let data = ids
        .into_iter()
        .map(|id| ModelObject { id, object: "model", owned_by: "gateway" })
        .collect();
    Ok(Json(ModelsResponse { object: "list", data }))
}
