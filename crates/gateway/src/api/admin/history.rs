//! `/v1/admin/{requests,responses,errors,sessions}` — paginated, read-only
//! views over the audit log. All four share the same `limit`/`offset` query
//! shape, so one `Pagination` extractor covers them.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use gw_domain::error::Result;

use super::AdminGuard;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests", get(requests))
        .route("/responses", get(responses))
        .route("/errors", get(errors))
        .route("/sessions", get(sessions))
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
    #[serde(default)]
    provider: Option<String>,
}

fn default_limit() -> i64 {
    50
}

async fn requests(_guard: AdminGuard, State(state): State<AppState>, Query(p): Query<Pagination>) -> Result<impl IntoResponse> {
    Ok(Json(state.store.requests().find_all(p.provider.as_deref(), p.limit, p.offset).await?))
}

async fn responses(_guard: AdminGuard, State(state): State<AppState>, Query(p): Query<Pagination>) -> Result<impl IntoResponse> {
    Ok(Json(state.store.responses().find_all(p.limit, p.offset).await?))
}

async fn errors(_guard: AdminGuard, State(state): State<AppState>, Query(p): Query<Pagination>) -> Result<impl IntoResponse> {
    Ok(Json(state.store.errors().find_all(p.limit, p.offset).await?))
}

async fn sessions(_guard: AdminGuard, State(state): State<AppState>, Query(p): Query<Pagination>) -> Result<impl IntoResponse> {
    Ok(Json(state.store.sessions().list(p.limit, p.offset).await?))
}
