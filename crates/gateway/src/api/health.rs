//! Liveness probe. Deliberately left off the API-token-gated route group —
//! orchestrators need to be able to hit this before any token is wired in.

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    providers_loaded: usize,
    /// Unix-ms of the last session sweep that actually evicted a row, or
    /// `None` if none has yet.
    last_session_sweep_ms: Option<i64>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let last_sweep = state.last_session_sweep_ms.load(Ordering::Relaxed);
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        providers_loaded: state.registry.len(),
        last_session_sweep_ms: (last_sweep > 0).then_some(last_sweep),
    })
}
