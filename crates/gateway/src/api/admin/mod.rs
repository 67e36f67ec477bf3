//! `/v1/admin/*` — the operator surface: provider/model/setting CRUD,
//! credential rotation for scraped backends, and read-only audit listings.
//! Every handler takes an [`AdminGuard`] (see `guard.rs`), which enforces
//! `ADMIN_TOKEN` independently of the `API_TOKEN` gate on `/v1/*`.

mod credentials;
mod guard;
mod history;
mod models;
mod providers;
mod settings;

pub use guard::AdminGuard;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/providers", providers::router())
        .nest("/models", models::router())
        .nest("/settings", settings::router())
        .nest("/credentials", credentials::router())
        .merge(history::router())
}
