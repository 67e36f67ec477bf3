use std::sync::atomic::AtomicI64;
use std::sync::Arc;
use std::time::Instant;

use gw_domain::config::Config;
use gw_providers::Registry;
use gw_router::{Dispatcher, EventBus, ModelsCache, SettingsService};
use gw_sessions::SessionManager;
use gw_store::Store;

/// Shared application state passed to every API handler.
///
/// Every field is either an `Arc` or a service struct that is itself cheap
/// to clone (`Store`, `SessionManager`). Built once in `main`, never behind
/// a `static`/`OnceCell` — tests build a fresh one per test against a
/// temp-file database.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub sessions: SessionManager,
    pub registry: Arc<Registry>,
    pub dispatcher: Arc<Dispatcher>,
    pub models_cache: Arc<ModelsCache>,
    pub settings: Arc<SettingsService>,
    pub events: Arc<EventBus>,

    /// SHA-256 digest of the inbound API bearer token, read once at startup.
    /// `None` means dev mode — unauthenticated access to `/v1/*`.
    pub api_token_hash: Option<Vec<u8>>,
    /// SHA-256 digest of the admin bearer token, read once at startup.
    pub admin_token_hash: Option<Vec<u8>>,

    pub started_at: Instant,
    /// Unix-ms of the last completed session sweep, 0 before the first one.
    /// Updated by the background sweeper's `SessionSwept` event; read by the
    /// health endpoint.
    pub last_session_sweep_ms: Arc<AtomicI64>,
}
