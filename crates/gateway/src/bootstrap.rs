//! `AppState` construction, shared by the `serve` path and by CLI commands
//! that need the full wiring (none currently do — CLI ops talk to the store
//! and registry directly — but this keeps the one assembly point a single
//! function rather than duplicated inline in `main`).

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use gw_domain::config::Config;
use gw_domain::event::GatewayEvent;
use gw_router::{build_factory, Dispatcher, EventBus, ModelsCache, SettingsService};
use gw_sessions::SessionManager;
use gw_store::Store;
use sha2::{Digest, Sha256};

use crate::state::AppState;

pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let store = Store::open(&config.db_path)
        .await
        .context("opening store")?;
    tracing::info!(db_path = %config.db_path, "store ready");

    let events = Arc::new(EventBus::new());
    let sessions = SessionManager::new(store.clone(), config.session.ttl_ms);

    let factory = build_factory(store.clone(), sessions.clone(), events.sender());
    let registry = Arc::new(gw_providers::Registry::new(store.clone(), factory, events.sender()));
    registry.load_all().await.context("loading providers")?;
    tracing::info!(providers = registry.len(), "provider registry ready");

    let dispatcher = Arc::new(Dispatcher::new(store.clone(), registry.clone(), sessions.clone()));
    let models_cache = Arc::new(ModelsCache::new(registry.clone(), store.clone()));
    let settings = Arc::new(SettingsService::new(store.clone(), events.sender()));

    let api_token_hash = token_hash("API_TOKEN", "API bearer-token auth");
    let admin_token_hash = token_hash("ADMIN_TOKEN", "admin bearer-token auth");

    Ok(AppState {
        config,
        store,
        sessions,
        registry,
        dispatcher,
        models_cache,
        settings,
        events,
        api_token_hash,
        admin_token_hash,
        started_at: std::time::Instant::now(),
        last_session_sweep_ms: Arc::new(AtomicI64::new(0)),
    })
}

fn token_hash(env_var: &str, label: &str) -> Option<Vec<u8>> {
    match std::env::var(env_var) {
        Ok(token) if !token.is_empty() => {
            tracing::info!("{label} enabled");
            Some(Sha256::digest(token.as_bytes()).to_vec())
        }
        _ => {
            tracing::warn!("{label} DISABLED — set {env_var} to enable");
            None
        }
    }
}

/// Spawns the session-sweep timer and wires its `GatewayEvent` publications
/// through to the aggregated model-listing cache.
pub fn spawn_background_tasks(state: &AppState) {
    let sessions = Arc::new(state.sessions.clone());
    let interval = std::time::Duration::from_millis(state.config.session.cleanup_interval_ms);
    sessions.spawn_sweeper(interval, state.events.sender());
    tracing::info!(interval_ms = state.config.session.cleanup_interval_ms, "session sweeper started");

    // Model listing is invalidated primarily by provider/model lifecycle
    // events; the cache's own TTL is only a backstop for missed ones.
    let models_cache = state.models_cache.clone();
    let last_sweep = state.last_session_sweep_ms.clone();
    let mut rx = state.events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                GatewayEvent::Lifecycle { .. } | GatewayEvent::ProvidersUpdated | GatewayEvent::ModelsUpdated => {
                    models_cache.invalidate();
                }
                GatewayEvent::SessionSwept { .. } => {
                    last_sweep.store(gw_store::now_ms(), Ordering::Relaxed);
                }
                _ => {}
            }
        }
    });
}
