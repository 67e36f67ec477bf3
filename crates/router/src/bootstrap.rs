//! Assembles the shared `Factory` used by the registry. `gw-providers`
//! ships `openai`/`local_openai`; the `qwen_web` constructor is registered
//! here, the one place allowed to depend on both `gw-providers` and
//! `gw-qwen`, keeping the dependency graph acyclic.

use std::sync::Arc;

use gw_domain::event::GatewayEvent;
use gw_domain::models::ProviderType;
use gw_providers::{Factory, Provider};
use gw_qwen::QwenWebProvider;
use gw_sessions::SessionManager;
use gw_store::Store;
use tokio::sync::broadcast;

pub fn build_factory(store: Store, sessions: SessionManager, events: broadcast::Sender<GatewayEvent>) -> Factory {
    let mut factory = Factory::with_builtins();
    factory.register(
        ProviderType::QwenWeb,
        Arc::new(move |id, config| {
            QwenWebProvider::new(id, config, store.clone(), sessions.clone(), events.clone())
                .map(|p| Arc::new(p) as Arc<dyn Provider>)
        }),
    );
    factory
}
