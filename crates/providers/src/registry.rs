//! Process-wide map of live provider instances, built from store rows.
//!
//! Guarded by one `parking_lot::RwLock`; `reload` holds the write guard
//! across unload-then-load so observers never see the id absent mid-reload.

use std::collections::HashMap;
use std::sync::Arc;

use gw_domain::error::{Error, Result};
use gw_domain::event::{GatewayEvent, LifecycleState};
use gw_domain::models::ConfigValue;
use gw_store::Store;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::factory::Factory;
use crate::traits::Provider;

pub struct Registry {
    store: Store,
    factory: Factory,
    events: broadcast::Sender<GatewayEvent>,
    providers: RwLock<HashMap<String, Arc<dyn Provider>>>,
}

impl Registry {
    pub fn new(store: Store, factory: Factory, events: broadcast::Sender<GatewayEvent>) -> Self {
        Self { store, factory, events, providers: RwLock::new(HashMap::new()) }
    }

    fn publish(&self, provider_id: &str, state: LifecycleState, message: Option<String>) {
        let _ = self.events.send(GatewayEvent::Lifecycle {
            provider_id: provider_id.to_string(),
            state,
            message,
        });
    }

    async fn build(&self, id: &str) -> Result<Arc<dyn Provider>> {
        let row = self.store.providers().get(id).await?;
        let configs = self.store.providers().get_configs(id).await?;
        let config_map: HashMap<String, ConfigValue> =
            configs.into_iter().map(|c| (c.key, c.value)).collect();
        self.factory.construct(row.kind, id, &config_map)
    }

    /// Reads row + configs from the store, constructs, and inserts into the
    /// map (replacing any prior instance, which is simply dropped).
    pub async fn load(&self, id: &str) -> Result<()> {
        match self.build(id).await {
            Ok(provider) => {
                self.providers.write().insert(id.to_string(), provider);
                self.publish(id, LifecycleState::Loaded, None);
                Ok(())
            }
            Err(e) => {
                self.publish(id, LifecycleState::Failed, Some(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn unload(&self, id: &str) {
        self.providers.write().remove(id);
        self.publish(id, LifecycleState::Unloaded, None);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("provider {id} not loaded")))
    }

    /// Holds the write guard across unload-then-load so an external reader
    /// never observes the id absent mid-reload.
    pub async fn reload(&self, id: &str) -> Result<()> {
        let built = self.build(id).await;
        let mut guard = self.providers.write();
        match built {
            Ok(provider) => {
                guard.insert(id.to_string(), provider);
                drop(guard);
                self.publish(id, LifecycleState::Reloaded, None);
                Ok(())
            }
            Err(e) => {
                guard.remove(id);
                drop(guard);
                self.publish(id, LifecycleState::Failed, Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Loads every enabled provider at boot. A per-provider failure is
    /// logged and skipped; it never aborts boot.
    pub async fn load_all(&self) -> Result<()> {
        let rows = self.store.providers().find_all(true).await?;
        for row in rows {
            if let Err(e) = self.load(&row.id).await {
                tracing::warn!(provider_id = %row.id, error = %e, "provider failed to load at boot");
            }
        }
        Ok(())
    }

    pub fn ids(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}
