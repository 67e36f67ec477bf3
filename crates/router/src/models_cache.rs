//! Aggregated model-listing cache: union, across enabled providers, of
//! `list_models()` (where supported) and linked models. A generation-checked
//! invalidate() is the primary path; the TTL is a backstop for missed events.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gw_domain::error::Result;
use gw_providers::{Provider, Registry};
use gw_store::Store;
use parking_lot::RwLock;

const DEFAULT_TTL: Duration = Duration::from_secs(30);

pub struct ModelsCache {
    registry: Arc<Registry>,
    store: Store,
    ttl: Duration,
    cached: RwLock<Option<(Instant, Vec<String>)>>,
}

impl ModelsCache {
    pub fn new(registry: Arc<Registry>, store: Store) -> Self {
        Self { registry, store, ttl: DEFAULT_TTL, cached: RwLock::new(None) }
    }

    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        if let Some((fetched_at, models)) = self.cached.read().clone() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(models);
            }
        }

        let mut models = Vec::new();
        for id in self.registry.ids() {
            let provider = match self.registry.get(&id) {
                Ok(p) => p,
                Err(_) => continue,
            };
            if let Some(listed) = provider.list_models().await? {
                models.extend(listed);
            }
            for link in self.store.models().links_for_provider(&id).await? {
                models.push(link.model_id);
            }
        }
        models.sort();
        models.dedup();

        *self.cached.write() = Some((Instant::now(), models.clone()));
        Ok(models)
    }
}
