//! Maps a provider `type` to a constructor. `openai` and `local_openai` are
//! built in; `qwen_web` is registered at boot by the binary that links
//! `gw-qwen`, so this crate never depends on it.

use std::collections::HashMap;
use std::sync::Arc;

use gw_domain::error::{Error, Result};
use gw_domain::models::{ConfigValue, ProviderType};

use crate::local_openai;
use crate::openai_passthrough::OpenAiShapedProvider;
use crate::traits::Provider;

pub type Constructor =
    Arc<dyn Fn(&str, &HashMap<String, ConfigValue>) -> Result<Arc<dyn Provider>> + Send + Sync>;

#[derive(Clone)]
pub struct Factory {
    constructors: HashMap<ProviderType, Constructor>,
}

impl Factory {
    pub fn new() -> Self {
        Self { constructors: HashMap::new() }
    }

    /// `openai` and `local_openai` preregistered; `qwen_web` is not.
    pub fn with_builtins() -> Self {
        let mut f = Self::new();
        f.register(ProviderType::Openai, Arc::new(|id, cfg| {
            OpenAiShapedProvider::from_config(id, cfg, true)
                .map(|p| Arc::new(p) as Arc<dyn Provider>)
        }));
        f.register(ProviderType::LocalOpenai, Arc::new(|id, cfg| {
            local_openai::from_config(id, cfg).map(|p| Arc::new(p) as Arc<dyn Provider>)
        }));
        f
    }

    pub fn register(&mut self, kind: ProviderType, ctor: Constructor) {
        self.constructors.insert(kind, ctor);
    }

    /// Validates `required_config` is fully present before invoking the
    /// constructor, so every factory-produced provider is guaranteed
    /// config-complete.
    pub fn construct(
        &self,
        kind: ProviderType,
        id: &str,
        config: &HashMap<String, ConfigValue>,
    ) -> Result<Arc<dyn Provider>> {
        for key in kind.required_config() {
            if !config.contains_key(*key) {
                return Err(Error::Validation(format!(
                    "provider {id} ({}): missing required config key '{key}'",
                    kind.as_str()
                )));
            }
        }
        let ctor = self.constructors.get(&kind).ok_or_else(|| {
            Error::Validation(format!("no constructor registered for provider type {}", kind.as_str()))
        })?;
        ctor(id, config)
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::with_builtins()
    }
}
