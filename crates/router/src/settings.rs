//! Settings sync: defaults -> environment -> store, store always wins.

use std::collections::HashMap;
use std::env;

use gw_domain::error::Result;
use gw_domain::event::GatewayEvent;
use gw_domain::models::SettingValue;
use gw_store::repo::settings::RECOGNISED_KEYS;
use gw_store::Store;
use tokio::sync::broadcast;

/// Keys that only take effect at bind time; changing them needs a restart.
const RESTART_REQUIRED_KEYS: &[&str] = &["server.port", "server.host"];

fn default_value(key: &str) -> Option<SettingValue> {
    match key {
        "server.port" => Some(SettingValue::Int(8080)),
        "server.host" => Some(SettingValue::String("0.0.0.0".into())),
        "server.timeout" => Some(SettingValue::Int(30_000)),
        "logging.level" => Some(SettingValue::String("info".into())),
        "logging.logRequests" => Some(SettingValue::Bool(true)),
        "logging.logResponses" => Some(SettingValue::Bool(false)),
        "system.autoStart" => Some(SettingValue::Bool(false)),
        _ => None,
    }
}

fn env_var_for(key: &str) -> Option<&'static str> {
    match key {
        "server.port" => Some("SERVER_PORT"),
        "server.host" => Some("SERVER_HOST"),
        "logging.level" => Some("LOG_LEVEL"),
        _ => None,
    }
}

fn coerce(key: &str, raw: &str) -> SettingValue {
    match default_value(key) {
        Some(SettingValue::Int(_)) => raw.parse().map(SettingValue::Int).unwrap_or_else(|_| SettingValue::String(raw.to_string())),
        Some(SettingValue::Bool(_)) => raw.parse().map(SettingValue::Bool).unwrap_or_else(|_| SettingValue::String(raw.to_string())),
        Some(SettingValue::Float(_)) => raw.parse().map(SettingValue::Float).unwrap_or_else(|_| SettingValue::String(raw.to_string())),
        _ => SettingValue::String(raw.to_string()),
    }
}

pub struct SettingsService {
    store: Store,
    events: broadcast::Sender<GatewayEvent>,
}

impl SettingsService {
    pub fn new(store: Store, events: broadcast::Sender<GatewayEvent>) -> Self {
        Self { store, events }
    }

    /// Merges defaults -> environment -> store for one recognised key.
    pub async fn effective(&self, key: &str) -> Result<Option<SettingValue>> {
        if let Some(row) = self.store.settings().get(key).await? {
            return Ok(Some(row.value));
        }
        if let Some(var) = env_var_for(key) {
            if let Ok(raw) = env::var(var) {
                return Ok(Some(coerce(key, &raw)));
            }
        }
        Ok(default_value(key))
    }

    pub async fn boot_snapshot(&self) -> Result<HashMap<String, SettingValue>> {
        let mut out = HashMap::new();
        for key in RECOGNISED_KEYS {
            if let Some(v) = self.effective(key).await? {
                out.insert((*key).to_string(), v);
            }
        }
        Ok(out)
    }

    /// Writes through, notifies subscribers, and reports whether a restart
    /// is needed for the change to take effect.
    pub async fn update(&self, key: &str, value: SettingValue, now: i64) -> Result<bool> {
        self.store.settings().set(key, &value, now).await?;
        let requires_restart = RESTART_REQUIRED_KEYS.contains(&key);
        self.events
            .send(GatewayEvent::SettingsChanged { key: key.to_string(), requires_restart })
            .ok();
        Ok(requires_restart)
    }
}
