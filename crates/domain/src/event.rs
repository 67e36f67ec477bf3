use serde::Serialize;

/// Events broadcast over the in-process status/event bus. Delivery is
/// best-effort: the bus is a thin wrapper over `tokio::sync::broadcast`, so a
/// lagging or absent subscriber simply misses events rather than blocking
/// the publisher.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum GatewayEvent {
    #[serde(rename = "lifecycle:update")]
    Lifecycle {
        provider_id: String,
        state: LifecycleState,
        message: Option<String>,
    },
    #[serde(rename = "settings:changed")]
    SettingsChanged { key: String, requires_restart: bool },
    #[serde(rename = "credentials:updated")]
    CredentialsUpdated { backend: String },
    #[serde(rename = "credentials:invalid")]
    CredentialsInvalid { backend: String },
    #[serde(rename = "session:swept")]
    SessionSwept { count: usize },
    #[serde(rename = "providers:updated")]
    ProvidersUpdated,
    #[serde(rename = "models:updated")]
    ModelsUpdated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Loaded,
    Reloaded,
    Unloaded,
    Failed,
}
