use std::collections::HashMap;

use clap::Subcommand;
use gw_domain::models::{ConfigValue, Provider, ProviderConfig, ProviderType, SettingValue};
use gw_store::{now_ms, Store};

#[derive(Debug, Subcommand)]
pub enum ProviderCommand {
    /// Register a new provider.
    Add {
        id: String,
        #[arg(long)]
        name: String,
        /// openai | local_openai | qwen_web
        #[arg(long = "type")]
        kind: String,
        #[arg(long, default_value_t = 0)]
        priority: i64,
        #[arg(long)]
        description: Option<String>,
        /// Repeatable `key=value` config pair, stored in plain view.
        #[arg(long = "config", value_parser = parse_kv)]
        config: Vec<(String, String)>,
        /// Repeatable `key=value` config pair, redacted on any read path.
        #[arg(long = "secret", value_parser = parse_kv)]
        secret: Vec<(String, String)>,
    },
    /// List every registered provider.
    List,
    /// Change mutable fields on an existing provider.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        priority: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    Enable { id: String },
    Disable { id: String },
    Remove { id: String },
    /// Construct the provider standalone and run its health check.
    Test { id: String },
}

fn parse_kv(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{s}`"))
}

pub async fn run(store: &Store, cmd: ProviderCommand) -> anyhow::Result<()> {
    match cmd {
        ProviderCommand::Add { id, name, kind, priority, description, config, secret } => {
            let kind = ProviderType::parse(&kind)
                .ok_or_else(|| anyhow::anyhow!("unknown provider type '{kind}' (want openai, local_openai, or qwen_web)"))?;
            let now = now_ms();
            store
                .providers()
                .create(&Provider { id: id.clone(), name, kind, enabled: true, priority, description, created_at: now, updated_at: now })
                .await?;
            for (key, value) in config {
                store.providers().set_config(&ProviderConfig { provider_id: id.clone(), key, value: ConfigValue::String(value), is_sensitive: false }).await?;
            }
            for (key, value) in secret {
                store.providers().set_config(&ProviderConfig { provider_id: id.clone(), key, value: ConfigValue::String(value), is_sensitive: true }).await?;
            }
            println!("provider '{id}' added");
        }
        ProviderCommand::List => {
            for p in store.providers().find_all(false).await? {
                println!(
                    "{:<20} {:<12} {:<9} priority={:<4} {}",
                    p.id,
                    p.kind.as_str(),
                    if p.enabled { "enabled" } else { "disabled" },
                    p.priority,
                    p.description.unwrap_or_default(),
                );
            }
        }
        ProviderCommand::Edit { id, name, priority, description } => {
            let mut p = store.providers().get(&id).await?;
            if let Some(n) = name {
                p.name = n;
            }
            if let Some(pr) = priority {
                p.priority = pr;
            }
            if let Some(d) = description {
                p.description = Some(d);
            }
            p.updated_at = now_ms();
            store.providers().update(&p).await?;
            println!("provider '{id}' updated");
        }
        ProviderCommand::Enable { id } => set_enabled(store, &id, true).await?,
        ProviderCommand::Disable { id } => set_enabled(store, &id, false).await?,
        ProviderCommand::Remove { id } => {
            store.providers().delete(&id).await?;
            println!("provider '{id}' removed");
        }
        ProviderCommand::Test { id } => test(store, &id).await?,
    }
    Ok(())
}

async fn set_enabled(store: &Store, id: &str, enabled: bool) -> anyhow::Result<()> {
    let mut p = store.providers().get(id).await?;
    p.enabled = enabled;
    p.updated_at = now_ms();
    store.providers().update(&p).await?;
    println!("provider '{id}' {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

/// Builds a provider instance outside the registry (no lifecycle event, no
/// caching) purely to exercise its `health_check`. Uses the same factory the
/// server boots with, so `qwen_web` is testable from the CLI too.
async fn test(store: &Store, id: &str) -> anyhow::Result<()> {
    let p = store.providers().get(id).await?;
    let configs = store.providers().get_configs(id).await?;
    let config: HashMap<String, ConfigValue> = configs.into_iter().map(|c| (c.key, c.value)).collect();

    let sessions = gw_sessions::SessionManager::new(store.clone(), 30 * 60 * 1000);
    let (tx, _rx) = tokio::sync::broadcast::channel(16);
    let factory = gw_router::build_factory(store.clone(), sessions, tx);

    let provider = factory.construct(p.kind, id, &config)?;
    let health = provider.health_check().await?;
    if health.healthy {
        println!(
            "ok{}{}",
            health.latency_ms.map(|ms| format!(" ({ms}ms)")).unwrap_or_default(),
            health.message.map(|m| format!(": {m}")).unwrap_or_default(),
        );
        Ok(())
    } else {
        anyhow::bail!("unhealthy{}", health.message.map(|m| format!(": {m}")).unwrap_or_default())
    }
}

pub async fn set_active(store: &Store, provider_id: &str) -> anyhow::Result<()> {
    store.providers().get(provider_id).await?;
    store
        .settings()
        .set("active_provider", &SettingValue::String(provider_id.to_string()), now_ms())
        .await?;
    println!("active provider set to '{provider_id}'");
    Ok(())
}
