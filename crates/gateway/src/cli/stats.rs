use gw_domain::config::Config;
use gw_store::Store;

pub async fn run(store: &Store) -> anyhow::Result<()> {
    println!("providers: {}", store.providers().count().await?);
    println!("requests:  {}", store.requests().count().await?);
    println!("responses: {}", store.responses().count().await?);
    Ok(())
}

pub async fn status(store: &Store, config: &Config) -> anyhow::Result<()> {
    println!("db: {}", config.db_path);
    println!("listen: {}:{}", config.server.host, config.server.port);
    let active = store.settings().get("active_provider").await?;
    println!("active provider: {}", active.and_then(|s| s.value.as_str().map(str::to_string)).unwrap_or_else(|| "(none)".into()));

    let providers = store.providers().find_all(false).await?;
    println!("providers ({}):", providers.len());
    for p in providers {
        println!(
            "  {:<20} {:<12} {} priority={}",
            p.id,
            p.kind.as_str(),
            if p.enabled { "enabled" } else { "disabled" },
            p.priority,
        );
    }
    Ok(())
}
