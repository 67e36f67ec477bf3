use gw_domain::config::Config;

/// `--dry-run` lists pending migrations without applying them; the apply
/// path opens a raw pool (not `Store::open`) so it doesn't also clear the
/// session table — that side effect belongs to server boot, not this
/// command.
pub async fn run(config: &Config, dry_run: bool) -> anyhow::Result<()> {
    let pool = gw_store::connect_raw(&config.db_path).await?;
    let migrator = gw_store::migrator();

    if dry_run {
        let applied: Vec<i64> = sqlx::query_as("SELECT version FROM _sqlx_migrations")
            .fetch_all(&pool)
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|(v,): (i64,)| v)
            .collect();

        let pending: Vec<_> = migrator
            .iter()
            .filter(|m| !applied.contains(&m.version))
            .collect();

        if pending.is_empty() {
            println!("up to date, no pending migrations");
        } else {
            println!("{} pending migration(s):", pending.len());
            for m in pending {
                println!("  {:>4}  {}", m.version, m.description);
            }
        }
        return Ok(());
    }

    migrator.run(&pool).await.map_err(|e| anyhow::anyhow!("migration failed: {e}"))?;
    println!("migrations applied");
    Ok(())
}
