use gw_domain::error::{Error, Result};
use gw_domain::models::{ConfigValue, Provider, ProviderConfig, ProviderType};
use sqlx::{Row, SqlitePool};

pub struct ProviderRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProviderRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, p: &Provider) -> Result<()> {
        sqlx::query(
            "INSERT INTO providers (id, name, type, enabled, priority, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&p.id)
        .bind(&p.name)
        .bind(p.kind.as_str())
        .bind(p.enabled)
        .bind(p.priority)
        .bind(&p.description)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict(format!("provider id or name already exists: {e}"))
            }
            _ => Error::from(e),
        })?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Provider> {
        let row = sqlx::query("SELECT * FROM providers WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("provider {id}")))?;
        Ok(row_to_provider(&row)?)
    }

    pub async fn find_all(&self, only_enabled: bool) -> Result<Vec<Provider>> {
        let sql = if only_enabled {
            "SELECT * FROM providers WHERE enabled = 1 ORDER BY priority DESC, id ASC"
        } else {
            "SELECT * FROM providers ORDER BY priority DESC, id ASC"
        };
        let rows = sqlx::query(sql).fetch_all(self.pool).await?;
        rows.iter().map(row_to_provider).collect()
    }

    pub async fn update(&self, p: &Provider) -> Result<()> {
        let result = sqlx::query(
            "UPDATE providers SET name = ?, type = ?, enabled = ?, priority = ?, description = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&p.name)
        .bind(p.kind.as_str())
        .bind(p.enabled)
        .bind(p.priority)
        .bind(&p.description)
        .bind(p.updated_at)
        .bind(&p.id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("provider {}", p.id)));
        }
        Ok(())
    }

    /// Deletes the provider; `ON DELETE CASCADE` removes its configs and
    /// model links. Request/response rows are untouched (they key off
    /// `session_id`, not `provider_id`).
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM providers WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("provider {id}")));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM providers")
            .fetch_one(self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn get_configs(&self, provider_id: &str) -> Result<Vec<ProviderConfig>> {
        let rows = sqlx::query("SELECT * FROM provider_configs WHERE provider_id = ?")
            .bind(provider_id)
            .fetch_all(self.pool)
            .await?;
        rows.iter().map(row_to_provider_config).collect()
    }

    pub async fn set_config(&self, cfg: &ProviderConfig) -> Result<()> {
        let value = serde_json::to_string(&cfg.value)?;
        sqlx::query(
            "INSERT INTO provider_configs (provider_id, key, value, is_sensitive) VALUES (?, ?, ?, ?)
             ON CONFLICT(provider_id, key) DO UPDATE SET value = excluded.value, is_sensitive = excluded.is_sensitive",
        )
        .bind(&cfg.provider_id)
        .bind(&cfg.key)
        .bind(value)
        .bind(cfg.is_sensitive)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_provider(row: &sqlx::sqlite::SqliteRow) -> Result<Provider> {
    let type_str: String = row.try_get("type")?;
    let kind = ProviderType::parse(&type_str)
        .ok_or_else(|| Error::Internal(format!("unknown provider type in store: {type_str}")))?;
    Ok(Provider {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kind,
        enabled: row.try_get("enabled")?,
        priority: row.try_get("priority")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_provider_config(row: &sqlx::sqlite::SqliteRow) -> Result<ProviderConfig> {
    let raw: String = row.try_get("value")?;
    let value: ConfigValue = serde_json::from_str(&raw)?;
    Ok(ProviderConfig {
        provider_id: row.try_get("provider_id")?,
        key: row.try_get("key")?,
        value,
        is_sensitive: row.try_get("is_sensitive")?,
    })
}
