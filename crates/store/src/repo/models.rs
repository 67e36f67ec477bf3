use gw_domain::capability::CapabilitySet;
use gw_domain::error::{Error, Result};
use gw_domain::models::{Model, ProviderModel};
use sqlx::{Row, SqlitePool};

pub struct ModelRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ModelRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, m: &Model) -> Result<()> {
        let caps = serde_json::to_string(&m.capabilities)?;
        sqlx::query(
            "INSERT INTO models (id, name, description, capabilities) VALUES (?, ?, ?, ?)",
        )
        .bind(&m.id)
        .bind(&m.name)
        .bind(&m.description)
        .bind(caps)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Model> {
        let row = sqlx::query("SELECT * FROM models WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("model {id}")))?;
        row_to_model(&row)
    }

    pub async fn find_all(&self) -> Result<Vec<Model>> {
        let rows = sqlx::query("SELECT * FROM models ORDER BY id ASC")
            .fetch_all(self.pool)
            .await?;
        rows.iter().map(row_to_model).collect()
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM models WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("model {id}")));
        }
        Ok(())
    }

    /// Links `model_id` to `provider_id`. Flipping `is_default` happens
    /// inside one transaction so at most one default survives per provider.
    pub async fn link(&self, link: &ProviderModel) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        if link.is_default {
            sqlx::query("UPDATE provider_models SET is_default = 0 WHERE provider_id = ?")
                .bind(&link.provider_id)
                .execute(&mut *tx)
                .await?;
        }
        let config = link
            .config
            .as_ref()
            .map(|v| serde_json::to_string(v))
            .transpose()?;
        sqlx::query(
            "INSERT INTO provider_models (provider_id, model_id, is_default, config) VALUES (?, ?, ?, ?)
             ON CONFLICT(provider_id, model_id) DO UPDATE SET is_default = excluded.is_default, config = excluded.config",
        )
        .bind(&link.provider_id)
        .bind(&link.model_id)
        .bind(link.is_default)
        .bind(config)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn unlink(&self, provider_id: &str, model_id: &str) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM provider_models WHERE provider_id = ? AND model_id = ?",
        )
        .bind(provider_id)
        .bind(model_id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "link {provider_id}/{model_id}"
            )));
        }
        Ok(())
    }

    pub async fn links_for_provider(&self, provider_id: &str) -> Result<Vec<ProviderModel>> {
        let rows = sqlx::query("SELECT * FROM provider_models WHERE provider_id = ?")
            .bind(provider_id)
            .fetch_all(self.pool)
            .await?;
        rows.iter().map(row_to_link).collect()
    }

    pub async fn default_model_for_provider(&self, provider_id: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            "SELECT model_id FROM provider_models WHERE provider_id = ? AND is_default = 1",
        )
        .bind(provider_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|r| r.try_get::<String, _>("model_id")).transpose()?)
    }

    pub async fn is_model_linked(&self, provider_id: &str, model_id: &str) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM provider_models WHERE provider_id = ? AND model_id = ?",
        )
        .bind(provider_id)
        .bind(model_id)
        .fetch_one(self.pool)
        .await?;
        Ok(row.0 > 0)
    }
}

fn row_to_model(row: &sqlx::sqlite::SqliteRow) -> Result<Model> {
    let caps_raw: String = row.try_get("capabilities")?;
    let capabilities: CapabilitySet = serde_json::from_str(&caps_raw)?;
    Ok(Model {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        capabilities,
    })
}

fn row_to_link(row: &sqlx::sqlite::SqliteRow) -> Result<ProviderModel> {
    let config_raw: Option<String> = row.try_get("config")?;
    let config = config_raw.map(|s| serde_json::from_str(&s)).transpose()?;
    Ok(ProviderModel {
        provider_id: row.try_get("provider_id")?,
        model_id: row.try_get("model_id")?,
        is_default: row.try_get("is_default")?,
        config,
    })
}
