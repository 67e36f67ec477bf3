use gw_domain::error::Result;
use gw_domain::models::Credential;
use sqlx::{Row, SqlitePool};

pub struct CredentialRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CredentialRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_current(&self, backend: &str) -> Result<Option<Credential>> {
        let row = sqlx::query("SELECT * FROM credentials WHERE backend = ?")
            .bind(backend)
            .fetch_optional(self.pool)
            .await?;
        row.as_ref().map(row_to_credential).transpose()
    }

    pub async fn upsert(&self, backend: &str, bearer_token: &str, cookie_jar: &str, expires_at: Option<i64>, now: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO credentials (backend, bearer_token, cookie_jar, expires_at, stale, updated_at)
             VALUES (?, ?, ?, ?, 0, ?)
             ON CONFLICT(backend) DO UPDATE SET
                bearer_token = excluded.bearer_token, cookie_jar = excluded.cookie_jar,
                expires_at = excluded.expires_at, stale = 0, updated_at = excluded.updated_at",
        )
        .bind(backend)
        .bind(bearer_token)
        .bind(cookie_jar)
        .bind(expires_at)
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Marks the credential stale without deleting it — the extension will
    /// overwrite it with a fresh upsert.
    pub async fn mark_stale(&self, backend: &str, now: i64) -> Result<()> {
        sqlx::query("UPDATE credentials SET stale = 1, updated_at = ? WHERE backend = ?")
            .bind(now)
            .bind(backend)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_credential(row: &sqlx::sqlite::SqliteRow) -> Result<Credential> {
    Ok(Credential {
        backend: row.try_get("backend")?,
        bearer_token: row.try_get("bearer_token")?,
        cookie_jar: row.try_get("cookie_jar")?,
        expires_at: row.try_get("expires_at")?,
        stale: row.try_get("stale")?,
        updated_at: row.try_get("updated_at")?,
    })
}
