use gw_domain::error::{Error, Result};
use gw_domain::models::Request;
use sqlx::{Row, SqlitePool};

pub struct RequestRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RequestRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserted before any upstream call is attempted; the row never mutates
    /// thereafter. Returns the autoincrement id for the paired `Response`.
    pub async fn create(&self, r: &Request) -> Result<i64> {
        let openai_request = serde_json::to_string(&r.openai_request)?;
        let qwen_request = r
            .qwen_request
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let result = sqlx::query(
            "INSERT INTO requests (request_id, session_id, provider_id, openai_request, qwen_request, model, stream, method, path, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&r.request_id)
        .bind(&r.session_id)
        .bind(&r.provider_id)
        .bind(openai_request)
        .bind(qwen_request)
        .bind(&r.model)
        .bind(r.stream)
        .bind(&r.method)
        .bind(&r.path)
        .bind(r.timestamp)
        .execute(self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get(&self, id: i64) -> Result<Request> {
        let row = sqlx::query("SELECT * FROM requests WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("request {id}")))?;
        row_to_request(&row)
    }

    pub async fn find_all(&self, provider_id: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Request>> {
        let rows = if let Some(pid) = provider_id {
            sqlx::query(
                "SELECT * FROM requests WHERE provider_id = ? ORDER BY timestamp DESC LIMIT ? OFFSET ?",
            )
            .bind(pid)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?
        } else {
            sqlx::query("SELECT * FROM requests ORDER BY timestamp DESC LIMIT ? OFFSET ?")
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
        };
        rows.iter().map(row_to_request).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM requests")
            .fetch_one(self.pool)
            .await?;
        Ok(row.0)
    }
}

fn row_to_request(row: &sqlx::sqlite::SqliteRow) -> Result<Request> {
    let openai_request_raw: String = row.try_get("openai_request")?;
    let qwen_request_raw: Option<String> = row.try_get("qwen_request")?;
    Ok(Request {
        id: row.try_get("id")?,
        request_id: row.try_get("request_id")?,
        session_id: row.try_get("session_id")?,
        provider_id: row.try_get("provider_id")?,
        openai_request: serde_json::from_str(&openai_request_raw)?,
        qwen_request: qwen_request_raw
            .map(|s| serde_json::from_str(&s))
            .transpose()?,
        model: row.try_get("model")?,
        stream: row.try_get("stream")?,
        method: row.try_get("method")?,
        path: row.try_get("path")?,
        timestamp: row.try_get("timestamp")?,
    })
}
