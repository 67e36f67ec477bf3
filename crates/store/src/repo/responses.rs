use gw_domain::error::Result;
use gw_domain::models::Response;
use sqlx::{Row, SqlitePool};

pub struct ResponseRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ResponseRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserted on terminal state (success, error, or cancellation) — a
    /// request may have zero or one of these.
    pub async fn create(&self, r: &Response) -> Result<i64> {
        let qwen_response = r
            .qwen_response
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let openai_response = serde_json::to_string(&r.openai_response)?;
        let result = sqlx::query(
            "INSERT INTO responses (response_id, request_id, session_id, qwen_response, openai_response, parent_id,
                                     prompt_tokens, completion_tokens, total_tokens, finish_reason, error, duration_ms, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&r.response_id)
        .bind(r.request_id)
        .bind(&r.session_id)
        .bind(qwen_response)
        .bind(openai_response)
        .bind(&r.parent_id)
        .bind(r.prompt_tokens)
        .bind(r.completion_tokens)
        .bind(r.total_tokens)
        .bind(&r.finish_reason)
        .bind(&r.error)
        .bind(r.duration_ms)
        .bind(r.timestamp)
        .execute(self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_request_id(&self, request_id: i64) -> Result<Option<Response>> {
        let row = sqlx::query("SELECT * FROM responses WHERE request_id = ?")
            .bind(request_id)
            .fetch_optional(self.pool)
            .await?;
        row.as_ref().map(row_to_response).transpose()
    }

    pub async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<Response>> {
        let rows = sqlx::query("SELECT * FROM responses ORDER BY timestamp DESC LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;
        rows.iter().map(row_to_response).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM responses")
            .fetch_one(self.pool)
            .await?;
        Ok(row.0)
    }
}

fn row_to_response(row: &sqlx::sqlite::SqliteRow) -> Result<Response> {
    let qwen_response_raw: Option<String> = row.try_get("qwen_response")?;
    let openai_response_raw: String = row.try_get("openai_response")?;
    Ok(Response {
        id: row.try_get("id")?,
        response_id: row.try_get("response_id")?,
        request_id: row.try_get("request_id")?,
        session_id: row.try_get("session_id")?,
        qwen_response: qwen_response_raw
            .map(|s| serde_json::from_str(&s))
            .transpose()?,
        openai_response: serde_json::from_str(&openai_response_raw)?,
        parent_id: row.try_get("parent_id")?,
        prompt_tokens: row.try_get("prompt_tokens")?,
        completion_tokens: row.try_get("completion_tokens")?,
        total_tokens: row.try_get("total_tokens")?,
        finish_reason: row.try_get("finish_reason")?,
        error: row.try_get("error")?,
        duration_ms: row.try_get("duration_ms")?,
        timestamp: row.try_get("timestamp")?,
    })
}
