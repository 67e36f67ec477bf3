use gw_domain::error::Result;
use gw_domain::models::{ErrorRecord, ErrorSeverity};
use sqlx::{Row, SqlitePool};

pub struct ErrorRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ErrorRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, e: &ErrorRecord) -> Result<()> {
        let payload = e.payload.as_ref().map(serde_json::to_string).transpose()?;
        sqlx::query(
            "INSERT INTO error_records (error_id, error_type, severity, session_id, request_id, payload, resolved, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&e.error_id)
        .bind(&e.error_type)
        .bind(severity_str(e.severity))
        .bind(&e.session_id)
        .bind(e.request_id)
        .bind(payload)
        .bind(e.resolved)
        .bind(e.created_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<ErrorRecord>> {
        let rows = sqlx::query("SELECT * FROM error_records ORDER BY created_at DESC LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;
        rows.iter().map(row_to_error).collect()
    }
}

fn severity_str(s: ErrorSeverity) -> &'static str {
    match s {
        ErrorSeverity::Info => "info",
        ErrorSeverity::Warn => "warn",
        ErrorSeverity::Error => "error",
        ErrorSeverity::Fatal => "fatal",
    }
}

fn row_to_error(row: &sqlx::sqlite::SqliteRow) -> Result<ErrorRecord> {
    let severity_raw: String = row.try_get("severity")?;
    let severity = match severity_raw.as_str() {
        "info" => ErrorSeverity::Info,
        "warn" => ErrorSeverity::Warn,
        "fatal" => ErrorSeverity::Fatal,
        _ => ErrorSeverity::Error,
    };
    let payload_raw: Option<String> = row.try_get("payload")?;
    Ok(ErrorRecord {
        error_id: row.try_get("error_id")?,
        error_type: row.try_get("error_type")?,
        severity,
        session_id: row.try_get("session_id")?,
        request_id: row.try_get("request_id")?,
        payload: payload_raw.map(|s| serde_json::from_str(&s)).transpose()?,
        resolved: row.try_get("resolved")?,
        created_at: row.try_get("created_at")?,
    })
}
