use gw_domain::error::Result;
use gw_domain::models::{Setting, SettingValue};
use sqlx::{Row, SqlitePool};

/// Recognised setting keys (unrecognised keys are accepted but ignored by
/// the router — see the settings-sync component).
pub const RECOGNISED_KEYS: &[&str] = &[
    "active_provider",
    "active_model",
    "server.port",
    "server.host",
    "server.timeout",
    "logging.level",
    "logging.logRequests",
    "logging.logResponses",
    "system.autoStart",
];

pub struct SettingRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SettingRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Setting>> {
        let row = sqlx::query("SELECT * FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        row.as_ref().map(row_to_setting).transpose()
    }

    pub async fn find_all(&self) -> Result<Vec<Setting>> {
        let rows = sqlx::query("SELECT * FROM settings ORDER BY key ASC")
            .fetch_all(self.pool)
            .await?;
        rows.iter().map(row_to_setting).collect()
    }

    pub async fn set(&self, key: &str, value: &SettingValue, now: i64) -> Result<()> {
        let (raw, value_type) = encode(value);
        sqlx::query(
            "INSERT INTO settings (key, value, value_type, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, value_type = excluded.value_type, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(raw)
        .bind(value_type)
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

fn encode(value: &SettingValue) -> (String, &'static str) {
    match value {
        SettingValue::String(s) => (s.clone(), "string"),
        SettingValue::Int(i) => (i.to_string(), "int"),
        SettingValue::Bool(b) => (b.to_string(), "bool"),
        SettingValue::Float(f) => (f.to_string(), "float"),
    }
}

fn row_to_setting(row: &sqlx::sqlite::SqliteRow) -> Result<Setting> {
    let raw: String = row.try_get("value")?;
    let value_type: String = row.try_get("value_type")?;
    let value = match value_type.as_str() {
        "int" => SettingValue::Int(raw.parse().unwrap_or_default()),
        "bool" => SettingValue::Bool(raw.parse().unwrap_or_default()),
        "float" => SettingValue::Float(raw.parse().unwrap_or_default()),
        _ => SettingValue::String(raw),
    };
    Ok(Setting {
        key: row.try_get("key")?,
        value,
        updated_at: row.try_get("updated_at")?,
    })
}
