use gw_domain::error::Result;
use gw_domain::models::Session;
use sqlx::{Row, SqlitePool};

pub struct SessionRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SessionRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        row.as_ref().map(row_to_session).transpose()
    }

    /// `resolve_or_create` per the session manager: touch-and-return if a
    /// non-expired row exists, else insert a fresh one. Runs in one
    /// transaction so a concurrent caller never observes a half-written row.
    pub async fn resolve_or_create(&self, id: &str, first_user_message: &str, now: i64, ttl_ms: i64) -> Result<(Session, bool)> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(row) = existing {
            let session = row_to_session(&row)?;
            if session.expires_at >= now {
                let new_expires = now + ttl_ms;
                sqlx::query("UPDATE sessions SET last_accessed = ?, expires_at = ? WHERE id = ?")
                    .bind(now)
                    .bind(new_expires)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                return Ok((
                    Session {
                        last_accessed: now,
                        expires_at: new_expires,
                        ..session
                    },
                    false,
                ));
            }
            // Expired: fall through and overwrite with a fresh session below.
        }

        let expires_at = now + ttl_ms;
        sqlx::query(
            "INSERT INTO sessions (id, chat_id, parent_id, first_user_message, first_assistant_message,
                                    conversation_hash, message_count, created_at, last_accessed, expires_at)
             VALUES (?, NULL, NULL, ?, NULL, NULL, 0, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                chat_id = NULL, parent_id = NULL, first_user_message = excluded.first_user_message,
                first_assistant_message = NULL, conversation_hash = NULL, message_count = 0,
                created_at = excluded.created_at, last_accessed = excluded.last_accessed, expires_at = excluded.expires_at",
        )
        .bind(id)
        .bind(first_user_message)
        .bind(now)
        .bind(now)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((
            Session {
                id: id.to_string(),
                chat_id: None,
                parent_id: None,
                first_user_message: first_user_message.to_string(),
                first_assistant_message: None,
                conversation_hash: None,
                message_count: 0,
                created_at: now,
                last_accessed: now,
                expires_at,
            },
            true,
        ))
    }

    /// Collision policy: the row with the greatest `created_at` wins.
    pub async fn continue_by_conversation(&self, conversation_hash: &str, now: i64) -> Result<Option<Session>> {
        let row = sqlx::query(
            "SELECT * FROM sessions WHERE conversation_hash = ? AND expires_at >= ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(conversation_hash)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;
        row.as_ref().map(row_to_session).transpose()
    }

    /// Returns `false` (no error) if the session is missing or already expired.
    pub async fn advance(&self, id: &str, new_parent_id: &str, new_chat_id: Option<&str>, now: i64, ttl_ms: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let existing = sqlx::query("SELECT expires_at FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = existing else {
            return Ok(false);
        };
        let expires_at: i64 = row.try_get("expires_at")?;
        if expires_at < now {
            return Ok(false);
        }

        if let Some(chat_id) = new_chat_id {
            sqlx::query(
                "UPDATE sessions SET parent_id = ?, chat_id = ?, message_count = message_count + 1,
                 last_accessed = ?, expires_at = ? WHERE id = ?",
            )
            .bind(new_parent_id)
            .bind(chat_id)
            .bind(now)
            .bind(now + ttl_ms)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                "UPDATE sessions SET parent_id = ?, message_count = message_count + 1,
                 last_accessed = ?, expires_at = ? WHERE id = ?",
            )
            .bind(new_parent_id)
            .bind(now)
            .bind(now + ttl_ms)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    /// Sets `conversation_hash` and `first_assistant_message` after the
    /// first completion on a session.
    pub async fn set_conversation_hash(&self, id: &str, conversation_hash: &str, first_assistant_message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE sessions SET conversation_hash = ?, first_assistant_message = ? WHERE id = ?",
        )
        .bind(conversation_hash)
        .bind(first_assistant_message)
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn sweep_expired(&self, now: i64) -> Result<usize> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Session>> {
        let rows = sqlx::query("SELECT * FROM sessions ORDER BY last_accessed DESC LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;
        rows.iter().map(row_to_session).collect()
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    Ok(Session {
        id: row.try_get("id")?,
        chat_id: row.try_get("chat_id")?,
        parent_id: row.try_get("parent_id")?,
        first_user_message: row.try_get("first_user_message")?,
        first_assistant_message: row.try_get("first_assistant_message")?,
        conversation_hash: row.try_get("conversation_hash")?,
        message_count: row.try_get("message_count")?,
        created_at: row.try_get("created_at")?,
        last_accessed: row.try_get("last_accessed")?,
        expires_at: row.try_get("expires_at")?,
    })
}
