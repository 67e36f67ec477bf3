use std::str::FromStr;
use std::time::Duration;

use gw_domain::error::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Open (creating if absent) the SQLite database at `db_path`, enable WAL +
/// foreign keys + a busy timeout, run every pending migration, and clear the
/// session table (parent_id chains do not survive a restart; see the store
/// component's startup side-effect).
///
/// The store is single-process, so the pool is capped small: SQLite
/// serialises writers regardless of pool size, and a large pool only adds
/// contention on the file lock.
pub async fn open(db_path: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{db_path}"))
        .map_err(|e| Error::Store(e.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| Error::Store(format!("migration failed: {e}")))?;

    sqlx::query("DELETE FROM sessions").execute(&pool).await?;
    tracing::info!("cleared session table on boot");

    Ok(pool)
}

/// The same embedded migration set `open` runs, exposed standalone so the
/// CLI can list/apply migrations against a pool it controls itself (`open`
/// always clears the session table, which a bare `migrate` invocation
/// should not do as a side effect).
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Opens a pool with the same connection options as `open`, but without
/// running migrations or touching the session table.
pub async fn connect_raw(db_path: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{db_path}"))
        .map_err(|e| Error::Store(e.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_and_migrates_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = open(path.to_str().unwrap()).await.unwrap();

        let version: (String,) =
            sqlx::query_as("SELECT value FROM metadata WHERE key = 'schema_version'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(version.0, "2");
    }

    #[tokio::test]
    async fn running_migrations_twice_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = open(path.to_str().unwrap()).await.unwrap();
        drop(pool);
        // Re-opening re-runs sqlx's own migration bookkeeping; should not error.
        let pool = open(path.to_str().unwrap()).await.unwrap();
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }
}
