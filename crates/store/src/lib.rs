pub mod pool;
pub mod repo;

pub use pool::{connect_raw, migrator};

use gw_domain::error::Result;
use sqlx::SqlitePool;

use repo::credentials::CredentialRepo;
use repo::errors::ErrorRepo;
use repo::models::ModelRepo;
use repo::providers::ProviderRepo;
use repo::requests::RequestRepo;
use repo::responses::ResponseRepo;
use repo::sessions::SessionRepo;
use repo::settings::SettingRepo;

/// The store: one open SQLite pool plus a typed repository per entity. This
/// is the only thing in the process that talks SQL; every other crate goes
/// through these repositories.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn open(db_path: &str) -> Result<Self> {
        let pool = pool::open(db_path).await?;
        Ok(Self { pool })
    }

    /// Wraps an already-open pool (e.g. from [`pool::connect_raw`]) without
    /// running migrations or clearing sessions. For CLI commands that only
    /// read or mutate rows and must not disturb a concurrently running
    /// server's live sessions.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn providers(&self) -> ProviderRepo<'_> {
        ProviderRepo::new(&self.pool)
    }

    pub fn models(&self) -> ModelRepo<'_> {
        ModelRepo::new(&self.pool)
    }

    pub fn sessions(&self) -> SessionRepo<'_> {
        SessionRepo::new(&self.pool)
    }

    pub fn requests(&self) -> RequestRepo<'_> {
        RequestRepo::new(&self.pool)
    }

    pub fn responses(&self) -> ResponseRepo<'_> {
        ResponseRepo::new(&self.pool)
    }

    pub fn errors(&self) -> ErrorRepo<'_> {
        ErrorRepo::new(&self.pool)
    }

    pub fn settings(&self) -> SettingRepo<'_> {
        SettingRepo::new(&self.pool)
    }

    pub fn credentials(&self) -> CredentialRepo<'_> {
        CredentialRepo::new(&self.pool)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Current unix-ms timestamp. All timestamps in the store are unix-ms
/// integers; this is the single place that reads the wall clock for that
/// purpose outside of tests (which inject `now` explicitly).
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
