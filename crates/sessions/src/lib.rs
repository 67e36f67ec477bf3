//! Content-addressed session identity over the store.
//!
//! A session's id is the MD5 of its first user message: a stateless client
//! that resends the same leading message transparently resumes the same
//! upstream conversation. `SessionManager` holds nothing mutable itself —
//! every bit of state lives in `gw_store`; this crate is the thin,
//! stateless service layer over it.

pub mod hash;

use std::sync::Arc;
use std::time::Duration;

use gw_domain::error::{Error, Result};
use gw_domain::event::GatewayEvent;
use gw_domain::models::Session;
use gw_store::Store;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub use hash::{conversation_hash, session_id};

#[derive(Clone)]
pub struct SessionManager {
    store: Store,
    ttl_ms: i64,
}

impl SessionManager {
    pub fn new(store: Store, ttl_ms: i64) -> Self {
        Self { store, ttl_ms }
    }

    /// Resolves the session keyed by `MD5(first_user_message)`, touching
    /// (extending `expires_at`) if it already exists, or creating it fresh.
    pub async fn resolve_or_create(&self, first_user_message: &str, now: i64) -> Result<(Session, bool)> {
        if first_user_message.is_empty() {
            return Err(Error::Validation("first user message must not be empty".to_string()));
        }
        let id = session_id(first_user_message);
        self.store
            .sessions()
            .resolve_or_create(&id, first_user_message, now, self.ttl_ms)
            .await
    }

    pub async fn continue_by_conversation(&self, first_user: &str, first_assistant: &str, now: i64) -> Result<Option<Session>> {
        let hash = conversation_hash(first_user, first_assistant);
        self.store.sessions().continue_by_conversation(&hash, now).await
    }

    /// Returns `false` (not an error) if the session is missing or expired.
    pub async fn advance(
        &self,
        session_id: &str,
        new_parent_id: &str,
        new_chat_id: Option<&str>,
        now: i64,
    ) -> Result<bool> {
        self.store
            .sessions()
            .advance(session_id, new_parent_id, new_chat_id, now, self.ttl_ms)
            .await
    }

    pub async fn set_conversation_hash(&self, session_id: &str, hash: &str, first_assistant_message: &str) -> Result<()> {
        self.store.sessions().set_conversation_hash(session_id, hash, first_assistant_message).await
    }

    pub async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        self.store.sessions().get(session_id).await
    }

    pub async fn sweep_expired(&self, now: i64) -> Result<usize> {
        self.store.sessions().sweep_expired(now).await
    }

    /// Spawns the background sweep timer. The returned handle must be
    /// aborted on shutdown — it must not keep the process alive past the
    /// main serve future.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        events: broadcast::Sender<GatewayEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let now = gw_store::now_ms();
                match self.sweep_expired(now).await {
                    Ok(count) if count > 0 => {
                        tracing::info!(count, "swept expired sessions");
                        let _ = events.send(GatewayEvent::SessionSwept { count });
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "session sweep failed"),
                }
            }
        })
    }
}
