//! The request dispatcher: provider selection with silent fallthrough,
//! session resolution, persistence around the upstream call, and mapping of
//! failures into `ErrorRecord`s.

use std::sync::Arc;
use std::time::Instant;

use gw_domain::error::{Error, Result};
use gw_domain::models::{ErrorRecord, ErrorSeverity, Request, Response};
use gw_domain::stream::{SseChunk, Usage};
use gw_providers::{ChatContext, ChatOutcome, ChatRequest, Provider, Registry};
use gw_sessions::SessionManager;
use gw_store::Store;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::locks::SessionLocks;

pub struct Dispatcher {
    store: Store,
    registry: Arc<Registry>,
    sessions: SessionManager,
    locks: SessionLocks,
}

impl Dispatcher {
    pub fn new(store: Store, registry: Arc<Registry>, sessions: SessionManager) -> Self {
        Self { store, registry, sessions, locks: SessionLocks::new() }
    }

    /// `active_provider` is tried first; on disable/absence/missing-model-link
    /// the remaining enabled providers are tried in descending `priority`
    /// order. Falling through to a later provider is never itself an error.
    async fn select_provider(&self, model: &str) -> Result<(String, Arc<dyn Provider>)> {
        let active = self
            .store
            .settings()
            .get("active_provider")
            .await?
            .and_then(|s| s.value.as_str().map(str::to_string));

        let enabled = self.store.providers().find_all(true).await?;

        let mut ordered: Vec<&gw_domain::models::Provider> = Vec::with_capacity(enabled.len());
        if let Some(active_id) = &active {
            ordered.extend(enabled.iter().filter(|p| &p.id == active_id));
        }
        ordered.extend(enabled.iter().filter(|p| Some(&p.id) != active.as_ref()));

        for p in ordered {
            if !self.store.models().is_model_linked(&p.id, model).await? {
                continue;
            }
            if let Ok(instance) = self.registry.get(&p.id) {
                return Ok((p.id.clone(), instance));
            }
        }

        Err(Error::NotFound(format!("no enabled, loaded provider serves model '{model}'")))
    }

    pub async fn chat_completions(
        &self,
        raw: Value,
        sink: Option<mpsc::Sender<SseChunk>>,
        cancel: CancellationToken,
        span: tracing::Span,
    ) -> Result<Value> {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let now = gw_store::now_ms();

        let chat_request = ChatRequest::from_raw(raw.clone())?;
        let first_user = chat_request
            .messages
            .iter()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let (session, _created) = self.sessions.resolve_or_create(first_user, now).await?;

        let _turn_guard = self.locks.try_acquire(&session.id).ok_or_else(|| {
            Error::Conflict(format!("a turn for session {} is already in flight", session.id))
        })?;

        let (provider_id, provider) = match self.select_provider(&chat_request.model).await {
            Ok(v) => v,
            Err(e) => {
                self.persist_error(None, Some(&session.id), &e, now).await;
                return Err(e);
            }
        };

        let request_row = Request {
            id: 0,
            request_id: request_id.clone(),
            session_id: session.id.clone(),
            provider_id: Some(provider_id),
            openai_request: raw,
            qwen_request: None,
            model: chat_request.model.clone(),
            stream: chat_request.stream,
            method: "POST".into(),
            path: "/v1/chat/completions".into(),
            timestamp: now,
        };
        let db_request_id = self.store.requests().create(&request_row).await?;

        let ctx = ChatContext { request_id: request_id.clone(), cancel, sink, span };
        let outcome = provider.chat(chat_request, ctx).await;
        let duration_ms = started.elapsed().as_millis() as i64;

        match outcome {
            Ok(ChatOutcome::Buffered(body)) => {
                self.persist_response(db_request_id, &session.id, &body, None, None, None, duration_ms, now).await?;
                Ok(body)
            }
            Ok(ChatOutcome::Streamed { openai_response, parent_id, usage, finish_reason }) => {
                self.persist_response(db_request_id, &session.id, &openai_response, parent_id, usage, finish_reason, duration_ms, now)
                    .await?;
                Ok(openai_response)
            }
            Err(e) => {
                // Connection/TLS failures surface with no response row, per
                // the failure-semantics table; every other error still gets
                // one so partial content (if any) is preserved.
                if !matches!(e, Error::UpstreamNetwork(_)) {
                    let body = serde_json::json!({"error": {"message": e.to_string()}});
                    let _ = self
                        .store
                        .responses()
                        .create(&Response {
                            id: 0,
                            response_id: Uuid::new_v4().to_string(),
                            request_id: db_request_id,
                            session_id: session.id.clone(),
                            qwen_response: None,
                            openai_response: body,
                            parent_id: None,
                            prompt_tokens: None,
                            completion_tokens: None,
                            total_tokens: None,
                            finish_reason: Some("error".into()),
                            error: Some(e.to_string()),
                            duration_ms,
                            timestamp: now,
                        })
                        .await;
                }
                self.persist_error(Some(db_request_id), Some(&session.id), &e, now).await;
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn persist_response(
        &self,
        request_db_id: i64,
        session_id: &str,
        body: &Value,
        parent_id: Option<String>,
        usage: Option<Usage>,
        finish_reason: Option<String>,
        duration_ms: i64,
        now: i64,
    ) -> Result<()> {
        let response_row = Response {
            id: 0,
            response_id: Uuid::new_v4().to_string(),
            request_id: request_db_id,
            session_id: session_id.to_string(),
            qwen_response: None,
            openai_response: body.clone(),
            parent_id,
            prompt_tokens: usage.map(|u| u.prompt_tokens as i64),
            completion_tokens: usage.map(|u| u.completion_tokens as i64),
            total_tokens: usage.map(|u| u.total_tokens as i64),
            finish_reason,
            error: None,
            duration_ms,
            timestamp: now,
        };
        self.store.responses().create(&response_row).await?;
        Ok(())
    }

    async fn persist_error(&self, request_db_id: Option<i64>, session_id: Option<&str>, err: &Error, now: i64) {
        let record = ErrorRecord {
            error_id: Uuid::new_v4().to_string(),
            error_type: err.error_type().to_string(),
            severity: match err.severity() {
                "warn" => ErrorSeverity::Warn,
                "fatal" => ErrorSeverity::Fatal,
                _ => ErrorSeverity::Error,
            },
            session_id: session_id.map(str::to_string),
            request_id: request_db_id,
            payload: Some(serde_json::json!({"message": err.to_string()})),
            resolved: false,
            created_at: now,
        };
        if let Err(e) = self.store.errors().create(&record).await {
            tracing::error!(error = %e, "failed to persist error record");
        }
    }
}
