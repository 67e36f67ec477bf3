use std::collections::HashMap;
use std::time::Duration;

use gw_domain::error::{Error, Result};
use gw_domain::event::GatewayEvent;
use gw_domain::models::ConfigValue;
use gw_domain::stream::{SseChunk, Usage};
use gw_providers::traits::{
    ChatContext, ChatOutcome, ChatRequest, Health, Provider, ProviderPublicConfig,
};
use gw_sessions::SessionManager;
use gw_store::Store;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::reconcile::{self, Continuation, SessionState, SubmissionPlan};
use crate::sse_lines::drain_json_lines;
use crate::state::TurnState;

const DEFAULT_BASE_URL: &str = "https://chat.qwen.ai/api";
const CREDENTIAL_BACKEND: &str = "qwen_web";

pub struct QwenWebProvider {
    id: String,
    base_url: String,
    client: reqwest::Client,
    store: Store,
    sessions: SessionManager,
    events: broadcast::Sender<GatewayEvent>,
    timeout: Duration,
}

impl QwenWebProvider {
    pub fn new(
        id: &str,
        config: &HashMap<String, ConfigValue>,
        store: Store,
        sessions: SessionManager,
        events: broadcast::Sender<GatewayEvent>,
    ) -> Result<Self> {
        let base_url = config
            .get("base_url")
            .and_then(ConfigValue::as_str)
            .map(String::from)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_ms = match config.get("timeout") {
            Some(ConfigValue::Int(ms)) => *ms as u64,
            _ => 30_000,
        };
        let client = reqwest::Client::builder().build().map_err(Error::from)?;
        Ok(Self {
            id: id.to_string(),
            base_url,
            client,
            store,
            sessions,
            events,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    async fn resolve_model(&self, requested: &str) -> Result<String> {
        if !requested.is_empty() && self.store.models().is_model_linked(&self.id, requested).await? {
            return Ok(requested.to_string());
        }
        self.store
            .models()
            .default_model_for_provider(&self.id)
            .await?
            .ok_or_else(|| Error::Validation(format!("no model linked or default for provider {}", self.id)))
    }

    /// Runs one upstream turn. Upstream is always contacted in streaming
    /// mode; `relay` is `Some` only for the turn whose content the client
    /// should actually see.
    async fn run_turn(
        &self,
        credential: &gw_domain::models::Credential,
        model: &str,
        text: &str,
        parent_id: Option<&str>,
        chat_id: Option<&str>,
        relay: Option<&mpsc::Sender<SseChunk>>,
        cancel: &CancellationToken,
        request_id: &str,
    ) -> Result<TurnOutcome> {
        let body = json!({
            "model": model,
            "parent_id": parent_id,
            "chat_id": chat_id,
            "messages": [{"role": "user", "content": text}],
            "stream": true,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&credential.bearer_token)
            .header("Cookie", &credential.cookie_jar)
            .json(&body)
            .send()
            .await
            .map_err(Error::from)?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            self.store.credentials().mark_stale(CREDENTIAL_BACKEND, gw_store::now_ms()).await?;
            let _ = self.events.send(GatewayEvent::CredentialsInvalid { backend: CREDENTIAL_BACKEND.into() });
            return Err(Error::UpstreamAuth("qwen_web credentials rejected".into()));
        }
        if !status.is_success() {
            let excerpt: String = resp.text().await.unwrap_or_default().chars().take(2048).collect();
            return Err(if status.is_client_error() {
                Error::UpstreamClient { status: status.as_u16(), body: excerpt }
            } else {
                Error::UpstreamServer { status: status.as_u16(), body: excerpt }
            });
        }

        let mut response = resp;
        let mut buffer = String::new();
        let mut content = String::new();
        let mut out_parent_id: Option<String> = None;
        let mut out_chat_id: Option<String> = None;
        let mut finish_reason: Option<String> = None;
        let mut usage: Option<Usage> = None;
        let mut aborted: Option<String> = None;
        let created = chrono::Utc::now().timestamp();

        loop {
            let deadline = tokio::time::sleep(self.timeout);
            tokio::select! {
                _ = cancel.cancelled() => {
                    finish_reason = Some("cancelled".into());
                    break;
                }
                _ = deadline => {
                    aborted = Some(format!("no data for {:?}", self.timeout));
                    break;
                }
                chunk = response.chunk() => {
                    match chunk.map_err(Error::from)? {
                        None => {
                            if !buffer.trim().is_empty() {
                                buffer.push('\n');
                            }
                            for line in drain_json_lines(&mut buffer) {
                                apply_line(&line, model, request_id, created, relay, &mut content, &mut out_parent_id, &mut out_chat_id, &mut finish_reason, &mut usage).await?;
                            }
                            break;
                        }
                        Some(bytes) => {
                            buffer.push_str(&String::from_utf8_lossy(&bytes));
                            for line in drain_json_lines(&mut buffer) {
                                apply_line(&line, model, request_id, created, relay, &mut content, &mut out_parent_id, &mut out_chat_id, &mut finish_reason, &mut usage).await?;
                            }
                        }
                    }
                }
            }
        }

        if let Some(reason) = aborted {
            finish_reason = Some("error".into());
            tracing::warn!(provider_id = %self.id, reason = %reason, "qwen_web stream aborted mid-response");
        }

        Ok(TurnOutcome { content, parent_id: out_parent_id, chat_id: out_chat_id, finish_reason, usage })
    }
}

struct TurnOutcome {
    content: String,
    parent_id: Option<String>,
    chat_id: Option<String>,
    finish_reason: Option<String>,
    usage: Option<Usage>,
}

#[allow(clippy::too_many_arguments)]
async fn apply_line(
    line: &str,
    model: &str,
    request_id: &str,
    created: i64,
    relay: Option<&mpsc::Sender<SseChunk>>,
    content: &mut String,
    out_parent_id: &mut Option<String>,
    out_chat_id: &mut Option<String>,
    finish_reason: &mut Option<String>,
    usage: &mut Option<Usage>,
) -> Result<()> {
    let v: Value = serde_json::from_str(line)?;

    if let Some(pid) = v.get("parent_id").and_then(|p| p.as_str()) {
        *out_parent_id = Some(pid.to_string());
    }
    if let Some(cid) = v.get("chat_id").and_then(|c| c.as_str()) {
        *out_chat_id = Some(cid.to_string());
    }
    if let Some(u) = v.get("usage") {
        *usage = serde_json::from_value(u.clone()).ok();
    }

    let delta = v.get("content").and_then(|c| c.as_str()).unwrap_or("");
    if !delta.is_empty() {
        content.push_str(delta);
        if let Some(sink) = relay {
            let chunk = openai_chunk(request_id, model, created, delta, None);
            let _ = sink.send(SseChunk::data(&chunk)).await;
        }
    }

    if let Some(fr) = v.get("finish_reason").and_then(|f| f.as_str()) {
        *finish_reason = Some(fr.to_string());
        if let Some(sink) = relay {
            let chunk = openai_chunk(request_id, model, created, "", Some(fr));
            let _ = sink.send(SseChunk::data(&chunk)).await;
            let _ = sink.send(SseChunk::done()).await;
        }
    }

    Ok(())
}

fn openai_chunk(request_id: &str, model: &str, created: i64, delta: &str, finish_reason: Option<&str>) -> Value {
    json!({
        "id": format!("chatcmpl-{request_id}"),
        "object": "chat.completion.chunk",
        "created": created,
        "model": model,
        "choices": [{
            "index": 0,
            "delta": {"content": delta},
            "finish_reason": finish_reason,
        }],
    })
}

#[async_trait::async_trait]
impl Provider for QwenWebProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn chat(&self, request: ChatRequest, ctx: ChatContext) -> Result<ChatOutcome> {
        let now = gw_store::now_ms();
        ctx.span.record("turn_state", TurnState::Init.as_str());

        if request.raw.get("tools").is_some()
            || request
                .raw
                .get("messages")
                .and_then(|v| v.as_array())
                .is_some_and(|msgs| msgs.iter().any(|m| m.get("tool_calls").is_some()))
        {
            return Err(Error::Validation(
                "tool/function-call messages are not supported by this adapter".into(),
            ));
        }

        let credential = match self.store.credentials().get_current(CREDENTIAL_BACKEND).await?.filter(|c| c.is_valid(now)) {
            Some(c) => c,
            None => {
                ctx.span.record("turn_state", TurnState::AuthFailed.as_str());
                return Err(Error::UpstreamAuth("no valid qwen_web credential".into()));
            }
        };
        let mut turn_state = TurnState::Authorized;
        ctx.span.record("turn_state", turn_state.as_str());

        let first_user = reconcile::first_user_message(&request.messages)?;
        let (session, _created) = self.sessions.resolve_or_create(first_user, now).await?;
        turn_state = TurnState::SessionResolved;
        ctx.span.record("turn_state", turn_state.as_str());
        ctx.span.record("session_id", session.id.as_str());

        let session_state = SessionState {
            message_count: session.message_count,
            chat_id: session.chat_id.clone(),
            parent_id: session.parent_id.clone(),
        };

        let continued = if request.messages.len() > 1 {
            match reconcile::first_assistant_message(&request.messages) {
                Some(first_assistant) => self
                    .sessions
                    .continue_by_conversation(first_user, first_assistant, now)
                    .await?
                    .map(|s| Continuation { chat_id: s.chat_id, parent_id: s.parent_id }),
                None => None,
            }
        } else {
            None
        };

        let plan = reconcile::plan_submission(&request.messages, &session_state, continued)?;
        let model = self.resolve_model(&request.model).await?;

        turn_state = TurnState::UpstreamOpen;
        ctx.span.record("turn_state", turn_state.as_str());

        let mark_network_failure = |e: Error| {
            if matches!(e, Error::UpstreamNetwork(_)) {
                ctx.span.record("turn_state", TurnState::NetworkFailed.as_str());
            }
            e
        };

        let outcome = match plan {
            SubmissionPlan::Direct { text, parent_id, chat_id } => {
                turn_state = TurnState::Streaming;
                ctx.span.record("turn_state", turn_state.as_str());
                self.run_turn(
                    &credential,
                    &model,
                    &text,
                    parent_id.as_deref(),
                    chat_id.as_deref(),
                    ctx.sink.as_ref(),
                    &ctx.cancel,
                    &ctx.request_id,
                )
                .await
                .map_err(mark_network_failure)?
            }
            SubmissionPlan::ReplayThenFinal { flattened_prefix, final_text } => {
                let prefix = self
                    .run_turn(&credential, &model, &flattened_prefix, None, None, None, &ctx.cancel, &ctx.request_id)
                    .await
                    .map_err(mark_network_failure)?;
                if ctx.cancel.is_cancelled() {
                    TurnOutcome { finish_reason: Some("cancelled".to_string()), ..prefix }
                } else {
                    turn_state = TurnState::Streaming;
                    ctx.span.record("turn_state", turn_state.as_str());
                    self.run_turn(
                        &credential,
                        &model,
                        &final_text,
                        prefix.parent_id.as_deref(),
                        prefix.chat_id.as_deref(),
                        ctx.sink.as_ref(),
                        &ctx.cancel,
                        &ctx.request_id,
                    )
                    .await
                    .map_err(mark_network_failure)?
                }
            }
        };

        if outcome.finish_reason.as_deref() == Some("cancelled") {
            turn_state = TurnState::ClientCancelled;
            ctx.span.record("turn_state", turn_state.as_str());
        }

        let new_chat_id = outcome.chat_id.clone();
        if let Some(new_parent_id) = &outcome.parent_id {
            self.sessions
                .advance(&session.id, new_parent_id, new_chat_id.as_deref(), now)
                .await?;
        }
        if session.first_assistant_message.is_none() && !outcome.content.is_empty() {
            let hash = gw_sessions::conversation_hash(first_user, &outcome.content);
            self.sessions.set_conversation_hash(&session.id, &hash, &outcome.content).await?;
        }

        if turn_state != TurnState::ClientCancelled {
            turn_state = TurnState::Finalised;
            ctx.span.record("turn_state", turn_state.as_str());
        }

        let content_for_body = if ctx.sink.is_none() && outcome.content.is_empty() {
            " ".to_string() // buffered empty-result sentinel
        } else {
            outcome.content.clone()
        };

        let openai_response = json!({
            "id": format!("chatcmpl-{}", ctx.request_id),
            "object": "chat.completion",
            "model": model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content_for_body},
                "finish_reason": outcome.finish_reason,
            }],
            "usage": outcome.usage,
        });

        Ok(ChatOutcome::Streamed {
            openai_response,
            parent_id: outcome.parent_id,
            usage: outcome.usage,
            finish_reason: outcome.finish_reason,
        })
    }

    async fn health_check(&self) -> Result<Health> {
        let now = gw_store::now_ms();
        let credential = self.store.credentials().get_current(CREDENTIAL_BACKEND).await?;
        match credential {
            Some(c) if c.is_valid(now) => Ok(Health { healthy: true, latency_ms: None, message: None }),
            Some(_) => Ok(Health { healthy: false, latency_ms: None, message: Some("credential stale or expired".into()) }),
            None => Ok(Health { healthy: false, latency_ms: None, message: Some("no credential on file".into()) }),
        }
    }

    async fn list_models(&self) -> Result<Option<Vec<String>>> {
        Ok(None)
    }

    fn config(&self) -> ProviderPublicConfig {
        ProviderPublicConfig { base_url: Some(self.base_url.clone()), extra: HashMap::new() }
    }
}
