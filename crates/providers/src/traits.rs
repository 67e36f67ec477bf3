use std::collections::HashMap;

use gw_domain::error::Result;
use gw_domain::models::ConfigValue;
use gw_domain::stream::{SseChunk, Usage};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One message from the client's `messages` array, reduced to what the
/// router and the Qwen-web adapter actually need to inspect. Pass-through
/// providers never construct these — they forward `raw` untouched.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// A chat-completions request as received from the client. `raw` is the
/// full, unmodified JSON body; pass-through providers forward it verbatim.
/// `messages` is a best-effort structured read of `raw["messages"]` for
/// adapters (like Qwen-web) that need to reason about turn structure.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub raw: serde_json::Value,
    pub model: String,
    pub stream: bool,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn from_raw(raw: serde_json::Value) -> Result<Self> {
        use gw_domain::error::Error;

        let model = raw
            .get("model")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Validation("missing required field: model".into()))?
            .to_string();
        let stream = raw.get("stream").and_then(|v| v.as_bool()).unwrap_or(false);

        let messages_val = raw
            .get("messages")
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::Validation("missing required field: messages".into()))?;

        let mut messages = Vec::with_capacity(messages_val.len());
        for m in messages_val {
            let role = m
                .get("role")
                .and_then(|v| v.as_str())
                .unwrap_or("user")
                .to_string();
            let content = m
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            messages.push(ChatMessage { role, content });
        }

        Ok(Self {
            raw,
            model,
            stream,
            messages,
        })
    }
}

/// Per-call context threaded through every provider.
pub struct ChatContext {
    pub request_id: String,
    pub cancel: CancellationToken,
    /// Present iff the client asked for `stream: true`; chunks pushed here
    /// are relayed to the client as they arrive.
    pub sink: Option<mpsc::Sender<SseChunk>>,
    pub span: tracing::Span,
}

/// What a `chat` call produced, for the dispatcher to persist and/or relay.
pub enum ChatOutcome {
    /// Non-streaming: the full OpenAI-shaped completion object.
    Buffered(serde_json::Value),
    /// Streaming: chunks were already pushed to `ChatContext::sink`; this is
    /// the reconstructed final response for the audit log.
    Streamed {
        openai_response: serde_json::Value,
        parent_id: Option<String>,
        usage: Option<Usage>,
        finish_reason: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Health {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub message: Option<String>,
}

/// Config exposed to admin surfaces, with sensitive values redacted.
#[derive(Debug, Clone)]
pub struct ProviderPublicConfig {
    pub base_url: Option<String>,
    pub extra: HashMap<String, ConfigValue>,
}

#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    fn id(&self) -> &str;

    async fn chat(&self, request: ChatRequest, ctx: ChatContext) -> Result<ChatOutcome>;

    async fn health_check(&self) -> Result<Health>;

    /// `Ok(None)` means "the registry should fall back to linked `ProviderModel` rows".
    async fn list_models(&self) -> Result<Option<Vec<String>>>;

    fn config(&self) -> ProviderPublicConfig;
}
