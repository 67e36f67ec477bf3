//! OpenAI-shaped pass-through adapter.
//!
//! Covers both the `openai` and `local_openai` provider types: the request
//! body is forwarded to the upstream verbatim (as an opaque JSON value, not
//! re-typed into an internal message model) and the SSE response is relayed
//! byte-for-byte. The two types differ only in whether `api_key` is a
//! required config key and whether non-TLS endpoints are tolerated.

use std::collections::HashMap;
use std::time::Duration;

use gw_domain::error::{Error, Result};
use gw_domain::stream::{SseChunk, Usage};
use gw_domain::models::ConfigValue;
use serde_json::Value;

use crate::traits::{ChatContext, ChatOutcome, ChatRequest, Health, Provider, ProviderPublicConfig};

pub struct OpenAiShapedProvider {
    id: String,
    base_url: String,
    api_key: Option<String>,
    default_model: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
    extra: HashMap<String, ConfigValue>,
}

impl OpenAiShapedProvider {
    /// `require_api_key` distinguishes `openai` (true) from `local_openai` (false).
    pub fn from_config(
        id: &str,
        config: &HashMap<String, ConfigValue>,
        require_api_key: bool,
    ) -> Result<Self> {
        let base_url = config
            .get("base_url")
            .and_then(ConfigValue::as_str)
            .ok_or_else(|| Error::Validation(format!("provider {id}: missing base_url")))?
            .trim_end_matches('/')
            .to_string();

        let api_key = config.get("api_key").and_then(ConfigValue::as_str).map(String::from);
        if require_api_key && api_key.is_none() {
            return Err(Error::Validation(format!("provider {id}: missing api_key")));
        }

        let default_model = config
            .get("default_model")
            .and_then(ConfigValue::as_str)
            .map(String::from);

        let timeout_ms = match config.get("timeout") {
            Some(ConfigValue::Int(ms)) => *ms as u64,
            _ => 30_000,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            id: id.to_string(),
            base_url,
            api_key,
            default_model,
            timeout: Duration::from_millis(timeout_ms),
            client,
            extra: config.clone(),
        })
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn effective_model(&self, requested: &str) -> String {
        if requested.is_empty() {
            self.default_model.clone().unwrap_or_default()
        } else {
            requested.to_string()
        }
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiShapedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn chat(&self, request: ChatRequest, ctx: ChatContext) -> Result<ChatOutcome> {
        let mut body = request.raw.clone();
        if let Value::Object(ref mut map) = body {
            map.insert(
                "model".to_string(),
                Value::String(self.effective_model(&request.model)),
            );
        }

        let url = format!("{}/chat/completions", self.base_url);
        let resp = tokio::time::timeout(
            self.timeout,
            self.authed(self.client.post(&url).json(&body)).send(),
        )
        .await
        .map_err(|_| Error::UpstreamNetwork(format!("{} timed out", self.id)))?
        .map_err(Error::from)?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            let excerpt: String = body_text.chars().take(2048).collect();
            return Err(if status.is_client_error() {
                Error::UpstreamClient { status: status.as_u16(), body: excerpt }
            } else {
                Error::UpstreamServer { status: status.as_u16(), body: excerpt }
            });
        }

        if !request.stream {
            let json: Value = resp.json().await.map_err(Error::from)?;
            return Ok(ChatOutcome::Buffered(json));
        }

        let sink = ctx
            .sink
            .ok_or_else(|| Error::Internal("stream requested but no sink provided".into()))?;

        let mut content = String::new();
        let mut usage: Option<Usage> = None;
        let mut finish_reason: Option<String> = None;
        let mut model = request.model.clone();

        let mut events = crate::sse::sse_response_stream(resp, parse_passthrough_line);
        use futures_util::StreamExt;
        loop {
            let next = tokio::select! {
                _ = ctx.cancel.cancelled() => {
                    finish_reason = Some("cancelled".into());
                    break;
                }
                next = events.next() => next,
            };
            let Some(event) = next else { break };
            let event = event?;
            if sink.send(event.chunk.clone()).await.is_err() {
                break;
            }
            if let Some(delta) = event.delta {
                content.push_str(&delta);
            }
            if let Some(m) = event.model {
                model = m;
            }
            if event.usage.is_some() {
                usage = event.usage;
            }
            if event.finish_reason.is_some() {
                finish_reason = event.finish_reason;
            }
        }

        let openai_response = serde_json::json!({
            "id": format!("chatcmpl-{}", ctx.request_id),
            "object": "chat.completion",
            "model": model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": finish_reason,
            }],
            "usage": usage,
        });

        Ok(ChatOutcome::Streamed {
            openai_response,
            parent_id: None,
            usage,
            finish_reason,
        })
    }

    async fn health_check(&self) -> Result<Health> {
        let start = std::time::Instant::now();
        let url = format!("{}/v1/models", self.base_url);
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            self.authed(self.client.get(&url)).send(),
        )
        .await;

        Ok(match result {
            Ok(Ok(resp)) => Health {
                healthy: resp.status().is_success(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
                message: None,
            },
            Ok(Err(e)) => Health { healthy: false, latency_ms: None, message: Some(e.to_string()) },
            Err(_) => Health { healthy: false, latency_ms: None, message: Some("timed out".into()) },
        })
    }

    async fn list_models(&self) -> Result<Option<Vec<String>>> {
        let url = format!("{}/v1/models", self.base_url);
        let resp = self.authed(self.client.get(&url)).send().await;
        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            _ => return Ok(None),
        };
        let json: Value = match resp.json().await {
            Ok(v) => v,
            Err(_) => return Ok(None),
        };
        let ids = json
            .get("data")
            .and_then(|d| d.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m.get("id").and_then(|v| v.as_str()).map(String::from))
                    .collect()
            });
        Ok(ids)
    }

    fn config(&self) -> ProviderPublicConfig {
        let mut extra = self.extra.clone();
        if extra.contains_key("api_key") {
            extra.insert("api_key".into(), ConfigValue::String("***".into()));
        }
        ProviderPublicConfig { base_url: Some(self.base_url.clone()), extra }
    }
}

struct PassthroughEvent {
    chunk: SseChunk,
    delta: Option<String>,
    model: Option<String>,
    usage: Option<Usage>,
    finish_reason: Option<String>,
}

fn parse_passthrough_line(data: &str) -> Vec<Result<PassthroughEvent>> {
    if data.trim() == "[DONE]" {
        return vec![Ok(PassthroughEvent {
            chunk: SseChunk::done(),
            delta: None,
            model: None,
            usage: None,
            finish_reason: None,
        })];
    }

    let json: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => return vec![Err(Error::from(e))],
    };

    let delta = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|v| v.as_str())
        .map(String::from);

    let finish_reason = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|c| c.get("finish_reason"))
        .and_then(|v| v.as_str())
        .map(String::from);

    let usage = json.get("usage").and_then(|u| serde_json::from_value::<Usage>(u.clone()).ok());
    let model = json.get("model").and_then(|v| v.as_str()).map(String::from);

    vec![Ok(PassthroughEvent {
        chunk: SseChunk(format!("data: {data}\n\n")),
        delta,
        model,
        usage,
        finish_reason,
    })]
}
