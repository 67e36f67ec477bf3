use serde::{Deserialize, Serialize};

use crate::capability::CapabilitySet;

/// Closed set of provider types, extensible only at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Openai,
    LocalOpenai,
    QwenWeb,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Openai => "openai",
            ProviderType::LocalOpenai => "local_openai",
            ProviderType::QwenWeb => "qwen_web",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "openai" => Some(ProviderType::Openai),
            "local_openai" => Some(ProviderType::LocalOpenai),
            "qwen_web" => Some(ProviderType::QwenWeb),
            _ => None,
        }
    }

    /// Config keys a provider of this type must have before it can be constructed.
    pub fn required_config(&self) -> &'static [&'static str] {
        match self {
            ProviderType::Openai => &["base_url", "api_key"],
            ProviderType::LocalOpenai => &["base_url"],
            ProviderType::QwenWeb => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProviderType,
    pub enabled: bool,
    pub priority: i64,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A dynamically-typed config value. Sensitive values carry `is_sensitive`
/// alongside the value in [`ProviderConfig`] rather than as a separate type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Bool(bool),
    Float(f64),
    Json(serde_json::Value),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Redact for egress if the owning [`ProviderConfig`] is sensitive.
    pub fn redacted(&self) -> ConfigValue {
        ConfigValue::String("***".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub key: String,
    pub value: ConfigValue,
    pub is_sensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub capabilities: CapabilitySet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderModel {
    pub provider_id: String,
    pub model_id: String,
    pub is_default: bool,
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub chat_id: Option<String>,
    pub parent_id: Option<String>,
    pub first_user_message: String,
    pub first_assistant_message: Option<String>,
    pub conversation_hash: Option<String>,
    pub message_count: i64,
    pub created_at: i64,
    pub last_accessed: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: i64,
    pub request_id: String,
    pub session_id: String,
    pub provider_id: Option<String>,
    pub openai_request: serde_json::Value,
    pub qwen_request: Option<serde_json::Value>,
    pub model: String,
    pub stream: bool,
    pub method: String,
    pub path: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub response_id: String,
    pub request_id: i64,
    pub session_id: String,
    pub qwen_response: Option<serde_json::Value>,
    pub openai_response: serde_json::Value,
    pub parent_id: Option<String>,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub finish_reason: Option<String>,
    pub error: Option<String>,
    pub duration_ms: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Info,
    Warn,
    Error,
    Fatal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error_id: String,
    pub error_type: String,
    pub severity: ErrorSeverity,
    pub session_id: Option<String>,
    pub request_id: Option<i64>,
    pub payload: Option<serde_json::Value>,
    pub resolved: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum SettingValue {
    String(String),
    Int(i64),
    Bool(bool),
    Float(f64),
}

impl SettingValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: SettingValue,
    pub updated_at: i64,
}

/// One active credential record per backend needing scraped auth (in
/// practice, one row keyed `"qwen_web"`).
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    pub backend: String,
    pub bearer_token: String,
    pub cookie_jar: String,
    pub expires_at: Option<i64>,
    pub stale: bool,
    pub updated_at: i64,
}

impl Credential {
    /// Valid iff both fields are present, not marked stale, and not expired.
    pub fn is_valid(&self, now_ms: i64) -> bool {
        if self.stale || self.bearer_token.is_empty() || self.cookie_jar.is_empty() {
            return false;
        }
        match self.expires_at {
            Some(exp) => exp > now_ms,
            None => true,
        }
    }
}

// Manual Debug impl so a stray `{:?}` never leaks the token or cookie jar.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("backend", &self.backend)
            .field("bearer_token", &"***")
            .field("cookie_jar", &"***")
            .field("expires_at", &self.expires_at)
            .field("stale", &self.stale)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
