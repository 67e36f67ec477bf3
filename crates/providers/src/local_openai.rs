//! Local OpenAI-compatible adapter: the same wire shape as
//! [`crate::openai_passthrough`], minus the `api_key` requirement, for
//! self-hosted OpenAI-compatible servers (vLLM, LM Studio, Ollama, ...).

use std::collections::HashMap;

use gw_domain::error::Result;
use gw_domain::models::ConfigValue;

use crate::openai_passthrough::OpenAiShapedProvider;

pub fn from_config(id: &str, config: &HashMap<String, ConfigValue>) -> Result<OpenAiShapedProvider> {
    OpenAiShapedProvider::from_config(id, config, false)
}
