use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// A boxed async stream, used for streamed chat completions.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// One already-framed `data: ...\n\n` line headed to the client. Pass-through
/// providers forward upstream bytes into this verbatim; the Qwen-web adapter
/// constructs these from its own decoded events.
#[derive(Debug, Clone)]
pub struct SseChunk(pub String);

impl SseChunk {
    pub fn data(payload: &serde_json::Value) -> Self {
        SseChunk(format!("data: {payload}\n\n"))
    }

    pub fn done() -> Self {
        SseChunk("data: [DONE]\n\n".to_string())
    }
}

/// Decoded events from the Qwen-web upstream's own JSON-lines framing,
/// produced incrementally by the adapter's line parser.
#[derive(Debug, Clone)]
pub enum QwenStreamEvent {
    /// A content delta for the turn currently being streamed.
    Content {
        text: String,
        parent_id: Option<String>,
    },
    /// The terminal event for a turn.
    Done {
        finish_reason: String,
        usage: Option<Usage>,
        parent_id: Option<String>,
        chat_id: Option<String>,
    },
}

/// Token usage for a completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
