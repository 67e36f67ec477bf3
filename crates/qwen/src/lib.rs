//! The Qwen-web adapter: translates a single OpenAI chat-completions
//! request into a sequence of calls against a web chat backend whose state
//! machine is a `parent_id`-chained conversation, not a stateless replay of
//! the full message array.

mod reconcile;
mod sse_lines;
mod state;

pub mod provider;

pub use provider::QwenWebProvider;
pub use state::TurnState;
