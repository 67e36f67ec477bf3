//! Pure turn-reconciliation and request-translation logic. No I/O: the
//! adapter does the DB/session lookups and hands the results here so this
//! module stays unit-testable without a runtime.

use gw_domain::error::{Error, Result};
use gw_providers::traits::ChatMessage;

/// What to submit to the upstream for this turn.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmissionPlan {
    /// Submit `text` directly against the given (possibly absent) chain.
    Direct {
        text: String,
        parent_id: Option<String>,
        chat_id: Option<String>,
    },
    /// Replay `flattened_prefix` first (parent_id = None, starting a fresh
    /// chain), then submit `final_text` against whatever `parent_id`
    /// upstream returns for that replay turn.
    ReplayThenFinal { flattened_prefix: String, final_text: String },
}

/// The effective text of `messages[index]`: if immediately preceded by a
/// system message, its content is prepended, separated by a blank line.
fn effective_text(messages: &[ChatMessage], index: usize) -> String {
    let current = &messages[index];
    if index > 0 && messages[index - 1].role == "system" {
        format!("{}\n\n{}", messages[index - 1].content, current.content)
    } else {
        current.content.clone()
    }
}

/// Joins every message but the last as `"{role}: {content}"` lines, in order.
fn flatten_prefix(messages: &[ChatMessage]) -> String {
    messages[..messages.len() - 1]
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Existing session fields relevant to reconciliation, read by the caller.
pub struct SessionState {
    pub message_count: i64,
    pub chat_id: Option<String>,
    pub parent_id: Option<String>,
}

/// The result of a `continue_by_conversation` lookup, if attempted.
pub struct Continuation {
    pub chat_id: Option<String>,
    pub parent_id: Option<String>,
}

pub fn plan_submission(
    messages: &[ChatMessage],
    session: &SessionState,
    continued: Option<Continuation>,
) -> Result<SubmissionPlan> {
    if messages.is_empty() {
        return Err(Error::Validation("messages array is empty".into()));
    }

    if messages.len() == 1 {
        let (parent_id, chat_id) = if session.message_count == 0 {
            (session.parent_id.clone(), session.chat_id.clone())
        } else {
            (None, None)
        };
        return Ok(SubmissionPlan::Direct {
            text: effective_text(messages, 0),
            parent_id,
            chat_id,
        });
    }

    let final_text = effective_text(messages, messages.len() - 1);

    match continued {
        Some(c) => Ok(SubmissionPlan::Direct {
            text: final_text,
            parent_id: c.parent_id,
            chat_id: c.chat_id,
        }),
        None => Ok(SubmissionPlan::ReplayThenFinal {
            flattened_prefix: flatten_prefix(messages),
            final_text,
        }),
    }
}

/// The first user message in `M`, used to compute `session_id`.
pub fn first_user_message(messages: &[ChatMessage]) -> Result<&str> {
    messages
        .iter()
        .find(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .ok_or_else(|| Error::Validation("no user message in request".into()))
}

/// The first assistant message in `M`, used to compute `conversation_hash`.
pub fn first_assistant_message(messages: &[ChatMessage]) -> Option<&str> {
    messages.iter().find(|m| m.role == "assistant").map(|m| m.content.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: &str, content: &str) -> ChatMessage {
        ChatMessage { role: role.to_string(), content: content.to_string() }
    }

    #[test]
    fn single_message_new_session_submits_direct_with_no_chain() {
        let messages = vec![msg("user", "hello")];
        let session = SessionState { message_count: 0, chat_id: None, parent_id: None };
        let plan = plan_submission(&messages, &session, None).unwrap();
        assert_eq!(
            plan,
            SubmissionPlan::Direct { text: "hello".into(), parent_id: None, chat_id: None }
        );
    }

    #[test]
    fn single_message_replay_of_active_session_treated_as_new() {
        let messages = vec![msg("user", "hello")];
        let session = SessionState {
            message_count: 3,
            chat_id: Some("chat-1".into()),
            parent_id: Some("p-1".into()),
        };
        let plan = plan_submission(&messages, &session, None).unwrap();
        assert_eq!(
            plan,
            SubmissionPlan::Direct { text: "hello".into(), parent_id: None, chat_id: None }
        );
    }

    #[test]
    fn system_message_merged_into_following_turn() {
        let messages = vec![msg("system", "be terse"), msg("user", "hi")];
        let session = SessionState { message_count: 0, chat_id: None, parent_id: None };
        let plan = plan_submission(&messages, &session, None).unwrap();
        match plan {
            SubmissionPlan::Direct { text, .. } => assert_eq!(text, "be terse\n\nhi"),
            _ => panic!("expected Direct"),
        }
    }

    #[test]
    fn multi_turn_hit_resumes_chain_with_only_final_message() {
        let messages = vec![msg("user", "first"), msg("assistant", "reply"), msg("user", "second")];
        let session = SessionState { message_count: 1, chat_id: Some("c".into()), parent_id: Some("p".into()) };
        let continued = Continuation { chat_id: Some("c".into()), parent_id: Some("p".into()) };
        let plan = plan_submission(&messages, &session, Some(continued)).unwrap();
        assert_eq!(
            plan,
            SubmissionPlan::Direct { text: "second".into(), parent_id: Some("p".into()), chat_id: Some("c".into()) }
        );
    }

    #[test]
    fn multi_turn_miss_replays_flattened_prefix() {
        let messages = vec![msg("user", "first"), msg("assistant", "reply"), msg("user", "second")];
        let session = SessionState { message_count: 0, chat_id: None, parent_id: None };
        let plan = plan_submission(&messages, &session, None).unwrap();
        assert_eq!(
            plan,
            SubmissionPlan::ReplayThenFinal {
                flattened_prefix: "user: first\nassistant: reply".into(),
                final_text: "second".into(),
            }
        );
    }

    #[test]
    fn empty_messages_is_validation_error() {
        let session = SessionState { message_count: 0, chat_id: None, parent_id: None };
        assert!(plan_submission(&[], &session, None).is_err());
    }
}
