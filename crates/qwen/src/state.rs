//! Per-request state machine. Not a persisted entity — recorded into the
//! request's `tracing::Span` for observability only.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Init,
    Authorized,
    SessionResolved,
    UpstreamOpen,
    Streaming,
    Finalised,
    AuthFailed,
    NetworkFailed,
    ClientCancelled,
}

impl TurnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnState::Init => "init",
            TurnState::Authorized => "authorized",
            TurnState::SessionResolved => "session_resolved",
            TurnState::UpstreamOpen => "upstream_open",
            TurnState::Streaming => "streaming",
            TurnState::Finalised => "finalised",
            TurnState::AuthFailed => "auth_failed",
            TurnState::NetworkFailed => "network_failed",
            TurnState::ClientCancelled => "client_cancelled",
        }
    }
}
