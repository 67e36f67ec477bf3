use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::json;

/// The closed set of error kinds the gateway can surface. Every fallible
/// operation in every crate returns this type (or a `Result<T>` alias of it)
/// so the HTTP boundary has exactly one place that maps errors to responses.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("upstream auth failed: {0}")]
    UpstreamAuth(String),

    #[error("upstream network error: {0}")]
    UpstreamNetwork(String),

    #[error("upstream returned client error ({status}): {body}")]
    UpstreamClient { status: u16, body: String },

    #[error("upstream returned server error ({status}): {body}")]
    UpstreamServer { status: u16, body: String },

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The stable external code, matching the OpenAI-shaped error body's `code` field.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::NotFound(_) => "not-found",
            Error::Conflict(_) => "conflict",
            Error::UpstreamAuth(_) => "upstream/auth",
            Error::UpstreamNetwork(_) => "upstream/network",
            Error::UpstreamClient { .. } => "upstream/client",
            Error::UpstreamServer { .. } => "upstream/server",
            Error::Store(_) => "store",
            Error::Internal(_) => "internal",
        }
    }

    /// Log severity per the error handling design.
    pub fn severity(&self) -> &'static str {
        match self {
            Error::Store(_) => "error",
            Error::Internal(_) => "fatal",
            Error::UpstreamAuth(_)
            | Error::UpstreamNetwork(_)
            | Error::UpstreamClient { .. }
            | Error::UpstreamServer { .. } => "error",
            Error::Validation(_) | Error::NotFound(_) | Error::Conflict(_) => "warn",
        }
    }

    /// `error_type` bucket for `ErrorRecord`.
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::UpstreamAuth(_)
            | Error::UpstreamNetwork(_)
            | Error::UpstreamClient { .. }
            | Error::UpstreamServer { .. } => "upstream",
            Error::Store(_) => "store",
            Error::Validation(_) => "validation",
            Error::NotFound(_) | Error::Conflict(_) => "lifecycle",
            Error::Internal(_) => "streaming",
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Store(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Error::UpstreamNetwork(e.to_string())
        } else {
            Error::Internal(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Validation(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::UpstreamAuth(_)
            | Error::UpstreamNetwork(_)
            | Error::UpstreamClient { .. }
            | Error::UpstreamServer { .. } => StatusCode::BAD_GATEWAY,
            Error::Store(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({
            "error": {
                "message": self.to_string(),
                "type": self.error_type(),
                "code": self.code(),
            }
        });
        (status, Json(body)).into_response()
    }
}
