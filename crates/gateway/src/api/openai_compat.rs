//! OpenAI-compatible `/v1/chat/completions`.
//!
//! Accepts the request body verbatim (it's forwarded untouched by
//! pass-through providers) and returns either a buffered JSON completion or
//! a `text/event-stream` body. `gw_domain::stream::SseChunk` is already
//! fully framed (`"data: ...\n\n"`), so the streaming branch writes its
//! bytes straight into the response body rather than going through axum's
//! `Sse` wrapper, which would add its own framing on top.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use futures_util::Stream;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use gw_domain::error::Error;
use gw_domain::stream::SseChunk;

use crate::state::AppState;

pub async fn chat_completions(State(state): State<AppState>, Json(raw): Json<Value>) -> Response {
    let stream = raw.get("stream").and_then(Value::as_bool).unwrap_or(false);
    if stream {
        chat_completions_stream(state, raw).await
    } else {
        chat_completions_blocking(state, raw).await
    }
}

async fn chat_completions_blocking(state: AppState, raw: Value) -> Response {
    let cancel = CancellationToken::new();
    let span = tracing::info_span!("chat_completions");
    match state.dispatcher.chat_completions(raw, None, cancel, span).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn chat_completions_stream(state: AppState, raw: Value) -> Response {
    let (tx, mut rx) = mpsc::channel::<SseChunk>(32);
    let cancel = CancellationToken::new();
    let span = tracing::info_span!("chat_completions_stream");

    let dispatcher_cancel = cancel.clone();
    let error_tx = tx.clone();
    tokio::spawn(async move {
        if let Err(e) = state.dispatcher.chat_completions(raw, Some(tx), dispatcher_cancel, span).await {
            let _ = error_tx.send(error_chunk(&e)).await;
        }
    });

    let body_stream = async_stream::stream! {
        while let Some(chunk) = rx.recv().await {
            yield Ok::<_, Infallible>(Bytes::from(chunk.0));
        }
    };

    let body = CancelOnDrop { inner: Box::pin(body_stream), _guard: CancelGuard(cancel) };

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/event-stream")
        .header("cache-control", "no-cache")
        .body(Body::from_stream(body))
        .expect("static headers are always valid")
}

fn error_chunk(e: &Error) -> SseChunk {
    SseChunk::data(&serde_json::json!({
        "error": {
            "message": e.to_string(),
            "type": e.error_type(),
            "code": e.code(),
        }
    }))
}

/// Cancels the dispatcher's in-flight provider call when axum drops this
/// stream — the only signal available for "client disconnected".
struct CancelGuard(CancellationToken);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

struct CancelOnDrop {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, Infallible>> + Send>>,
    _guard: CancelGuard,
}

impl Stream for CancelOnDrop {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
