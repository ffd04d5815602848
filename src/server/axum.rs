//! Axum router and SSE encoding

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use super::SseOptions;
use crate::context::Context;
use crate::error::{AudifyError, Result};
use crate::service::{AudifyService, SearchReply, SearchRpcRequest, ShutdownReply, VersionReply};

#[derive(Clone)]
struct AppState {
    service: Arc<AudifyService>,
    opts: SseOptions,
}

/// Build the router for `service`.
pub fn router(service: Arc<AudifyService>, opts: SseOptions) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/shutdown", post(shutdown))
        .route("/version", get(version))
        .with_state(AppState { service, opts })
}

/// Serve until the service's shutdown signal fires, then drain gracefully.
pub async fn serve(listener: TcpListener, service: Arc<AudifyService>, opts: SseOptions) -> Result<()> {
    let shutdown = service.shutdown_signal().clone();
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(target: "audify::service", %addr, "listening");
    }

    axum::serve(listener, router(service, opts))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

    tracing::info!(target: "audify::service", "server stopped");
    Ok(())
}

async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRpcRequest>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>> + Send> {
    let (mut tx, rx) = mpsc::channel::<Result<SearchReply>>(1);
    let ctx = Context::background();

    let service = state.service.clone();
    let task_ctx = ctx.clone();
    tokio::spawn(async move {
        if let Err(error) = service.search(&task_ctx, req, &mut tx).await {
            if !matches!(error, AudifyError::StreamClosed(_)) {
                let _ = mpsc::Sender::send(&tx, Err(error)).await;
            }
        }
    });

    to_sse_response(rx, ctx, state.opts)
}

async fn shutdown(State(state): State<AppState>) -> Json<ShutdownReply> {
    Json(state.service.shutdown())
}

async fn version(State(state): State<AppState>) -> Json<VersionReply> {
    Json(state.service.version())
}

/// Cancels the search context when the response stream is dropped.
struct CancelOnDrop(Context);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Encode search replies as SSE.
///
/// Each reply becomes an `item` event with the reply as JSON. The first
/// error becomes an `error` event (masked per `opts`) and ends the stream.
/// Dropping the response, for instance because the caller disconnected,
/// cancels `ctx`.
pub fn to_sse_response(
    mut rx: mpsc::Receiver<Result<SearchReply>>,
    ctx: Context,
    opts: SseOptions,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>> + Send> {
    let guard = CancelOnDrop(ctx);

    let events = async_stream::stream! {
        let _guard = guard;
        while let Some(item) = rx.recv().await {
            match item {
                Ok(reply) => {
                    let data = serde_json::to_string(&reply).unwrap_or_else(|_| "{}".to_string());
                    yield Ok(Event::default().event("item").data(data));
                }
                Err(error) => {
                    let data = serde_json::json!({ "error": opts.render_error(&error) });
                    yield Ok(Event::default().event("error").data(data.to_string()));
                    break;
                }
            }
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}
