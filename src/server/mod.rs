//! # Server Module
//!
//! Serves the browser chat page and binds each user turn to
//! [`ChatRelay::send`]. Endpoints:
//!
//! - `GET  /`          chat page
//! - `GET  /api/info`  title, description and example prompts
//! - `GET  /health`    liveness plus backend reachability
//! - `POST /api/chat`  one turn, streamed back as server-sent events
//!
//! `POST /api/chat` emits one `partial` event per update whose data is the
//! JSON-encoded response text so far (the page replaces, not appends). If
//! the turn fails an `error` event with `{kind, message}` is sent and the
//! stream closes. A browser disconnect drops the relay stream, which closes
//! the backend connection.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::inference::InferenceError;
use crate::relay::ChatRelay;
use crate::settings::AppSettings;

const INDEX_HTML: &str = include_str!("index.html");

// ─── Wire Types ──────────────────────────────────────────────────────────────

/// Static page details, rendered by the chat page header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub title: String,
    /// May contain inline HTML (`<br>` between hardware and model).
    pub description: String,
    pub examples: Vec<String>,
}

impl PageInfo {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            title: settings.client.title.clone(),
            description: settings.description(),
            examples: settings.client.examples.clone(),
        }
    }
}

/// One user turn as posted by the chat page.
#[derive(Debug, Deserialize)]
pub struct ChatTurn {
    pub message: String,
    /// Sent by the page for widget compatibility; each turn is independent,
    /// so it is never read.
    #[serde(default)]
    pub history: serde_json::Value,
}

/// Health endpoint response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend_reachable: bool,
}

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared, read-only server state.
#[derive(Clone)]
pub struct ServerState {
    pub relay: Arc<ChatRelay>,
    pub page: Arc<PageInfo>,
}

impl ServerState {
    pub fn new(relay: ChatRelay, page: PageInfo) -> Self {
        Self {
            relay: Arc::new(relay),
            page: Arc::new(page),
        }
    }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the application router.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/info", get(page_info))
        .route("/api/chat", post(chat))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: ServerState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn page_info(State(state): State<ServerState>) -> Json<PageInfo> {
    Json(state.page.as_ref().clone())
}

async fn health_check(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend_reachable: state.relay.backend_healthy().await,
    })
}

async fn chat(
    State(state): State<ServerState>,
    Json(turn): Json<ChatTurn>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let turn_id = Uuid::new_v4();
    tracing::info!(
        turn_id = %turn_id,
        message_chars = turn.message.chars().count(),
        "chat turn started"
    );

    let events = state
        .relay
        .send(&turn.message)
        .map(move |item| Ok(turn_event(turn_id, item)));

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Convert one relay item to an SSE event.
fn turn_event(turn_id: Uuid, item: Result<String, InferenceError>) -> Event {
    match item {
        Ok(prefix) => Event::default()
            .event("partial")
            .data(serde_json::Value::String(prefix).to_string()),
        Err(e) => {
            tracing::warn!(
                turn_id = %turn_id,
                kind = e.kind(),
                error = %e,
                "chat turn failed"
            );
            let payload = serde_json::json!({
                "kind": e.kind(),
                "message": e.to_string(),
            });
            Event::default().event("error").data(payload.to_string())
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
