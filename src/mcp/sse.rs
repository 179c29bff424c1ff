//! HTTP + SSE transport for the MCP server
//!
//! `GET /sse` opens an event stream. Its first event is `endpoint`, naming the
//! URL the client must POST its JSON-RPC messages to. Responses come back on
//! the stream as `message` events.

use super::server::McpServer;
use crate::error::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event as SseEvent, KeepAlive},
        IntoResponse, Sse,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::{collections::HashMap, convert::Infallible, net::SocketAddr, sync::Arc};
use tokio::{
    net::TcpListener,
    sync::{mpsc, RwLock},
};
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt as _};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Path clients POST messages to
pub const MESSAGES_PATH: &str = "/messages/";

const CHANNEL_CAPACITY: usize = 32;

/// Open connections, keyed by the id handed out in the `endpoint` event
type ConnectionRegistry = Arc<RwLock<HashMap<Uuid, mpsc::Sender<String>>>>;

#[derive(Clone)]
struct SseState {
    server: Arc<McpServer>,
    connections: ConnectionRegistry,
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

/// Build the SSE router over a shared server
pub fn router(server: Arc<McpServer>) -> Router {
    let state = SseState {
        server,
        connections: Arc::new(RwLock::new(HashMap::new())),
    };

    Router::new()
        .route("/sse", get(sse_handler))
        .route(MESSAGES_PATH, post(message_handler))
        .route("/messages", post(message_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve MCP over SSE on `0.0.0.0:port`
pub async fn serve_sse(server: Arc<McpServer>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    serve_listener(server, listener).await
}

/// Serve MCP over SSE on an already bound listener
pub async fn serve_listener(server: Arc<McpServer>, listener: TcpListener) -> Result<()> {
    info!("MCP SSE server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(server)).await?;
    Ok(())
}

async fn sse_handler(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>> {
    let connection_id = Uuid::new_v4();
    let (inbound_tx, inbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel::<SseEvent>(CHANNEL_CAPACITY);

    state
        .connections
        .write()
        .await
        .insert(connection_id, inbound_tx);

    let endpoint = format!("{}?session_id={}", MESSAGES_PATH, connection_id.simple());
    if outbound_tx
        .send(SseEvent::default().event("endpoint").data(endpoint))
        .await
        .is_err()
    {
        warn!("SSE client {} left before the endpoint event", connection_id);
    }

    info!("SSE client connected: {}", connection_id);
    tokio::spawn(run_connection(state, connection_id, inbound_rx, outbound_tx));

    let stream = ReceiverStream::new(outbound_rx).map(Ok::<_, Infallible>);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Dispatch one connection's messages until its stream is dropped
async fn run_connection(
    state: SseState,
    connection_id: Uuid,
    mut inbound_rx: mpsc::Receiver<String>,
    outbound_tx: mpsc::Sender<SseEvent>,
) {
    let mut dispatcher = state.server.dispatcher();

    loop {
        tokio::select! {
            message = inbound_rx.recv() => {
                let Some(message) = message else {
                    break;
                };

                let Some(response) = dispatcher.handle_message(&message).await else {
                    continue;
                };

                let payload = match serde_json::to_string(&response) {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!("Failed to serialize response: {}", e);
                        continue;
                    }
                };

                if outbound_tx
                    .send(SseEvent::default().event("message").data(payload))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            _ = outbound_tx.closed() => break,
        }
    }

    state.connections.write().await.remove(&connection_id);
    info!("SSE client disconnected: {}", connection_id);
}

async fn message_handler(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> impl IntoResponse {
    let Some(raw_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "session_id is required");
    };

    let Ok(connection_id) = Uuid::parse_str(&raw_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid session ID");
    };

    let Some(sender) = state.connections.read().await.get(&connection_id).cloned() else {
        debug!("Message for unknown connection {}", connection_id);
        return (StatusCode::NOT_FOUND, "Could not find session");
    };

    if serde_json::from_str::<Value>(&body).is_err() {
        return (StatusCode::BAD_REQUEST, "Could not parse message");
    }

    if sender.send(body).await.is_err() {
        return (StatusCode::NOT_FOUND, "Could not find session");
    }

    (StatusCode::ACCEPTED, "Accepted")
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
