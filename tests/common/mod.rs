//! Common test utilities and helpers
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use zep_memory::{
    McpServer, Memory, MemoryBackend, Message, Result, Session, SessionKey, User, ZepClient,
    ZepClientConfig,
};

pub const TEST_API_KEY: &str = "z_test_key";

#[derive(Debug, Clone)]
struct StoredSession {
    user_id: String,
    messages: Vec<Message>,
}

/// In-memory stand-in for the remote memory service
///
/// The memory context is the session's messages, one `role: content` per line.
#[derive(Default)]
pub struct FakeZep {
    sessions: Mutex<HashMap<String, StoredSession>>,
    users: Mutex<Vec<String>>,
    creates: AtomicUsize,
}

impl FakeZep {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of sessions created so far
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Messages stored for a session
    pub fn messages(&self, session_id: &str) -> Vec<Message> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    /// Owner recorded when the session was created
    pub fn owner(&self, session_id: &str) -> Option<String> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .map(|s| s.user_id.clone())
    }

    pub fn add_user(&self, user_id: &str) {
        self.users.lock().unwrap().push(user_id.to_string());
    }

    fn session(&self, session_id: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(session_id).map(|s| Session {
            session_id: session_id.to_string(),
            user_id: Some(s.user_id.clone()),
            created_at: None,
        })
    }

    fn create(&self, session_id: &str, user_id: &str) -> Session {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().unwrap().insert(
            session_id.to_string(),
            StoredSession {
                user_id: user_id.to_string(),
                messages: Vec::new(),
            },
        );
        Session {
            session_id: session_id.to_string(),
            user_id: Some(user_id.to_string()),
            created_at: None,
        }
    }

    fn append(&self, session_id: &str, messages: &[Message]) -> bool {
        match self.sessions.lock().unwrap().get_mut(session_id) {
            Some(session) => {
                session.messages.extend_from_slice(messages);
                true
            }
            None => false,
        }
    }

    fn memory(&self, session_id: &str) -> Option<Memory> {
        self.sessions.lock().unwrap().get(session_id).map(|s| {
            let lines: Vec<String> = s
                .messages
                .iter()
                .map(|m| format!("{}: {}", m.role_type, m.content))
                .collect();
            Memory {
                context: Some(lines.join("\n")),
            }
        })
    }

    fn user(&self, user_id: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.as_str() == user_id)
            .map(|u| User { user_id: u.clone() })
    }
}

#[async_trait]
impl MemoryBackend for FakeZep {
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.session(session_id))
    }

    async fn add_session(&self, session_id: &str, user_id: &str) -> Result<Session> {
        Ok(self.create(session_id, user_id))
    }

    async fn add_messages(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        self.append(session_id, messages);
        Ok(())
    }

    async fn get_memory(&self, session_id: &str) -> Result<Option<Memory>> {
        Ok(self.memory(session_id))
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.user(user_id))
    }
}

/// MCP server over a fresh fake backend, bound to the default session
pub fn create_test_server() -> (Arc<McpServer>, Arc<FakeZep>) {
    let backend = FakeZep::new();
    let server = McpServer::with_backend(
        backend.clone(),
        SessionKey::new("claude_session", "claude_user"),
    );
    (Arc::new(server), backend)
}

// Mock of the Zep HTTP API, backed by a FakeZep

#[derive(Deserialize)]
struct CreateSessionBody {
    session_id: String,
    user_id: String,
}

#[derive(Deserialize)]
struct AddMemoryBody {
    messages: Vec<Message>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Api-Key {}", TEST_API_KEY))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "invalid api key").into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

async fn get_session(
    State(fake): State<Arc<FakeZep>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match fake.session(&id) {
        Some(session) => Json(session).into_response(),
        None => not_found(),
    }
}

async fn create_session(
    State(fake): State<Arc<FakeZep>>,
    headers: HeaderMap,
    Json(body): Json<CreateSessionBody>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(fake.create(&body.session_id, &body.user_id)).into_response()
}

async fn add_memory(
    State(fake): State<Arc<FakeZep>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<AddMemoryBody>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if fake.append(&id, &body.messages) {
        Json(serde_json::json!({"message": "OK"})).into_response()
    } else {
        not_found()
    }
}

async fn get_memory(
    State(fake): State<Arc<FakeZep>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match fake.memory(&id) {
        Some(memory) => Json(memory).into_response(),
        None => not_found(),
    }
}

async fn get_user(
    State(fake): State<Arc<FakeZep>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match fake.user(&id) {
        Some(user) => Json(user).into_response(),
        None => not_found(),
    }
}

/// Start a mock Zep API on a random port, returning its base URL
pub async fn spawn_mock_zep(fake: Arc<FakeZep>) -> String {
    let app = Router::new()
        .route("/api/v2/sessions", axum::routing::post(create_session))
        .route("/api/v2/sessions/:id", get(get_session))
        .route("/api/v2/sessions/:id/memory", get(get_memory).post(add_memory))
        .route("/api/v2/users/:id", get(get_user))
        .with_state(fake);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api/v2", addr)
}

/// Client pointed at a mock API
pub fn create_test_client(base_url: &str, api_key: &str) -> ZepClient {
    let mut config = ZepClientConfig::new(api_key);
    config.base_url = base_url.to_string();
    ZepClient::new(config).unwrap()
}
