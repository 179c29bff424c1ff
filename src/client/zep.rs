//! HTTP client for the hosted Zep memory API

use super::MemoryBackend;
use crate::error::{MemoryError, Result};
use crate::types::{Memory, Message, Session, User};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default Zep Cloud API root
pub const DEFAULT_BASE_URL: &str = "https://api.getzep.com/api/v2";

/// Message shown when no API key was supplied
pub const MISSING_API_KEY_MESSAGE: &str = "Zep API key not found. Please specify your Zep API key.";

/// Configuration for the Zep client
#[derive(Debug, Clone)]
pub struct ZepClientConfig {
    /// Zep project API key
    pub api_key: String,

    /// API root, without trailing slash
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl ZepClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Zep memory API client
pub struct ZepClient {
    api_key: String,
    base_url: Url,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    session_id: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct AddMemoryRequest<'a> {
    messages: &'a [Message],
}

impl ZepClient {
    /// Create a new client, failing if the API key is empty
    pub fn new(config: ZepClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(MemoryError::Configuration(MISSING_API_KEY_MESSAGE.to_string()));
        }

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            MemoryError::Configuration(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MemoryError::Configuration(format!(
                "Invalid base URL '{}'",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            api_key: config.api_key,
            base_url,
            client,
        })
    }

    /// Build an endpoint URL, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Api-Key {}", self.api_key))
    }

    /// Send a request where HTTP 404 means "absent"
    async fn send_optional<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let response = self.authorized(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::parse(response).await.map(Some)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authorized(request).send().await?;
        Self::parse(response).await
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(MemoryError::RemoteFailure {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MemoryBackend for ZepClient {
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        debug!("GET session {}", session_id);
        let url = self.endpoint(&["sessions", session_id]);
        self.send_optional(self.client.get(url)).await
    }

    async fn add_session(&self, session_id: &str, user_id: &str) -> Result<Session> {
        debug!("Creating session {} for user {}", session_id, user_id);
        let url = self.endpoint(&["sessions"]);
        let body = CreateSessionRequest {
            session_id,
            user_id,
        };
        self.send(self.client.post(url).json(&body)).await
    }

    async fn add_messages(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        debug!("Adding {} message(s) to session {}", messages.len(), session_id);
        let url = self.endpoint(&["sessions", session_id, "memory"]);
        let body = AddMemoryRequest { messages };
        let response = self.authorized(self.client.post(url).json(&body)).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get_memory(&self, session_id: &str) -> Result<Option<Memory>> {
        debug!("GET memory for session {}", session_id);
        let url = self.endpoint(&["sessions", session_id, "memory"]);
        self.send_optional(self.client.get(url)).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        debug!("GET user {}", user_id);
        let url = self.endpoint(&["users", user_id]);
        self.send_optional(self.client.get(url)).await
    }
}
