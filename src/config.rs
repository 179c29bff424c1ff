//! Server configuration
//!
//! Settings are layered, later sources winning:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`)
//! 3. `ZEP_*` environment variables (`ZEP_API_KEY`, `ZEP_PORT`, ...)
//! 4. Command-line overrides

use crate::client::{zep::MISSING_API_KEY_MESSAGE, ZepClientConfig};
use crate::error::{MemoryError, Result};
use crate::mcp::server::{DEFAULT_SESSION_ID, DEFAULT_USER_ID};
use crate::types::SessionKey;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Prefix of the environment variables read at startup
pub const ENV_PREFIX: &str = "ZEP";

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// MCP transport to serve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    Sse,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Stdio => "stdio",
            Transport::Sse => "sse",
        }
    }
}

impl FromStr for Transport {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "sse" => Ok(Transport::Sse),
            other => Err(MemoryError::Configuration(format!(
                "Unknown transport '{}', expected 'stdio' or 'sse'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub transport: Transport,

    /// Listen port, SSE only
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default = "default_session_id")]
    pub session_id: String,

    /// Per-request timeout for the remote API
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_base_url() -> String {
    crate::client::zep::DEFAULT_BASE_URL.to_string()
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            port: DEFAULT_PORT,
            api_key: None,
            base_url: default_base_url(),
            user_id: default_user_id(),
            session_id: default_session_id(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub transport: Option<Transport>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl ServerConfig {
    /// Resolve settings from file, environment and overrides
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .set_override_option(
                "transport",
                overrides.transport.map(|t| t.as_str().to_string()),
            )?
            .set_override_option("port", overrides.port.map(i64::from))?
            .set_override_option("api_key", overrides.api_key.clone())?
            .set_override_option("base_url", overrides.base_url.clone())?
            .build()?;

        let settings: ServerConfig = config.try_deserialize()?;
        debug!(
            "Resolved configuration: transport={}, port={}, session={}",
            settings.transport, settings.port, settings.session_id
        );
        Ok(settings)
    }

    /// The API key, or the startup error when it is missing or blank
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(MemoryError::Configuration(MISSING_API_KEY_MESSAGE.to_string())),
        }
    }

    /// Conversation session served by the MCP tools
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.session_id.clone(), self.user_id.clone())
    }

    /// Client settings for the remote API
    pub fn client_config(&self) -> Result<ZepClientConfig> {
        let mut client = ZepClientConfig::new(self.require_api_key()?);
        client.base_url = self.base_url.clone();
        client.timeout = Duration::from_secs(self.timeout_secs);
        Ok(client)
    }
}
