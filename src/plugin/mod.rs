//! Plugin tool surface
//!
//! Hosts that drive tools by name with per-call credentials and parameters use
//! this module instead of MCP. Unlike the MCP tools, every call names its own
//! session and user.

pub mod provider;
pub mod tools;

use crate::client::{MemoryBackend, ZepClient, ZepClientConfig};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub use provider::{ZepMemoryProvider, PROBE_USER_ID};
pub use tools::{AddMemoryTool, GetMemoryTool, PluginTool};

/// Credentials configured for the provider (`api_key`)
pub type Credentials = HashMap<String, String>;

/// Parameters of one tool invocation
pub type ToolParameters = Map<String, Value>;

/// Message yielded by a plugin tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "lowercase")]
pub enum ToolInvokeMessage {
    Text(String),
}

impl ToolInvokeMessage {
    pub fn text(text: impl Into<String>) -> Self {
        ToolInvokeMessage::Text(text.into())
    }

    pub fn as_text(&self) -> &str {
        match self {
            ToolInvokeMessage::Text(text) => text,
        }
    }
}

/// Opens a backend for the API key supplied with a call
pub trait BackendConnector: Send + Sync {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn MemoryBackend>>;
}

/// Connector for the hosted Zep API
#[derive(Debug, Clone)]
pub struct ZepConnector {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ZepConnector {
    fn default() -> Self {
        let defaults = ZepClientConfig::new(String::new());
        Self {
            base_url: defaults.base_url,
            timeout: defaults.timeout,
        }
    }
}

impl BackendConnector for ZepConnector {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn MemoryBackend>> {
        let mut config = ZepClientConfig::new(api_key);
        config.base_url = self.base_url.clone();
        config.timeout = self.timeout;
        Ok(Arc::new(ZepClient::new(config)?))
    }
}

/// String parameter, empty when absent or null
pub(crate) fn string_param(params: &ToolParameters, name: &str) -> String {
    match params.get(name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryError;
    use serde_json::json;

    #[test]
    fn test_string_param_defaults_to_empty() {
        let params = json!({"session_id": "s1", "user_id": null, "count": 3});
        let params = params.as_object().unwrap();
        assert_eq!(string_param(params, "session_id"), "s1");
        assert_eq!(string_param(params, "user_id"), "");
        assert_eq!(string_param(params, "content"), "");
        assert_eq!(string_param(params, "count"), "3");
    }

    #[test]
    fn test_invoke_message_shape() {
        let value = serde_json::to_value(ToolInvokeMessage::text("done")).unwrap();
        assert_eq!(value, json!({"type": "text", "message": "done"}));
    }

    #[test]
    fn test_connector_rejects_empty_key() {
        let result = ZepConnector::default().connect("");
        assert!(matches!(result, Err(MemoryError::Configuration(_))));
    }
}
