//! Plugin tools: `add-memory` and `get-memory`
//!
//! Each invocation yields exactly one text message.

use super::{string_param, ToolInvokeMessage, ToolParameters};
use crate::client::MemoryBackend;
use crate::error::{MemoryError, Result};
use crate::memory::MemoryFacade;
use crate::types::SessionKey;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A tool invocable through the plugin surface
#[async_trait]
pub trait PluginTool: Send + Sync {
    /// Tool name as registered with the host
    fn name(&self) -> &'static str;

    /// Run the tool against a backend opened with the caller's credentials
    async fn invoke(
        &self,
        backend: Arc<dyn MemoryBackend>,
        params: &ToolParameters,
    ) -> Result<Vec<ToolInvokeMessage>>;
}

/// Appends one message to the caller's session
pub struct AddMemoryTool;

#[async_trait]
impl PluginTool for AddMemoryTool {
    fn name(&self) -> &'static str {
        "add-memory"
    }

    async fn invoke(
        &self,
        backend: Arc<dyn MemoryBackend>,
        params: &ToolParameters,
    ) -> Result<Vec<ToolInvokeMessage>> {
        let session = SessionKey::new(
            string_param(params, "session_id"),
            string_param(params, "user_id"),
        );
        let role_type = string_param(params, "role_type");
        let content = string_param(params, "content");

        debug!("Plugin add-memory for session {}", session.session_id);

        let text = MemoryFacade::new(backend)
            .add_message(&session, &role_type, &content)
            .await
            .map_err(|e| match e {
                MemoryError::InvalidArgument(_) => e,
                other => MemoryError::MemoryWrite(other.to_string()),
            })?;

        Ok(vec![ToolInvokeMessage::text(text)])
    }
}

/// Fetches the memory context of the caller's session
pub struct GetMemoryTool;

#[async_trait]
impl PluginTool for GetMemoryTool {
    fn name(&self) -> &'static str {
        "get-memory"
    }

    async fn invoke(
        &self,
        backend: Arc<dyn MemoryBackend>,
        params: &ToolParameters,
    ) -> Result<Vec<ToolInvokeMessage>> {
        let session_id = string_param(params, "session_id");
        debug!("Plugin get-memory for session {}", session_id);

        let text = MemoryFacade::new(backend)
            .get_memory_text(&session_id)
            .await?;
        Ok(vec![ToolInvokeMessage::text(text)])
    }
}
