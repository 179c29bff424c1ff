//! Zep Memory - conversational memory for LLM agents
//!
//! Wraps the hosted Zep memory service and exposes it two ways:
//! - an MCP tool server (`add-memory`, `get-memory`) over stdio or HTTP + SSE
//! - plugin tools driven by name with per-call credentials
//!
//! # Architecture
//!
//! - **Types**: messages, sessions and the text rendering of memory
//! - **Client**: the remote API behind the [`MemoryBackend`] trait
//! - **Memory**: the session-aware façade both surfaces share
//! - **MCP**: JSON-RPC dispatch and its transports
//! - **Plugin**: credential validation and plugin tools
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zep_memory::{McpServer, SessionKey, ZepClient, ZepClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ZepClient::new(ZepClientConfig::new("z_api_key"))?;
//!     let server = McpServer::with_backend(
//!         Arc::new(client),
//!         SessionKey::new("claude_session", "claude_user"),
//!     );
//!     zep_memory::mcp::run_stdio(Arc::new(server)).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod memory;
pub mod plugin;
pub mod types;

// Re-export commonly used types
pub use client::{MemoryBackend, ZepClient, ZepClientConfig};
pub use config::{ConfigOverrides, ServerConfig, Transport};
pub use error::{MemoryError, Result};
pub use mcp::{McpServer, ToolHandler};
pub use memory::MemoryFacade;
pub use plugin::{ToolInvokeMessage, ZepMemoryProvider};
pub use types::{Memory, MemoryData, Message, RoleType, Session, SessionKey, User};
