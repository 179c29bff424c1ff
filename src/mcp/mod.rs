//! Model Context Protocol (MCP) server implementation
//!
//! Provides a JSON-RPC 2.0 server exposing the conversation memory as two
//! tools, reachable over stdio or HTTP + SSE.

pub mod protocol;
pub mod server;
pub mod sse;
pub mod tools;

pub use protocol::{CallToolResult, ContentBlock, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::{run_stdio, serve_stream, Dispatcher, McpServer};
pub use sse::{serve_listener, serve_sse};
pub use tools::{Tool, ToolHandler, TOOL_CATALOG};
