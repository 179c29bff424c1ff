//! MCP server and stream transport
//!
//! Implements the JSON-RPC 2.0 dispatch shared by every connection, plus the
//! newline-delimited transport used over stdin/stdout.

use super::protocol::{CallToolParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use super::tools::ToolHandler;
use crate::client::MemoryBackend;
use crate::error::Result;
use crate::memory::MemoryFacade;
use crate::types::SessionKey;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

/// Protocol revision this server speaks
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Revisions accepted from clients during `initialize`
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[PROTOCOL_VERSION];

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "zep";

/// User that owns the conversation session
pub const DEFAULT_USER_ID: &str = "claude_user";

/// Session every tool call reads and writes
pub const DEFAULT_SESSION_ID: &str = "claude_session";

/// MCP server shared by all connections
pub struct McpServer {
    tool_handler: ToolHandler,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tool_handler: ToolHandler) -> Self {
        Self { tool_handler }
    }

    /// Build a server over a backend, bound to one conversation session
    pub fn with_backend(backend: Arc<dyn MemoryBackend>, session: SessionKey) -> Self {
        Self::new(ToolHandler::new(MemoryFacade::new(backend), session))
    }

    /// Session every tool call of this server operates on
    pub fn session(&self) -> &SessionKey {
        self.tool_handler.session()
    }

    /// Start a fresh dispatcher for one connection
    pub fn dispatcher(self: &Arc<Self>) -> Dispatcher {
        Dispatcher {
            server: Arc::clone(self),
            initialized: false,
        }
    }
}

/// Per-connection request dispatcher
///
/// Tracks the handshake: `tools/list` and `tools/call` are refused until the
/// client has sent `initialize`.
pub struct Dispatcher {
    server: Arc<McpServer>,
    initialized: bool,
}

impl Dispatcher {
    /// Whether `initialize` has been received on this connection
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Process one raw message, returning the response to send (if any)
    pub async fn handle_message(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse message: {}", e);
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
                ));
            }
        };

        let id = value.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
                ));
            }
        };

        self.handle_request(request).await
    }

    /// Route a parsed request to its handler
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        debug!("Handling {}", request.method);

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" | "tools/call" if !self.initialized => JsonRpcResponse::error(
                request.id,
                JsonRpcError::not_initialized(&request.method),
            ),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            _ => JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(&request.method)),
        };

        Some(response)
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => {
                debug!("Client finished initialization");
            }
            "notifications/cancelled" => {
                debug!("Client cancelled request: {}", request.params);
            }
            other => debug!("Ignoring notification: {}", other),
        }
    }

    fn handle_initialize(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let requested = request
            .params
            .get("protocolVersion")
            .and_then(Value::as_str);

        let protocol_version = match requested {
            Some(version) if SUPPORTED_PROTOCOL_VERSIONS.contains(&version) => version,
            Some(version) => {
                info!(
                    "Client requested protocol {}, answering with {}",
                    version, PROTOCOL_VERSION
                );
                PROTOCOL_VERSION
            }
            None => PROTOCOL_VERSION,
        };

        self.initialized = true;
        info!("Initialized MCP connection ({})", protocol_version);

        JsonRpcResponse::success(
            request.id,
            json!({
                "protocolVersion": protocol_version,
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": { "listChanged": false }
                }
            }),
        )
    }

    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tools = self.server.tool_handler.list_tools();
        JsonRpcResponse::success(request.id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: CallToolParams = match serde_json::from_value(request.params) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                );
            }
        };

        match self
            .server
            .tool_handler
            .execute(&params.name, params.arguments)
            .await
        {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(request.id, value),
                Err(e) => JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::internal_error(format!("Serialization error: {}", e)),
                ),
            },
            Err(e) => {
                error!("Tool {} failed: {}", params.name, e);
                JsonRpcResponse::error(request.id, JsonRpcError::from(&e))
            }
        }
    }
}

/// Serve newline-delimited JSON-RPC over a reader/writer pair
///
/// Returns when the peer closes the stream. Read and write failures end the
/// connection without being reported as errors.
pub async fn serve_stream<R, W>(server: Arc<McpServer>, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut dispatcher = server.dispatcher();
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => {
                debug!("Received EOF, closing connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to read message: {}", e);
                break;
            }
        }

        // A bad frame is answered, not fatal
        let response = match std::str::from_utf8(&buffer) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                debug!("Received message: {}", line);
                dispatcher.handle_message(line).await
            }
            Err(e) => {
                warn!("Received message that is not UTF-8: {}", e);
                Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Invalid UTF-8: {}", e)),
                ))
            }
        };

        let Some(response) = response else {
            continue;
        };

        let mut payload = match serde_json::to_string(&response) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                continue;
            }
        };
        payload.push('\n');

        if let Err(e) = write_frame(&mut writer, payload.as_bytes()).await {
            error!("Failed to write response: {}", e);
            break;
        }
    }

    Ok(())
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> std::io::Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await
}

/// Serve MCP over stdin/stdout until stdin closes
pub async fn run_stdio(server: Arc<McpServer>) -> Result<()> {
    info!("MCP server started, listening on stdin...");
    serve_stream(server, tokio::io::stdin(), tokio::io::stdout()).await?;
    info!("MCP server shutting down");
    Ok(())
}
