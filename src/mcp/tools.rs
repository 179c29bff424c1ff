//! MCP tool catalog and dispatch
//!
//! Two tools are exposed:
//! - `add-memory`: append one message to the conversation memory
//! - `get-memory`: fetch the memory context for the conversation
//!
//! The catalog is immutable for the lifetime of the process.

use super::protocol::CallToolResult;
use crate::error::{MemoryError, Result};
use crate::memory::MemoryFacade;
use crate::types::{RoleType, SessionKey};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const ADD_MEMORY: &str = "add-memory";
pub const GET_MEMORY: &str = "get-memory";

const ADD_MEMORY_DESCRIPTION: &str = "Add a single message to the conversation memory. Follow this exact workflow:
1. When you receive a user message, IMMEDIATELY call this tool with the user's message
2. Call get-memory to retrieve context
3. Generate your response
4. Call this tool again with your response

Format the message as:
- For user messages: {\"role_type\": \"user\", \"content\": \"<their message>\"}
- For your responses: {\"role_type\": \"assistant\", \"content\": \"<your message>\"}";

const GET_MEMORY_DESCRIPTION: &str = "Retrieve conversation memory and context.
You MUST call this tool:
1. AFTER saving the user's message with add-memory
2. BEFORE generating your response

This ensures you have full context before responding.";

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (e.g., "add-memory")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl Tool {
    /// Check arguments against the `required`, `type: string` and `enum` rules
    /// of the input schema
    pub fn validate_arguments(&self, arguments: &Map<String, Value>) -> Result<()> {
        let properties = self.input_schema.get("properties").and_then(Value::as_object);
        let required = self
            .input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for field in required.iter().filter_map(Value::as_str) {
            if !arguments.contains_key(field) {
                return Err(MemoryError::InvalidArgument(format!(
                    "Missing required argument: {}",
                    field
                )));
            }
        }

        let Some(properties) = properties else {
            return Ok(());
        };

        for (field, value) in arguments {
            let Some(schema) = properties.get(field) else {
                continue;
            };

            if schema.get("type").and_then(Value::as_str) == Some("string") && !value.is_string() {
                return Err(MemoryError::InvalidArgument(format!(
                    "Argument '{}' must be a string, got: {}",
                    field, value
                )));
            }

            if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
                if !allowed.contains(value) {
                    return Err(MemoryError::InvalidArgument(format!(
                        "Invalid value for '{}': {}",
                        field, value
                    )));
                }
            }
        }

        Ok(())
    }
}

/// The process-wide tool catalog
pub static TOOL_CATALOG: Lazy<Vec<Tool>> = Lazy::new(|| {
    let roles: Vec<&str> = RoleType::ALL.iter().map(RoleType::as_str).collect();

    vec![
        Tool {
            name: ADD_MEMORY.to_string(),
            description: ADD_MEMORY_DESCRIPTION.to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "role_type": {
                        "type": "string",
                        "enum": roles,
                        "description": "The role of the message sender (required)"
                    },
                    "content": {
                        "type": "string",
                        "description": "The exact message content"
                    }
                },
                "required": ["role_type", "content"]
            }),
        },
        Tool {
            name: GET_MEMORY.to_string(),
            description: GET_MEMORY_DESCRIPTION.to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
});

/// Look up a tool by name
pub fn find_tool(name: &str) -> Option<&'static Tool> {
    TOOL_CATALOG.iter().find(|tool| tool.name == name)
}

/// Tool handler that validates and dispatches calls to the façade
///
/// Every call operates on the one session fixed at construction.
pub struct ToolHandler {
    memory: MemoryFacade,
    session: SessionKey,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(memory: MemoryFacade, session: SessionKey) -> Self {
        Self { memory, session }
    }

    /// Session every call reads and writes
    pub fn session(&self) -> &SessionKey {
        &self.session
    }

    /// Get list of all available tools
    pub fn list_tools(&self) -> &'static [Tool] {
        TOOL_CATALOG.as_slice()
    }

    /// Validate and execute a tool call
    pub async fn execute(&self, tool_name: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        let Some(tool) = find_tool(tool_name) else {
            warn!("Unknown tool: {}", tool_name);
            return Err(MemoryError::UnknownTool(tool_name.to_string()));
        };

        let arguments = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(MemoryError::InvalidArgument(format!(
                    "Arguments must be an object, got: {}",
                    other
                )))
            }
        };
        tool.validate_arguments(&arguments)?;

        debug!("Executing tool: {}", tool_name);

        match tool.name.as_str() {
            ADD_MEMORY => self.add_memory(&arguments).await,
            GET_MEMORY => self.get_memory().await,
            _ => Err(MemoryError::UnknownTool(tool_name.to_string())),
        }
    }

    async fn add_memory(&self, arguments: &Map<String, Value>) -> Result<CallToolResult> {
        let role_type = arguments
            .get("role_type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let content = arguments
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match self.memory.add_message(&self.session, role_type, content).await {
            Ok(text) => Ok(CallToolResult::text(text)),
            Err(e) if e.is_client_error() => Err(e),
            Err(e) => Err(MemoryError::MemoryWrite(e.to_string())),
        }
    }

    async fn get_memory(&self) -> Result<CallToolResult> {
        let text = self.memory.get_memory_text(&self.session.session_id).await?;
        Ok(CallToolResult::text(text))
    }
}
