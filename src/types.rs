//! Core data types for the Zep memory integration
//!
//! This module defines the session, message and memory structures exchanged with the
//! remote memory service, plus the text rendering used by both tool surfaces.

use crate::error::{MemoryError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Role of a message sender
///
/// The remote service only accepts these five values; anything else is rejected
/// before a request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    System,
    Assistant,
    User,
    Function,
    Tool,
}

impl RoleType {
    /// All accepted roles, in schema order
    pub const ALL: [RoleType; 5] = [
        RoleType::System,
        RoleType::Assistant,
        RoleType::User,
        RoleType::Function,
        RoleType::Tool,
    ];

    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::System => "system",
            RoleType::Assistant => "assistant",
            RoleType::User => "user",
            RoleType::Function => "function",
            RoleType::Tool => "tool",
        }
    }
}

impl FromStr for RoleType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        RoleType::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| MemoryError::InvalidArgument(format!("Invalid role type: {}", s)))
    }
}

impl std::fmt::Display for RoleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the sender
    pub role_type: RoleType,

    /// Exact message content
    pub content: String,
}

impl Message {
    pub fn new(role_type: RoleType, content: impl Into<String>) -> Self {
        Self {
            role_type,
            content: content.into(),
        }
    }
}

/// Session record as returned by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// User record, only used for credential probing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
}

/// Memory snapshot computed server-side for a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// Context summary over the session's messages
    #[serde(default)]
    pub context: Option<String>,
}

/// The `(session_id, user_id)` pair a call operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub session_id: String,
    pub user_id: String,
}

impl SessionKey {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Display payload shared by the MCP and plugin tools
///
/// Exactly one of `message` and `context` is set at each call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryData {
    pub session_id: String,
    pub context: Option<String>,
    pub message: Option<String>,
}

impl MemoryData {
    /// Payload carrying a confirmation message
    pub fn with_message(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            context: None,
            message: Some(message.into()),
        }
    }

    /// Payload carrying a memory context
    pub fn with_context(session_id: impl Into<String>, context: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            context,
            message: None,
        }
    }

    /// Render the payload as plain text
    pub fn to_text(&self) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => format!(
                "Memory Context for Session {}:\n{}",
                self.session_id,
                self.context.as_deref().unwrap_or_default()
            ),
        }
    }
}
