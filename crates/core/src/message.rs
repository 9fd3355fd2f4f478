//! Message domain types.
//!
//! These are the value objects that flow through the whole loop:
//! user types a line → orchestrator appends it to memory → provider answers →
//! tool calls are executed → tool messages flow back to the provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create a tool result message tied to the originating call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content.into());
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    /// Attach tool calls to an assistant message.
    pub fn with_tool_calls(mut self, tool_calls: Vec<MessageToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// The kind of a tool call emitted by the model.
///
/// Closed set: only `Function` calls are executable. Everything else is
/// answered with a synthesized error so every call id still gets a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolCallKind {
    /// A call to a registered function tool. `arguments` is the raw JSON text.
    Function { name: String, arguments: String },

    /// A free-form "custom" tool call, not backed by a registered function.
    Custom { name: String, input: String },

    /// A call type this client does not understand. `raw` is the call exactly
    /// as it arrived on the wire, so it can be sent back unchanged.
    Unknown {
        kind: String,
        #[serde(default)]
        raw: serde_json::Value,
    },
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    #[serde(flatten)]
    pub kind: ToolCallKind,
}

impl MessageToolCall {
    /// Build a function tool call.
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ToolCallKind::Function {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// The tool name, if the call kind carries one.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            ToolCallKind::Function { name, .. } | ToolCallKind::Custom { name, .. } => Some(name),
            ToolCallKind::Unknown { .. } => None,
        }
    }

    /// The raw argument text, for display.
    pub fn arguments(&self) -> &str {
        match &self.kind {
            ToolCallKind::Function { arguments, .. } => arguments,
            ToolCallKind::Custom { input, .. } => input,
            ToolCallKind::Unknown { .. } => "",
        }
    }
}
