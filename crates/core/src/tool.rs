//! Tool trait — the abstraction over assistant capabilities.
//!
//! Tools are what give the assistant the ability to act on the workspace:
//! read and edit files, list directories, run shell commands, search code.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use crate::error::ToolError;
use crate::logger::Logger;
use crate::message::Message;
use crate::provider::ToolDefinition;
use crate::schema::ToolSchema;

/// The outcome of one tool call, paired with the call it answers.
///
/// Lives only inside the executor before it becomes a tool message.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// The tool's text output, or the reason it produced none
    pub outcome: Result<String, ToolError>,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            outcome: Ok(output.into()),
        }
    }

    pub fn err(call_id: impl Into<String>, error: ToolError) -> Self {
        Self {
            call_id: call_id.into(),
            outcome: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Text shown to the model: the output, or `Error: <reason>`.
    pub fn content(&self) -> String {
        match &self.outcome {
            Ok(output) => output.clone(),
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Convert into the tool message appended to memory.
    pub fn into_message(self) -> Message {
        let content = self.content();
        Message::tool_result(self.call_id, content)
    }
}

/// The core Tool trait.
///
/// Each tool (read_file, list_files, bash, edit_file, code_search)
/// implements this trait. Tools are registered once at startup and are
/// read-only afterwards.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// The accepted argument fields.
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with already-validated arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        logger: &dyn Logger,
    ) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema().to_json(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the LLM on every request
/// 2. Look up and execute tools when the LLM requests them
///
/// Registration happens before the registry is shared; afterwards it is
/// only read, so it can sit behind an `Arc` and serve concurrent executions.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Fails if the name is taken or the schema is malformed.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        tool.schema()
            .validate()
            .map_err(|reason| ToolError::InvalidSchema {
                tool_name: name.clone(),
                reason,
            })?;
        self.tools.insert(name, Arc::from(tool));
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get all tool definitions (for sending to the LLM), ordered by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Resolve, validate the arguments, and run a tool.
    pub async fn execute(
        &self,
        name: &str,
        arguments: serde_json::Value,
        logger: &dyn Logger,
    ) -> std::result::Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.schema()
            .check(&arguments)
            .map_err(ToolError::InvalidArguments)?;
        tool.execute(arguments, logger).await
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
