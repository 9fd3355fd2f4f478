//! Bash tool — run a shell command and return its combined output.
//!
//! A command that exits non-zero is not a tool failure: the model gets the
//! exit error and whatever the command printed, so it can react to it.

use async_trait::async_trait;
use codepilot_core::error::ToolError;
use codepilot_core::logger::Logger;
use codepilot_core::schema::{FieldType, ToolSchema};
use codepilot_core::tool::Tool;
use std::path::PathBuf;
use tokio::process::Command;

/// Shell used when none is configured.
pub const DEFAULT_SHELL: &str = "sh";

pub struct BashTool {
    /// Interpreter invoked as `<shell> -c <command>`
    shell: String,
    working_dir: PathBuf,
}

impl BashTool {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            working_dir: PathBuf::from("."),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute a bash command and return its output. Use this to run shell commands."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::object().required("command", FieldType::String, "The bash command to execute.")
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        logger: &dyn Logger,
    ) -> Result<String, ToolError> {
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;

        logger.info(&format!("Executing bash command: {command}"));

        let output = Command::new(&self.shell)
            .args(["-c", command])
            .current_dir(&self.working_dir)
            .output()
            .await
            .map_err(|e| {
                logger.error(&format!("Failed to spawn {}: {e}", self.shell));
                ToolError::failed("bash", format!("{}: {e}", self.shell))
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            logger.warn(&format!("Bash command failed: {command} ({})", output.status));
            return Ok(format!(
                "Command failed with error: {}\nOutput: {combined}",
                output.status
            ));
        }

        let trimmed = combined.trim().to_string();
        logger.debug(&format!("Bash command produced {} bytes", trimmed.len()));
        Ok(trimmed)
    }
}
