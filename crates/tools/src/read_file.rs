//! Read file tool — return the contents of a file.

use async_trait::async_trait;
use codepilot_core::error::ToolError;
use codepilot_core::logger::Logger;
use codepilot_core::schema::{FieldType, ToolSchema};
use codepilot_core::tool::Tool;
use std::path::PathBuf;

use crate::resolve;

pub struct ReadFileTool {
    /// Directory relative paths are resolved against.
    base_dir: PathBuf,
}

impl ReadFileTool {
    /// Resolve paths against the process working directory.
    pub fn new() -> Self {
        Self::with_base_dir(".")
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a given relative file path. Use this when you want to see what's inside a file. Do not use this with directory names."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::object().required(
            "path",
            FieldType::String,
            "The relative path of a file in the working directory.",
        )
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        logger: &dyn Logger,
    ) -> Result<String, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;

        let full_path = resolve(&self.base_dir, path);
        logger.debug(&format!("Reading file: {}", full_path.display()));

        match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => {
                logger.debug(&format!("Read {} bytes from {path}", content.len()));
                Ok(content)
            }
            Err(e) => {
                logger.error(&format!("Failed to read file {path}: {e}"));
                Err(ToolError::failed("read_file", format!("{path}: {e}")))
            }
        }
    }
}
