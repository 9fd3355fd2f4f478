//! Edit file tool — exact, unique string replacement.
//!
//! An empty `old_str` creates the file when it does not exist and appends
//! to it when it does.

use async_trait::async_trait;
use codepilot_core::error::ToolError;
use codepilot_core::logger::Logger;
use codepilot_core::schema::{FieldType, ToolSchema};
use codepilot_core::tool::Tool;
use std::path::{Path, PathBuf};

use crate::resolve;

pub struct EditFileTool {
    base_dir: PathBuf,
}

impl EditFileTool {
    pub fn new() -> Self {
        Self::with_base_dir(".")
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl Default for EditFileTool {
    fn default() -> Self {
        Self::new()
    }
}

async fn create_new_file(
    full_path: &Path,
    display: &str,
    content: &str,
    logger: &dyn Logger,
) -> Result<String, ToolError> {
    if let Some(parent) = full_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ToolError::failed("edit_file", format!("failed to create directory: {e}")))?;
    }

    tokio::fs::write(full_path, content)
        .await
        .map_err(|e| ToolError::failed("edit_file", format!("failed to create file: {e}")))?;

    logger.info(&format!("Created file {display} ({} bytes)", content.len()));
    Ok(format!("Successfully created file {display}"))
}

/// Replace the single occurrence of `old` in `content`.
fn replace_unique(content: &str, old: &str, new: &str) -> Result<String, ToolError> {
    match content.matches(old).count() {
        0 => Err(ToolError::failed("edit_file", "old_str not found in file")),
        1 => Ok(content.replacen(old, new, 1)),
        n => Err(ToolError::failed(
            "edit_file",
            format!("old_str found {n} times in file, must be unique"),
        )),
    }
}

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Make edits to a text file. Replaces 'old_str' with 'new_str' in the given file. 'old_str' and 'new_str' MUST be different from each other. If the file specified with path doesn't exist, it will be created."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::object()
            .required("path", FieldType::String, "The path to the file")
            .required(
                "old_str",
                FieldType::String,
                "Text to search for - must match exactly and must only have one match exactly",
            )
            .required("new_str", FieldType::String, "Text to replace old_str with")
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        logger: &dyn Logger,
    ) -> Result<String, ToolError> {
        let path = arguments["path"].as_str().unwrap_or_default();
        let old_str = arguments["old_str"].as_str().unwrap_or_default();
        let new_str = arguments["new_str"].as_str().unwrap_or_default();

        if path.is_empty() {
            return Err(ToolError::InvalidArguments("path must not be empty".into()));
        }
        if old_str == new_str {
            return Err(ToolError::InvalidArguments(
                "old_str and new_str must be different".into(),
            ));
        }

        let full_path = resolve(&self.base_dir, path);
        logger.debug(&format!("Editing file: {}", full_path.display()));

        let content = match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && old_str.is_empty() => {
                return create_new_file(&full_path, path, new_str, logger).await;
            }
            Err(e) => return Err(ToolError::failed("edit_file", format!("{path}: {e}"))),
        };

        let updated = if old_str.is_empty() {
            format!("{content}{new_str}")
        } else {
            replace_unique(&content, old_str, new_str).inspect_err(|e| {
                logger.warn(&format!("Edit of {path} rejected: {e}"));
            })?
        };

        tokio::fs::write(&full_path, updated)
            .await
            .map_err(|e| ToolError::failed("edit_file", format!("{path}: {e}")))?;

        logger.info(&format!("Edited file {path}"));
        Ok("OK".into())
    }
}
