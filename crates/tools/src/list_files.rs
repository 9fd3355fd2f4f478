//! List files tool — recursive directory listing as a JSON array.

use async_trait::async_trait;
use codepilot_core::error::ToolError;
use codepilot_core::logger::Logger;
use codepilot_core::schema::{FieldType, ToolSchema};
use codepilot_core::tool::Tool;
use std::path::{Path, PathBuf};

use crate::resolve;

pub struct ListFilesTool {
    base_dir: PathBuf,
}

impl ListFilesTool {
    pub fn new() -> Self {
        Self::with_base_dir(".")
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl Default for ListFilesTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk `root` depth-first, collecting slash-separated paths relative to it.
/// Directories get a trailing `/`.
async fn walk(root: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut reader = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            let path = entry.path();
            let relative = path
                .strip_prefix(root)
                .unwrap_or(path.as_path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().await?.is_dir() {
                entries.push(format!("{relative}/"));
                pending.push(path);
            } else {
                entries.push(relative);
            }
        }
    }

    entries.sort();
    Ok(entries)
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List files and directories at a given path. If no path is provided, lists files in the current directory."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::object().optional(
            "path",
            FieldType::String,
            "Optional relative path to list files from. Defaults to current directory if not provided.",
        )
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        logger: &dyn Logger,
    ) -> Result<String, ToolError> {
        let path = arguments["path"].as_str().filter(|p| !p.is_empty()).unwrap_or(".");
        let dir = resolve(&self.base_dir, path);

        logger.debug(&format!("Listing files in directory: {}", dir.display()));

        let files = walk(&dir).await.map_err(|e| {
            logger.error(&format!("Failed to list files in {path}: {e}"));
            ToolError::failed("list_files", format!("{path}: {e}"))
        })?;

        logger.debug(&format!("Listed {} items in {path}", files.len()));
        serde_json::to_string(&files).map_err(|e| ToolError::failed("list_files", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepilot_core::logger::NoopLogger;

    #[tokio::test]
    async fn lists_nested_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.txt"), "b").unwrap();

        let tool = ListFilesTool::with_base_dir(dir.path());
        let output = tool.execute(serde_json::json!({}), &NoopLogger).await.unwrap();
        let files: Vec<String> = serde_json::from_str(&output).unwrap();

        assert_eq!(files, vec!["a.txt", "sub/", "sub/b.txt"]);
    }

    #[tokio::test]
    async fn lists_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.txt"), "b").unwrap();

        let tool = ListFilesTool::with_base_dir(dir.path());
        let output = tool
            .execute(serde_json::json!({"path": "sub"}), &NoopLogger)
            .await
            .unwrap();
        assert_eq!(output, r#"["b.txt"]"#);
    }

    #[tokio::test]
    async fn missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ListFilesTool::with_base_dir(dir.path());
        let result = tool
            .execute(serde_json::json!({"path": "nope"}), &NoopLogger)
            .await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed { .. })));
    }
}
