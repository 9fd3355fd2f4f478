//! Code search tool — ripgrep over the workspace.

use async_trait::async_trait;
use codepilot_core::error::ToolError;
use codepilot_core::logger::Logger;
use codepilot_core::schema::{FieldType, ToolSchema};
use codepilot_core::tool::Tool;
use std::path::PathBuf;
use tokio::process::Command;

/// Matches returned before the output is cut off.
pub const MAX_MATCHES: usize = 50;

pub struct CodeSearchTool {
    /// Search binary, `rg` unless overridden
    program: String,
    working_dir: PathBuf,
}

impl CodeSearchTool {
    pub fn new() -> Self {
        Self {
            program: "rg".into(),
            working_dir: PathBuf::from("."),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for CodeSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the ripgrep argument list for a search request.
fn search_args(
    pattern: &str,
    path: Option<&str>,
    file_type: Option<&str>,
    case_sensitive: bool,
) -> Vec<String> {
    let mut args: Vec<String> = ["--line-number", "--with-filename", "--color=never"]
        .into_iter()
        .map(String::from)
        .collect();

    if !case_sensitive {
        args.push("--ignore-case".into());
    }
    if let Some(file_type) = file_type {
        args.push("--type".into());
        args.push(file_type.into());
    }

    args.push(pattern.into());
    args.push(path.unwrap_or(".").into());
    args
}

/// Cap the match listing at [`MAX_MATCHES`] lines.
fn truncate_matches(output: &str) -> String {
    let lines: Vec<&str> = output.trim().lines().collect();
    if lines.len() <= MAX_MATCHES {
        return lines.join("\n");
    }
    format!(
        "{}\n... (showing first {MAX_MATCHES} of {} matches)",
        lines[..MAX_MATCHES].join("\n"),
        lines.len()
    )
}

#[async_trait]
impl Tool for CodeSearchTool {
    fn name(&self) -> &str {
        "code_search"
    }

    fn description(&self) -> &str {
        "Search for code patterns using ripgrep (rg).\n\nUse this to find code patterns, function definitions, variable usage, or any text in the codebase.\nYou can search by pattern, file type, or directory."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::object()
            .required("pattern", FieldType::String, "The search pattern or regex to look for")
            .optional(
                "path",
                FieldType::String,
                "Optional path to search in (file or directory)",
            )
            .optional(
                "file_type",
                FieldType::String,
                "Optional file extension to limit search to (e.g., 'go', 'js', 'py')",
            )
            .optional(
                "case_sensitive",
                FieldType::Boolean,
                "Whether the search should be case sensitive (default: false)",
            )
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        logger: &dyn Logger,
    ) -> Result<String, ToolError> {
        let pattern = arguments["pattern"].as_str().unwrap_or_default();
        if pattern.is_empty() {
            return Err(ToolError::InvalidArguments("pattern is required".into()));
        }
        let path = arguments["path"].as_str().filter(|p| !p.is_empty());
        let file_type = arguments["file_type"].as_str().filter(|t| !t.is_empty());
        let case_sensitive = arguments["case_sensitive"].as_bool().unwrap_or(false);

        let args = search_args(pattern, path, file_type, case_sensitive);
        logger.info(&format!("Searching for pattern: {pattern}"));

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.working_dir)
            .output()
            .await
            .map_err(|e| ToolError::failed("code_search", format!("{}: {e}", self.program)))?;

        match output.status.code() {
            Some(0) => {}
            Some(1) => {
                logger.debug(&format!("No matches for pattern: {pattern}"));
                return Ok("No matches found".into());
            }
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                logger.error(&format!("Search failed: {}", stderr.trim()));
                return Err(ToolError::failed(
                    "code_search",
                    format!("search failed: {}", stderr.trim()),
                ));
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let result = truncate_matches(&stdout);
        logger.debug(&format!("Found {} matches", stdout.trim().lines().count()));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepilot_core::logger::NoopLogger;

    #[test]
    fn builds_default_arguments() {
        let args = search_args("fn main", None, None, false);
        assert_eq!(
            args,
            vec![
                "--line-number",
                "--with-filename",
                "--color=never",
                "--ignore-case",
                "fn main",
                "."
            ]
        );
    }

    #[test]
    fn builds_typed_case_sensitive_arguments() {
        let args = search_args("Foo", Some("src"), Some("rust"), true);
        assert!(!args.contains(&"--ignore-case".to_string()));
        assert_eq!(&args[3..], &["--type", "rust", "Foo", "src"]);
    }

    #[test]
    fn truncates_long_listings() {
        let output: String = (1..=60).map(|i| format!("f.rs:{i}:hit\n")).collect();
        let result = truncate_matches(&output);
        assert_eq!(result.lines().count(), MAX_MATCHES + 1);
        assert!(result.ends_with("... (showing first 50 of 60 matches)"));
    }

    #[test]
    fn short_listings_are_untouched() {
        assert_eq!(truncate_matches("a.rs:1:x\nb.rs:2:y\n"), "a.rs:1:x\nb.rs:2:y");
    }

    #[tokio::test]
    async fn empty_pattern_is_rejected() {
        let tool = CodeSearchTool::new();
        let err = tool
            .execute(serde_json::json!({"pattern": ""}), &NoopLogger)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid input: pattern is required");
    }

    #[tokio::test]
    async fn missing_binary_is_an_execution_failure() {
        let tool = CodeSearchTool::new().with_program("definitely-not-ripgrep");
        let err = tool
            .execute(serde_json::json!({"pattern": "x"}), &NoopLogger)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
