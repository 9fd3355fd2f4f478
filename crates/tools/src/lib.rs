//! Built-in tool implementations for Codepilot.
//!
//! Tools give the assistant the ability to work on the local workspace:
//! read, list and edit files, run shell commands, and search code.

pub mod bash;
pub mod code_search;
pub mod edit_file;
pub mod list_files;
pub mod read_file;

use codepilot_core::error::ToolError;
use codepilot_core::logger::Logger;
use codepilot_core::tool::ToolRegistry;
use std::path::{Path, PathBuf};

pub use bash::BashTool;
pub use code_search::CodeSearchTool;
pub use edit_file::EditFileTool;
pub use list_files::ListFilesTool;
pub use read_file::ReadFileTool;

/// Where the built-in tools operate and which shell `bash` runs.
#[derive(Debug, Clone)]
pub struct BuiltinToolOptions {
    pub shell: String,
    pub working_dir: PathBuf,
}

impl Default for BuiltinToolOptions {
    fn default() -> Self {
        Self {
            shell: bash::DEFAULT_SHELL.into(),
            working_dir: PathBuf::from("."),
        }
    }
}

/// Register all five built-in tools with default options.
pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    logger: &dyn Logger,
) -> Result<(), ToolError> {
    register_builtin_tools_with(registry, &BuiltinToolOptions::default(), logger)
}

/// Register all five built-in tools.
///
/// Fails with `DuplicateTool` if any of the names is already taken.
pub fn register_builtin_tools_with(
    registry: &mut ToolRegistry,
    options: &BuiltinToolOptions,
    logger: &dyn Logger,
) -> Result<(), ToolError> {
    let dir = &options.working_dir;
    registry.register(Box::new(ReadFileTool::with_base_dir(dir)))?;
    registry.register(Box::new(ListFilesTool::with_base_dir(dir)))?;
    registry.register(Box::new(
        BashTool::new(options.shell.clone()).with_working_dir(dir),
    ))?;
    registry.register(Box::new(EditFileTool::with_base_dir(dir)))?;
    registry.register(Box::new(CodeSearchTool::new().with_working_dir(dir)))?;

    logger.debug(&format!(
        "Registered built-in tools: {}",
        registry.names().join(", ")
    ));
    Ok(())
}

/// Resolve a tool-supplied path against the tool's base directory.
pub(crate) fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
