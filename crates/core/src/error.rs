//! Error types for the codepilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Only provider failures and registration failures abort control flow;
//! every per-tool-call failure is rendered into the conversation instead.

use thiserror::Error;

/// The top-level error type for all codepilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Inference errors (fatal to the session) ---
    #[error("Inference failed: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Reasoning driver ---
    #[error("reasoning chain exceeded maximum steps ({max_steps})")]
    ReasoningExceededSteps { max_steps: u32 },

    // --- Caller cancelled the session ---
    #[error("operation cancelled")]
    Cancelled,

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Provider errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("tool '{0}' not found")]
    NotFound(String),

    #[error("tool '{0}' already registered")]
    DuplicateTool(String),

    #[error("unsupported {0}")]
    UnsupportedCallKind(String),

    #[error("tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidArguments(String),

    #[error("invalid schema for tool '{tool_name}': {reason}")]
    InvalidSchema { tool_name: String, reason: String },

    #[error("tool execution cancelled: {0}")]
    Cancelled(String),
}

impl ToolError {
    /// Convenience constructor for failures raised inside a tool body.
    pub fn failed(tool_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.to_string(),
        }
    }
}
