//! # codepilot core
//!
//! Domain types, traits, and error definitions for the codepilot coding
//! assistant. Every collaborator the orchestration loop depends on is a
//! trait here; implementations live in their own crates:
//! - `Provider` — the inference endpoint (`codepilot-providers`)
//! - `Tool` — local side-effecting capabilities (`codepilot-tools`)
//! - `Logger` — the logging capability threaded through constructors
//!
//! Tests substitute scripted providers, fake tools and silent loggers.

pub mod agent;
pub mod error;
pub mod logger;
pub mod message;
pub mod provider;
pub mod schema;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentConfig, TurnState};
pub use error::{Error, ProviderError, Result, ToolError};
pub use logger::{Level, Logger, NoopLogger, RecordingLogger, TracingLogger};
pub use message::{Message, MessageToolCall, Role, ToolCallKind};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use schema::{FieldType, SchemaField, ToolSchema};
pub use tool::{Tool, ToolRegistry, ToolResult};
