//! Agent configuration and turn-state types.

use serde::{Deserialize, Serialize};

/// Static configuration handed to the orchestrator at construction.
///
/// The orchestrator never re-reads configuration mid-session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model name sent with every inference request
    pub model: String,

    /// Maximum tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum history messages kept in memory (0 = unbounded)
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    /// Maximum tool calls executed concurrently within one turn
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Optional system message installed as the memory's fixed prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,

    /// Use the bounded reasoning driver instead of the plain loop
    #[serde(default)]
    pub reasoning_enabled: bool,

    /// Inference calls allowed per request in the reasoning driver
    #[serde(default = "default_reasoning_max_steps")]
    pub reasoning_max_steps: u32,
}

pub const DEFAULT_MEMORY_CAPACITY: usize = 40;
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
pub const DEFAULT_REASONING_MAX_STEPS: u32 = 10;

fn default_max_tokens() -> u32 {
    1024
}
fn default_memory_capacity() -> usize {
    DEFAULT_MEMORY_CAPACITY
}
fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}
fn default_reasoning_max_steps() -> u32 {
    DEFAULT_REASONING_MAX_STEPS
}

impl AgentConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: default_max_tokens(),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            system_message: None,
            reasoning_enabled: false,
            reasoning_max_steps: DEFAULT_REASONING_MAX_STEPS,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new("gpt-4")
    }
}

/// Where the orchestrator is in its turn-taking cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Constructed, not yet running
    #[default]
    Idle,
    /// Blocked on the user input source
    AwaitingUserInput,
    /// Waiting on the inference endpoint
    Inferring,
    /// Running the tool calls of the last reply
    ExecutingTools,
    /// The last reply had no tool calls; the turn is over
    Responded,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingUserInput => "awaiting_user_input",
            TurnState::Inferring => "inferring",
            TurnState::ExecutingTools => "executing_tools",
            TurnState::Responded => "responded",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AgentConfig::default();
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.memory_capacity, 40);
        assert_eq!(config.max_concurrency, 5);
        assert_eq!(config.reasoning_max_steps, 10);
        assert!(!config.reasoning_enabled);
    }

    #[test]
    fn turn_state_starts_idle() {
        assert_eq!(TurnState::default(), TurnState::Idle);
        assert_eq!(TurnState::ExecutingTools.to_string(), "executing_tools");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: AgentConfig = serde_json::from_str(r#"{"model":"gpt-4o"}"#).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_concurrency, 5);
    }
}
