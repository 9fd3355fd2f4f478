//! Configuration loading, validation, and management for codepilot.
//!
//! Loads configuration from `~/.codepilot/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use codepilot_core::agent::{
    AgentConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_MEMORY_CAPACITY, DEFAULT_REASONING_MAX_STEPS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The root configuration structure.
///
/// Maps directly to `~/.codepilot/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the inference endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// History messages kept in memory (0 = unbounded)
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    /// Tool calls executed concurrently per turn
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// HTTP timeout for inference requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Debug-level logging
    #[serde(default)]
    pub verbose: bool,

    /// Optional system message prepended to every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,

    /// Reasoning driver settings
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4".into()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_memory_capacity() -> usize {
    DEFAULT_MEMORY_CAPACITY
}
fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}
fn default_request_timeout_secs() -> u64 {
    30
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("memory_capacity", &self.memory_capacity)
            .field("max_concurrency", &self.max_concurrency)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("verbose", &self.verbose)
            .field("system_message", &self.system_message)
            .field("reasoning", &self.reasoning)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_reasoning_max_steps")]
    pub max_steps: u32,
}

fn default_reasoning_max_steps() -> u32 {
    DEFAULT_REASONING_MAX_STEPS
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_steps: default_reasoning_max_steps(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Shell used by the `bash` tool (`<shell> -c <command>`)
    #[serde(default = "default_shell")]
    pub shell: String,
}

fn default_shell() -> String {
    "sh".into()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.codepilot/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `CODEPILOT_API_KEY`, then `OPENAI_API_KEY`
    /// - `OPENAI_API_BASE_URL`, `MODEL`, `MAX_TOKENS`, `MEMORY_CAPACITY`,
    ///   `MAX_CONCURRENCY`, `REQUEST_TIMEOUT`, `VERBOSE`, `SYSTEM_MESSAGE`,
    ///   `REASONING_ENABLED`, `REASONING_MAX_STEPS`, `CODEPILOT_SHELL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from an explicit file, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from a file only. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Values that fail to parse leave the current setting untouched.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = get("CODEPILOT_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(model) = get("MODEL") {
            self.model = model;
        }
        if let Some(message) = get("SYSTEM_MESSAGE") {
            self.system_message = Some(message);
        }
        if let Some(shell) = get("CODEPILOT_SHELL") {
            self.tools.shell = shell;
        }

        override_parsed(&mut self.max_tokens, get("MAX_TOKENS"));
        override_parsed(&mut self.memory_capacity, get("MEMORY_CAPACITY"));
        override_parsed(&mut self.max_concurrency, get("MAX_CONCURRENCY"));
        override_parsed(&mut self.request_timeout_secs, get("REQUEST_TIMEOUT"));
        override_parsed(&mut self.verbose, get("VERBOSE"));
        override_parsed(&mut self.reasoning.enabled, get("REASONING_ENABLED"));
        override_parsed(&mut self.reasoning.max_steps, get("REASONING_MAX_STEPS"));
    }

    /// Get the config directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".codepilot")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be greater than 0".into()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "max_concurrency must be greater than 0".into(),
            ));
        }
        if self.reasoning.max_steps == 0 {
            return Err(ConfigError::ValidationError(
                "reasoning.max_steps must be greater than 0".into(),
            ));
        }
        if self.tools.shell.trim().is_empty() {
            return Err(ConfigError::ValidationError("tools.shell must not be empty".into()));
        }
        Ok(())
    }

    /// Check if an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The static configuration handed to the orchestrator.
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            memory_capacity: self.memory_capacity,
            max_concurrency: self.max_concurrency,
            system_message: self.system_message.clone(),
            reasoning_enabled: self.reasoning.enabled,
            reasoning_max_steps: self.reasoning.max_steps,
        }
    }

    /// Generate the default config as a TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn override_parsed<T: FromStr>(target: &mut T, raw: Option<String>) {
    if let Some(value) = raw.and_then(|v| v.trim().parse().ok()) {
        *target = value;
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: default_api_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            memory_capacity: default_memory_capacity(),
            max_concurrency: default_max_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            verbose: false,
            system_message: None,
            reasoning: ReasoningConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.memory_capacity, 40);
        assert_eq!(config.max_concurrency, 5);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.reasoning.max_steps, config.reasoning.max_steps);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let config = AppConfig {
            max_concurrency: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.model, "gpt-4");
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "gpt-4o-mini"
memory_capacity = 12
system_message = "You are terse."

[reasoning]
enabled = true
max_steps = 4
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.memory_capacity, 12);
        assert!(config.reasoning.enabled);
        assert_eq!(config.reasoning.max_steps, 4);
        assert_eq!(config.tools.shell, "sh");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MODEL", "gpt-test"),
            ("MAX_CONCURRENCY", "2"),
            ("REASONING_ENABLED", "true"),
            ("VERBOSE", "true"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "gpt-test");
        assert_eq!(config.max_concurrency, 2);
        assert!(config.reasoning.enabled);
        assert!(config.verbose);
    }

    #[test]
    fn codepilot_key_wins_over_openai_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("OPENAI_API_KEY", "sk-openai"),
            ("CODEPILOT_API_KEY", "sk-codepilot"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-codepilot"));
    }

    #[test]
    fn unparseable_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("MAX_TOKENS", "lots"), ("VERBOSE", "maybe")]));
        assert_eq!(config.max_tokens, 1024);
        assert!(!config.verbose);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let out = format!("{config:?}");
        assert!(!out.contains("sk-secret"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn agent_config_carries_settings() {
        let config = AppConfig {
            system_message: Some("be brief".into()),
            memory_capacity: 8,
            ..AppConfig::default()
        };
        let agent = config.agent_config();
        assert_eq!(agent.memory_capacity, 8);
        assert_eq!(agent.system_message.as_deref(), Some("be brief"));
        assert_eq!(agent.reasoning_max_steps, 10);
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4"));
        assert!(toml_str.contains("max_steps"));
    }
}
