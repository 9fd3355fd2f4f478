pub mod chat;
pub mod config_cmd;
pub mod tools;

use codepilot_config::AppConfig;
use std::path::Path;

/// Load the config file (default or explicit) with environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    Ok(config.map_err(|e| format!("Failed to load config: {e}"))?)
}
