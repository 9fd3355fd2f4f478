//! `codepilot tools` — list the tools advertised to the model.

use codepilot_config::AppConfig;
use codepilot_core::logger::{Logger, NoopLogger};
use codepilot_core::tool::ToolRegistry;
use codepilot_tools::{BuiltinToolOptions, register_builtin_tools_with};

/// Build the registry the chat command uses.
pub fn build_registry(
    config: &AppConfig,
    logger: &dyn Logger,
) -> Result<ToolRegistry, Box<dyn std::error::Error>> {
    let mut registry = ToolRegistry::new();
    let options = BuiltinToolOptions {
        shell: config.tools.shell.clone(),
        ..BuiltinToolOptions::default()
    };
    register_builtin_tools_with(&mut registry, &options, logger)?;
    Ok(registry)
}

pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = build_registry(config, &NoopLogger)?;

    println!();
    println!("  {} tools available", registry.len());
    for definition in registry.definitions() {
        println!();
        println!("  {}", definition.name);
        for line in definition.description.lines() {
            println!("    {line}");
        }
        let schema = serde_json::to_string_pretty(&definition.parameters)?;
        for line in schema.lines() {
            println!("    {line}");
        }
    }
    println!();
    Ok(())
}
