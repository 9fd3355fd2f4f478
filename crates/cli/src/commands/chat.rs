//! `codepilot chat` — interactive or single-message chat.

use codepilot_agent::Agent;
use codepilot_config::AppConfig;
use codepilot_core::error::Error;
use codepilot_core::logger::{Logger, TracingLogger};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::console::{ConsoleOutput, StdinInput};

pub struct ChatOptions {
    pub message: Option<String>,
    pub reasoning: bool,
    pub max_steps: Option<u32>,
    pub model: Option<String>,
}

/// Ctrl-C during a single message ends the command cleanly, as it does in
/// interactive mode.
fn interrupt_is_clean_exit<T>(result: codepilot_core::Result<T>) -> codepilot_core::Result<()> {
    match result {
        Ok(_) | Err(Error::Cancelled) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Fold command-line overrides into the loaded configuration.
fn apply_options(config: &mut AppConfig, options: &ChatOptions) {
    if let Some(model) = &options.model {
        config.model = model.clone();
    }
    if options.reasoning {
        config.reasoning.enabled = true;
    }
    if let Some(steps) = options.max_steps {
        config.reasoning.max_steps = steps;
    }
}

pub async fn run(mut config: AppConfig, options: ChatOptions) -> Result<(), Box<dyn std::error::Error>> {
    apply_options(&mut config, &options);
    config.validate()?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (or add it to .env):");
        eprintln!("    OPENAI_API_KEY    = 'sk-...'");
        eprintln!("    CODEPILOT_API_KEY = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new("codepilot"));
    let provider = codepilot_providers::build_from_config(&config)?;
    let registry = Arc::new(super::tools::build_registry(&config, logger.as_ref())?);

    let mut agent = Agent::new(
        provider,
        registry,
        config.agent_config(),
        Arc::new(ConsoleOutput),
        logger,
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if let Some(message) = options.message {
        // Single message mode; the output sink prints the reply.
        if config.reasoning.enabled {
            interrupt_is_clean_exit(agent.reason(&message, &cancel).await)?;
        } else {
            interrupt_is_clean_exit(agent.process_turn(&message, &cancel).await)?;
        }
        return Ok(());
    }

    println!();
    println!("  Codepilot — interactive mode");
    println!();
    println!("  Endpoint:  {}", config.api_base_url);
    println!("  Model:     {}", config.model);
    println!("  Tools:     {}", agent.registry().names().join(", "));
    if config.reasoning.enabled {
        println!("  Reasoning: up to {} steps per request", config.reasoning.max_steps);
    }
    println!();
    println!("  Type 'exit' or press Ctrl+C to quit.");
    println!();

    let mut input = StdinInput::new();
    agent.run(&mut input, &cancel).await?;

    println!();
    println!("  Goodbye!");
    Ok(())
}
