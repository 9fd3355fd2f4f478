//! `codepilot config` — print the effective configuration.

use codepilot_config::AppConfig;

/// Render the configuration as TOML with the API key masked.
pub fn render(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("***".into());
    }
    toml::to_string_pretty(&shown)
}

pub fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("# Config directory: {}", AppConfig::config_dir().display());
    if !config.has_api_key() {
        println!("# No API key set (OPENAI_API_KEY or CODEPILOT_API_KEY)");
    }
    println!();
    print!("{}", render(config)?);
    Ok(())
}
