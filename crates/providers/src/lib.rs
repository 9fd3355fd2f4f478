//! Inference endpoint implementations for codepilot.
//!
//! All providers implement the `codepilot_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use codepilot_config::AppConfig;
use codepilot_core::error::ProviderError;
use codepilot_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider.
///
/// Fails with `NotConfigured` when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured("no API key (set OPENAI_API_KEY or CODEPILOT_API_KEY)".into())
    })?;

    let provider = OpenAiCompatProvider::new(
        "openai-compatible",
        &config.api_base_url,
        api_key,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    Ok(Arc::new(provider))
}
