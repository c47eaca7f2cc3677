//! Provider Factory Module
//!
//! API key retrieval and provider instantiation from configuration.

use super::genai_provider::{create_provider, GenAIProvider};
use super::ProviderType;
use crate::config::ProviderConfig;
use crate::error::Result;

/// Get API key for a provider, checking config then environment variables
pub fn get_api_key(config: &ProviderConfig, provider_type: ProviderType) -> Option<String> {
    if let Some(key) = config.get_api_key() {
        return Some(key);
    }

    // Fall back to the provider's standard environment variable
    if let Some(env_var) = provider_type.api_key_env()
        && let Ok(key) = std::env::var(env_var)
        && !key.is_empty()
    {
        return Some(key);
    }

    None
}

/// Create a provider from config, with optional CLI overrides.
///
/// Without an API key genai falls back to its own environment lookup.
pub fn create_provider_from_config(
    config: &ProviderConfig,
    provider_override: Option<ProviderType>,
    model_override: Option<&str>,
) -> Result<GenAIProvider> {
    let provider_type = match provider_override {
        Some(provider_type) => provider_type,
        None => config.provider_type()?,
    };

    // A model configured for another provider would not resolve
    let model = model_override.or_else(|| {
        provider_override
            .is_none()
            .then_some(config.model.as_deref())
            .flatten()
    });

    let api_key = get_api_key(config, provider_type);
    Ok(create_provider(provider_type, api_key.as_deref(), model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_key_wins() {
        let config = ProviderConfig {
            api_key: Some("sk-config".into()),
            ..Default::default()
        };
        assert_eq!(
            get_api_key(&config, ProviderType::OpenAI).as_deref(),
            Some("sk-config")
        );
    }

    #[test]
    fn test_model_override_and_provider_override() {
        let config = ProviderConfig {
            model: Some("gpt-4o-mini".into()),
            api_key: Some("sk-test".into()),
            ..Default::default()
        };

        let provider = create_provider_from_config(&config, None, None).unwrap();
        assert_eq!(provider.model(), "gpt-4o-mini");

        let provider = create_provider_from_config(&config, None, Some("o3-mini")).unwrap();
        assert_eq!(provider.model(), "o3-mini");

        let provider =
            create_provider_from_config(&config, Some(ProviderType::Anthropic), None).unwrap();
        assert_eq!(provider.model(), ProviderType::Anthropic.default_model());
    }
}
