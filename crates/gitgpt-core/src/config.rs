//! Configuration management for GitGPT
//!
//! Handles loading the TOML configuration file, which holds the
//! provider settings and where the chat log lives.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::provider::{ProviderType, DEFAULT_TEMPERATURE};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Completion provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// General application settings
    #[serde(default)]
    pub general: GeneralConfig,
}

impl Config {
    /// Reject values the agent cannot work with
    pub fn validate(&self) -> Result<()> {
        self.provider.provider_type()?;
        if !(self.provider.temperature > 0.0) {
            return Err(Error::Config(format!(
                "temperature must be greater than 0, got {}",
                self.provider.temperature
            )));
        }
        if self.general.max_rounds == Some(0) {
            return Err(Error::Config("max_rounds must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// LLM Provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider type: "openai", "anthropic", "gemini", etc.
    pub provider_type: String,
    /// Model to use; the provider's default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API key (can be loaded from env)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable name for API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Sampling temperature
    pub temperature: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::OpenAI.to_string(),
            model: None,
            api_key: None,
            api_key_env: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl ProviderConfig {
    pub fn provider_type(&self) -> Result<ProviderType> {
        self.provider_type.parse().map_err(Error::Config)
    }

    /// Get the API key, checking environment variables if not set directly
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key
            && !key.is_empty()
        {
            return Some(key.clone());
        }

        if let Some(env_name) = &self.api_key_env
            && let Ok(key) = std::env::var(env_name)
            && !key.is_empty()
        {
            return Some(key);
        }

        None
    }
}

/// General application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Where the chat log is kept; `<data_dir>/gitgpt/chatlog.json` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_log_path: Option<PathBuf>,
    /// Stop a turn after this many completion rounds; unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rounds: Option<usize>,
    /// Log level used when `--verbose` and `RUST_LOG` are absent
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            chat_log_path: None,
            max_rounds: None,
            log_level: "warn".to_string(),
        }
    }
}

/// Loads and validates the configuration file
pub struct ConfigManager {
    config: Config,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// Create a config manager with a specific path
    pub fn with_path(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            Config::default()
        };
        config.validate()?;

        Ok(Self { config })
    }

    /// Get the default config path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("gitgpt").join("config.toml"))
    }

    /// Default location of the persisted chat log
    pub fn default_chat_log_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| Error::Config("Could not find data directory".to_string()))?;

        Ok(data_dir.join("gitgpt").join("chatlog.json"))
    }

    /// Load configuration from a file
    fn load_from_path(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Chat log location, honoring the configured override
    pub fn chat_log_path(&self) -> Result<PathBuf> {
        match &self.config.general.chat_log_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_chat_log_path(),
        }
    }
}
