//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `CIRCUITFORGE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "Remiwe/T5_final";

pub const ENV_PROVIDER: &str = "CIRCUITFORGE_PROVIDER";
pub const ENV_API_URL: &str = "CIRCUITFORGE_API_URL";
pub const ENV_API_KEY: &str = "CIRCUITFORGE_API_KEY";
pub const ENV_MODEL: &str = "CIRCUITFORGE_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "CIRCUITFORGE_TIMEOUT_SECS";
pub const ENV_RETRY_DELAY_MS: &str = "CIRCUITFORGE_RETRY_DELAY_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// Which inference backend serves the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hosted text2text-generation endpoint
    #[default]
    HuggingFace,
    /// Local Ollama server
    Ollama,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(ProviderKind::HuggingFace),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(ConfigError::InvalidValue {
                key: "provider".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub provider: ProviderKind,
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub request_timeout_secs: u64,
    pub retry_delay_ms: u64,
    pub max_prompt_chars: usize,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::HuggingFace,
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: 120,
            retry_delay_ms: 1000,
            max_prompt_chars: 2000,
        }
    }
}

impl ForgeConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_vars(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_vars(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    /// Empty values are ignored.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(ENV_PROVIDER) {
            self.provider = value.parse()?;
        }
        if let Some(value) = get(ENV_API_URL) {
            self.api_url = value.trim().to_string();
        }
        if let Some(value) = get(ENV_API_KEY) {
            self.api_key = Some(value.trim().to_string());
        }
        if let Some(value) = get(ENV_MODEL) {
            self.model = value.trim().to_string();
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_number(ENV_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = get(ENV_RETRY_DELAY_MS) {
            self.retry_delay_ms = parse_number(ENV_RETRY_DELAY_MS, &value)?;
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
