//! TOML configuration with environment overrides.
//!
//! Every field has a default, so the config file itself is optional. After
//! parsing, connection strings and the API key are taken from the
//! environment. Secrets are never read from the file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

pub const ENV_STORE_URL: &str = "RENALYSER_STORE_URL";
pub const ENV_SECTIONS_URL: &str = "RENALYSER_SECTIONS_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sections: SectionsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Document store connection string, e.g. `sqlite:./data/renalyser.sqlite`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_store_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Overrides the provider's default chat-completions URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
            api_key_env: default_api_key_env(),
            api_key: None,
        }
    }
}

fn default_provider() -> String {
    "groq".to_string()
}
fn default_model() -> String {
    "llama3-8b-8192".to_string()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_llm_timeout_secs() -> u64 {
    30
}
fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// Chat-completions URL: explicit endpoint, else the provider default.
    pub fn endpoint_url(&self) -> &str {
        if let Some(ref url) = self.endpoint {
            return url;
        }
        match self.provider.as_str() {
            "openai" => "https://api.openai.com/v1/chat/completions",
            _ => "https://api.groq.com/openai/v1/chat/completions",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SectionsConfig {
    /// Relational store for PDF sections; falls back to the document store.
    #[serde(default)]
    pub url: Option<String>,
}

impl Config {
    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_STORE_URL) {
            self.store.url = Some(url);
        }
        if let Some(url) = non_empty(ENV_SECTIONS_URL) {
            self.sections.url = Some(url);
        }
        self.llm.api_key = non_empty(&self.llm.api_key_env);
    }

    /// Document store connection string, or `ConfigurationMissing`.
    pub fn store_url(&self) -> Result<&str, ConfigError> {
        self.store.url.as_deref().ok_or_else(|| ConfigError::Missing {
            name: "store.url".to_string(),
            hint: format!("{} or [store].url", ENV_STORE_URL),
        })
    }

    /// Relational sections store connection string.
    pub fn sections_url(&self) -> Result<&str, ConfigError> {
        match self.sections.url.as_deref() {
            Some(url) => Ok(url),
            None => self.store_url(),
        }
    }

    /// API key for the completion service. Not required when disabled.
    pub fn require_api_key(&self) -> Result<Option<&str>, ConfigError> {
        if !self.llm.is_enabled() {
            return Ok(None);
        }
        match self.llm.api_key.as_deref() {
            Some(key) => Ok(Some(key)),
            None => Err(ConfigError::Missing {
                name: "LLM API key".to_string(),
                hint: self.llm.api_key_env.clone(),
            }),
        }
    }
}

/// Parse a config file (if present), apply environment overrides, validate.
pub fn load_config(path: &Path) -> Result<Config> {
    load_config_with(path, |key| std::env::var(key).ok())
}

pub fn load_config_with<F>(path: &Path, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    config.apply_env(lookup);

    if config.store.timeout_secs == 0 {
        bail!(ConfigError::Invalid("store.timeout_secs must be > 0".into()));
    }
    if config.llm.timeout_secs == 0 {
        bail!(ConfigError::Invalid("llm.timeout_secs must be > 0".into()));
    }
    if config.llm.max_tokens == 0 {
        bail!(ConfigError::Invalid("llm.max_tokens must be > 0".into()));
    }

    match config.llm.provider.as_str() {
        "groq" | "openai" | "disabled" => {}
        other => bail!(ConfigError::Invalid(format!(
            "unknown llm provider '{}'. Must be groq, openai, or disabled",
            other
        ))),
    }

    Ok(config)
}
