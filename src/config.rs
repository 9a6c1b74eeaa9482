//! Runtime configuration.
//!
//! Layering: built-in defaults, then an optional YAML file, then environment
//! variables:
//! - `AI_FLOW_BASE_URL`, `AI_FLOW_MODEL`, `AI_FLOW_API_KEY_ENV`
//! - `AI_HTTP_TIMEOUT_SECS`, `AI_PROXY_URL`
//! - `AI_FLOW_TEMPERATURE`, `AI_FLOW_MAX_TOKENS`

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ErrorContext;
use crate::types::block::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::{Error, Result};

/// Provider endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key when the keyring has none.
    pub api_key_env: String,
    /// Explicit key; takes precedence over keyring and environment lookup.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-2024-08-06".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            timeout_secs: 30,
            proxy_url: None,
        }
    }
}

/// Settings applied to blocks created by the CLI and flow files that omit them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub provider: ProviderConfig,
    pub defaults: GenerationDefaults,
}

impl FlowConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                "invalid configuration document",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_field_path(path.display().to_string()),
            },
            other => other,
        })
    }

    /// Defaults (or `path`), then process environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    /// Unparseable numeric values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("AI_FLOW_BASE_URL") {
            self.provider.base_url = v;
        }
        if let Some(v) = lookup("AI_FLOW_MODEL") {
            self.provider.model = v;
        }
        if let Some(v) = lookup("AI_FLOW_API_KEY_ENV") {
            self.provider.api_key_env = v;
        }
        if let Some(v) = lookup("AI_HTTP_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            self.provider.timeout_secs = v;
        }
        if let Some(v) = lookup("AI_PROXY_URL") {
            self.provider.proxy_url = Some(v);
        }
        if let Some(v) = lookup("AI_FLOW_TEMPERATURE").and_then(|s| s.parse::<f64>().ok()) {
            self.defaults.temperature = v;
        }
        if let Some(v) = lookup("AI_FLOW_MAX_TOKENS").and_then(|s| s.parse::<u32>().ok()) {
            self.defaults.max_tokens = v;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.provider.base_url).map_err(|e| {
            Error::configuration_with_context(
                "invalid provider base url",
                ErrorContext::new()
                    .with_field_path("provider.base_url")
                    .with_details(e.to_string()),
            )
        })?;
        if !(0.0..=2.0).contains(&self.defaults.temperature) {
            return Err(Error::configuration_with_context(
                "temperature must be within [0, 2]",
                ErrorContext::new()
                    .with_field_path("defaults.temperature")
                    .with_details(self.defaults.temperature.to_string()),
            ));
        }
        if self.defaults.max_tokens == 0 {
            return Err(Error::configuration_with_context(
                "max_tokens must be positive",
                ErrorContext::new().with_field_path("defaults.max_tokens"),
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "timeout must be positive",
                ErrorContext::new().with_field_path("provider.timeout_secs"),
            ));
        }
        Ok(())
    }
}
