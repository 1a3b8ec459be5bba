//! Configuration for providers, retry behavior and the assistant client

use serde::{Deserialize, Serialize};
use std::path::Path;
use log::{debug, warn};

/// Per-adapter configuration, fixed at construction time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// API credential; optional only for local providers
    pub api_key: Option<String>
  , /// Default model when a request does not name one
    pub model: Option<String>
  , /// Default sampling temperature
    pub temperature: Option<f32>
  , /// Ceiling on generated tokens, applied on top of the vendor's own
    pub max_tokens: Option<u32>
  , /// API base URL (if custom)
    pub api_base: Option<String>
  , /// Request timeout in seconds
    pub timeout_secs: Option<u64>
}

impl ProviderConfig
{   pub fn new(api_key: impl Into<String>) -> Self
    {   ProviderConfig
        {   api_key: Some(api_key.into())
          , ..ProviderConfig::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self
    {   self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self
    {   self.api_base = Some(api_base.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self
    {   self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Read `<PREFIX>_API_KEY`, `_MODEL`, `_TEMPERATURE`, `_MAX_TOKENS`
    /// and `_API_BASE` for a provider. Only ever called explicitly.
    pub fn from_env(provider: crate::Provider) -> Self
    {   let prefix = provider.env_prefix();
        let var = |suffix: &str| {
          std::env::var(format!("{}_{}", prefix, suffix))
            .ok()
            .filter(|v| !v.trim().is_empty())
        };
        debug!("Loading {} provider config from environment", provider);

        let temperature = var("TEMPERATURE").and_then(|v| {
          v.parse::<f32>()
            .map_err(|_| warn!("Ignoring {}_TEMPERATURE={}", prefix, v))
            .ok()
        });
        let max_tokens = var("MAX_TOKENS").and_then(|v| {
          v.parse::<u32>()
            .map_err(|_| warn!("Ignoring {}_MAX_TOKENS={}", prefix, v))
            .ok()
        });

        ProviderConfig
        {   api_key: var("API_KEY")
          , model: var("MODEL")
          , temperature
          , max_tokens
          , api_base: var("API_BASE")
          , timeout_secs: None
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig
{   /// Retries after the first attempt
    pub max_retries: usize
  , /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64
  , /// Upper bound on any single delay, in milliseconds
    pub max_delay_ms: u64
}

impl Default for RetryConfig
{   fn default() -> Self
    {   RetryConfig
        {   max_retries: 3
          , initial_delay_ms: 1000
          , max_delay_ms: 10000
        }
    }
}

/// Assistant client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig
{   /// Provider identifier, resolved by the factory
    pub provider: String
  , /// Adapter configuration
    #[serde(default)]
    pub provider_config: ProviderConfig
  , /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig
}

impl AssistantConfig
{   pub fn new(
      provider: impl Into<String>
    , provider_config: ProviderConfig
    ) -> Self
    {   AssistantConfig
        {   provider: provider.into()
          , provider_config
          , retry: RetryConfig::default()
        }
    }

    pub fn from_json_str(json: &str)
      -> Result<Self, crate::error::ConfigError>
    {   serde_json::from_str(json).map_err(|e| {
          crate::error::ConfigError::InvalidOption(
            format!("bad assistant config: {}", e)
          )
        })
    }

    pub fn from_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::ConfigError>
    {   let path = path.as_ref();
        debug!("Loading assistant config from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
          crate::error::ConfigError::InvalidOption(
            format!("cannot read {}: {}", path.display(), e)
          )
        })?;
        AssistantConfig::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_retry_defaults()
    {   let retry = RetryConfig::default();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.initial_delay_ms, 1000);
        assert_eq!(retry.max_delay_ms, 10000);
    }

    #[test]
    fn test_assistant_config_from_json_fills_defaults()
    {   let config = AssistantConfig::from_json_str(
          r#"{"provider":"anthropic","provider_config":{"api_key":"k","model":"claude-x"},"retry":{"max_retries":1}}"#
        ).unwrap();
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.provider_config.model.as_deref(), Some("claude-x"));
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.max_delay_ms, 10000);
    }

    #[test]
    fn test_assistant_config_rejects_garbage()
    {   let err = AssistantConfig::from_json_str("{").unwrap_err();
        assert!(err.to_string().contains("bad assistant config"));
    }

    #[test]
    fn test_from_env_reads_prefixed_vars()
    {   std::env::set_var("COHERE_API_KEY", "env-key");
        std::env::set_var("COHERE_TEMPERATURE", "0.4");
        std::env::set_var("COHERE_MAX_TOKENS", "not-a-number");
        let config = ProviderConfig::from_env(crate::Provider::Cohere);
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.temperature, Some(0.4));
        assert_eq!(config.max_tokens, None);
        std::env::remove_var("COHERE_API_KEY");
        std::env::remove_var("COHERE_TEMPERATURE");
        std::env::remove_var("COHERE_MAX_TOKENS");
    }
}
