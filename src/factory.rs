//! Provider identifier -> adapter

use std::str::FromStr;
use std::sync::Arc;
use log::{debug, error};
use crate::config::ProviderConfig;
use crate::error::ConfigError;
use crate::providers::{
  AnthropicAdapter, CohereAdapter, GoogleAdapter, HuggingFaceAdapter,
  LocalAdapter, MistralAdapter, OpenAIAdapter, ProviderAdapter
};
use crate::Provider;

/// Selects and constructs adapters. Does no network I/O.
pub struct ServiceFactory;

impl ServiceFactory
{   /// Resolve a provider identifier (or alias) to a ready adapter
    pub fn resolve(provider_id: &str, config: ProviderConfig)
      -> Result<Arc<dyn ProviderAdapter>, ConfigError>
    {   debug!("Resolving provider: {}", provider_id);
        let provider = Provider::from_str(provider_id).map_err(|e| {
          error!("{}", e);
          e
        })?;
        ServiceFactory::create(provider, config)
    }

    /// Construct the adapter for an already-parsed provider
    pub fn create(provider: Provider, config: ProviderConfig)
      -> Result<Arc<dyn ProviderAdapter>, ConfigError>
    {   let adapter: Arc<dyn ProviderAdapter> = match provider
        {   Provider::OpenAI => Arc::new(OpenAIAdapter::new(config)?)
          , Provider::Anthropic => Arc::new(AnthropicAdapter::new(config)?)
          , Provider::Google => Arc::new(GoogleAdapter::new(config)?)
          , Provider::Cohere => Arc::new(CohereAdapter::new(config)?)
          , Provider::Mistral => Arc::new(MistralAdapter::new(config)?)
          , Provider::HuggingFace => Arc::new(HuggingFaceAdapter::new(config)?)
          , Provider::Local => Arc::new(LocalAdapter::new(config)?)
        };
        debug!("Resolved {} with default model {}", provider, adapter.default_model());
        Ok(adapter)
    }

    /// Identifiers `resolve` accepts, without aliases
    pub fn supported() -> Vec<&'static str>
    {   Provider::identifiers()
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_unknown_provider_lists_supported_set()
    {   let err = ServiceFactory::resolve("made-up-vendor", ProviderConfig::new("k"))
          .err()
          .unwrap();
        let message = err.to_string();
        assert!(message.contains("made-up-vendor"));
        for id in ServiceFactory::supported()
        {   assert!(message.contains(id), "{} missing from {}", id, message);
        }
        assert!(matches!(err, ConfigError::UnknownProvider { .. }));
    }

    #[test]
    fn test_every_provider_resolves()
    {   for id in ServiceFactory::supported()
        {   let adapter = ServiceFactory::resolve(id, ProviderConfig::new("k")).unwrap();
            assert_eq!(adapter.provider().as_str(), id);
            assert!(!adapter.default_model().is_empty());
        }
    }

    #[test]
    fn test_alias_and_case_are_accepted()
    {   let adapter = ServiceFactory::resolve("Claude", ProviderConfig::new("k")).unwrap();
        assert_eq!(adapter.provider(), Provider::Anthropic);
    }

    #[test]
    fn test_unparseable_api_base_is_rejected_up_front()
    {   let err = ServiceFactory::resolve(
          "openai",
          ProviderConfig::new("k").with_api_base("not a url")
        ).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidOption(_)), "{:?}", err);
        assert!(!crate::Error::from(err).is_transient());
    }

    #[test]
    fn test_missing_key_is_rejected_except_local()
    {   let err = ServiceFactory::resolve("openai", ProviderConfig::default())
          .err()
          .unwrap();
        assert_eq!(err, ConfigError::MissingApiKey(Provider::OpenAI));
        assert!(ServiceFactory::resolve("ollama", ProviderConfig::default()).is_ok());
    }
}
