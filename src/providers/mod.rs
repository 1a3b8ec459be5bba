//! LLM provider adapters.
//!
//! Every vendor implements [`ProviderAdapter`]; callers only ever hold an
//! `Arc<dyn ProviderAdapter>`. Adapters keep nothing but immutable
//! configuration, so one instance can serve concurrent requests.

pub mod anthropic;
pub mod cohere;
pub mod google;
pub mod huggingface;
pub mod local;
pub mod mistral;
pub mod openai;
pub(crate) mod stream;

pub use anthropic::AnthropicAdapter;
pub use cohere::CohereAdapter;
pub use google::GoogleAdapter;
pub use huggingface::HuggingFaceAdapter;
pub use local::LocalAdapter;
pub use mistral::MistralAdapter;
pub use openai::OpenAIAdapter;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use log::{debug, error, trace, warn};
use crate::error::{ConfigError, ProviderError, ProviderErrorKind};
use crate::request::{GenerationRequest, GenerationResult};

/// Sink for incremental text, in vendor emission order
pub type ChunkSender = mpsc::UnboundedSender<String>;

/// Connect timeout applied to every adapter. The request itself is only
/// bounded when `ProviderConfig::timeout_secs` is set.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Uniform contract over one vendor API
#[async_trait]
pub trait ProviderAdapter: Send + Sync
{   /// Which vendor this adapter talks to
    fn provider(&self) -> crate::Provider;

    /// Model used when a request names none
    fn default_model(&self) -> &str;

    /// One request, one complete response
    async fn generate(&self, request: &GenerationRequest)
      -> Result<GenerationResult, ProviderError>;

    /// Push text to `chunks` as the vendor emits it and return the
    /// accumulated result once the stream ends. Adapters without native
    /// streaming deliver the whole answer as a single chunk.
    async fn generate_stream(
      &self
    , request: &GenerationRequest
    , chunks: ChunkSender
    ) -> Result<GenerationResult, ProviderError>
    {   let result = self.generate(request).await?;
        let _ = chunks.send(result.response_text.clone());
        Ok(result)
    }
}

// ===== Shared adapter settings =====

/// Immutable per-adapter settings resolved from a `ProviderConfig`
#[derive(Debug, Clone)]
pub(crate) struct AdapterSettings
{   pub provider: crate::Provider
  , pub api_key: Option<String>
  , pub model: String
  , pub temperature: Option<f32>
  , pub max_tokens: Option<u32>
  , pub api_base: String
  , pub http: reqwest::Client
}

impl AdapterSettings
{   pub fn new(
      provider: crate::Provider
    , config: crate::config::ProviderConfig
    , default_base: &str
    , default_model: &str
    ) -> Result<Self, ConfigError>
    {   let api_key = config.api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() && provider.requires_api_key()
        {   error!("No API key for provider: {}", provider);
            return Err(ConfigError::MissingApiKey(provider));
        }

        let mut builder = reqwest::Client::builder()
          .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS));
        if let Some(secs) = config.timeout_secs
        {   builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| {
          error!("Failed to build HTTP client: {}", e);
          ConfigError::InvalidOption(format!("http client: {}", e))
        })?;

        let api_base = config.api_base
          .unwrap_or_else(|| default_base.to_string())
          .trim_end_matches('/')
          .to_string();
        match reqwest::Url::parse(&api_base)
        {   Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
          , Ok(url) => {
              error!("Unsupported scheme in api_base: {}", api_base);
              return Err(ConfigError::InvalidOption(
                format!("api_base '{}': unsupported scheme '{}'", api_base, url.scheme())
              ));
            }
          , Err(e) => {
              error!("Invalid api_base {}: {}", api_base, e);
              return Err(ConfigError::InvalidOption(
                format!("api_base '{}': {}", api_base, e)
              ));
            }
        }

        debug!("Configured {} adapter against {}", provider, api_base);
        Ok(AdapterSettings
        {   provider
          , api_key
          , model: config.model.unwrap_or_else(|| default_model.to_string())
          , temperature: config.temperature
          , max_tokens: config.max_tokens
          , api_base
          , http
        })
    }

    /// Key checked at construction for providers that need one
    pub fn api_key(&self) -> &str
    {   self.api_key.as_deref().unwrap_or_default()
    }

    pub fn model_for(&self, request: &GenerationRequest) -> String
    {   request.model.clone().unwrap_or_else(|| self.model.clone())
    }

    /// Request temperature, else configured default, clamped into the
    /// vendor's native range
    pub fn temperature_for(
      &self
    , request: &GenerationRequest
    , min: f32
    , max: f32
    ) -> Option<f32>
    {   request.temperature.or(self.temperature).map(|t| {
          let clamped = t.clamp(min, max);
          if clamped != t
          {   warn!(
                "{} temperature {} clamped to {}",
                self.provider, t, clamped
              );
          }
          clamped
        })
    }

    /// Requested token budget, capped at the vendor ceiling and the
    /// configured ceiling
    pub fn max_tokens_for(
      &self
    , request: &GenerationRequest
    , vendor_ceiling: Option<u32>
    ) -> Option<u32>
    {   let ceiling = match (vendor_ceiling, self.max_tokens)
        {   (Some(v), Some(c)) => Some(v.min(c))
          , (v, c) => v.or(c)
        };
        match (request.max_tokens, ceiling)
        {   (Some(n), Some(cap)) if n > cap => {
              warn!("{} max_tokens {} clamped to {}", self.provider, n, cap);
              Some(cap)
            }
          , (Some(n), _) => Some(n)
          , (None, _) => self.max_tokens.and(ceiling)
        }
    }

    pub fn error(&self, kind: ProviderErrorKind, message: impl Into<String>)
      -> ProviderError
    {   ProviderError::new(self.provider, kind, message)
    }

    /// Send and fail on any non-2xx status
    pub async fn send(&self, builder: reqwest::RequestBuilder)
      -> Result<reqwest::Response, ProviderError>
    {   let response = builder.send().await.map_err(|e| {
          error!("{} HTTP error: {}", self.provider, e);
          let kind = if e.is_builder()
          {   ProviderErrorKind::InvalidRequest
          } else
          {   ProviderErrorKind::Network
          };
          self.error(kind, e.to_string())
        })?;

        let status = response.status();
        trace!("{} response status: {}", self.provider, status);
        if status.is_success()
        {   return Ok(response);
        }

        let body = response.text().await
          .unwrap_or_else(|_| "Unknown error".to_string());
        let err = classify_status(self.provider, status.as_u16(), &body);
        error!("{} API error: {}", self.provider, err);
        Err(err)
    }

    /// Decode a successful body into the vendor's response shape
    pub async fn read_json<T: DeserializeOwned>(
      &self
    , response: reqwest::Response
    ) -> Result<T, ProviderError>
    {   let body = response.text().await.map_err(|e| {
          error!("{} failed reading body: {}", self.provider, e);
          self.error(ProviderErrorKind::Network, e.to_string())
        })?;
        trace!("{} response body: {}", self.provider, body);
        serde_json::from_str(&body).map_err(|e| {
          error!("{} parse error: {}", self.provider, e);
          self.error(ProviderErrorKind::Malformed, e.to_string())
        })
    }

    pub fn result(
      &self
    , response_text: String
    , model_identifier: String
    , is_complete: bool
    ) -> GenerationResult
    {   if !is_complete
        {   warn!("{} response for {} was truncated", self.provider, model_identifier);
        }
        GenerationResult
        {   response_text
          , model_identifier
          , is_complete
          , provider: self.provider
        }
    }
}

/// Vendor finish reasons that mean the answer was cut off
pub(crate) fn is_length_stop(reason: &str) -> bool
{   matches!(
      reason,
      "length" | "model_length" | "max_tokens" | "MAX_TOKENS"
    )
}

// ===== Error normalization =====

/// Pull a readable message out of a vendor error body
pub(crate) fn vendor_message(body: &str) -> String
{   let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
      v.pointer("/error/message")
        .or_else(|| v.get("message"))
        .or_else(|| v.get("error"))
        .or_else(|| v.get("detail"))
        .and_then(|m| match m
        {   Value::String(s) => Some(s.clone())
          , Value::Null => None
          , other => Some(other.to_string())
        })
    });
    from_json.unwrap_or_else(|| {
      let trimmed = body.trim();
      if trimmed.is_empty()
      {   "empty error body".to_string()
      } else
      {   trimmed.chars().take(500).collect()
      }
    })
}

/// Map a non-2xx status and body onto the normalized taxonomy
pub(crate) fn classify_status(
  provider: crate::Provider
, status: u16
, body: &str
) -> ProviderError
{   let message = vendor_message(body);
    let lower = message.to_lowercase();
    let mentions_missing_model = lower.contains("model")
      && (lower.contains("not found")
        || lower.contains("does not exist")
        || lower.contains("unknown")
        || lower.contains("invalid model"));

    let kind = match status
    {   401 | 403 => ProviderErrorKind::Auth
      , 429 => ProviderErrorKind::RateLimited
      , 404 if lower.contains("model") => ProviderErrorKind::ModelNotFound
      , 400 if mentions_missing_model => ProviderErrorKind::ModelNotFound
      , _ => ProviderErrorKind::Status
    };
    ProviderError::new(provider, kind, message).with_status(status)
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::config::ProviderConfig;
    use crate::Provider;

    fn settings(config: ProviderConfig) -> AdapterSettings
    {   AdapterSettings::new(Provider::OpenAI, config, "https://x/", "m").unwrap()
    }

    #[test]
    fn test_missing_key_is_config_error()
    {   let err = AdapterSettings::new(
          Provider::Anthropic, ProviderConfig::default(), "https://x", "m"
        ).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey(Provider::Anthropic));
    }

    #[test]
    fn test_local_needs_no_key()
    {   assert!(AdapterSettings::new(
          Provider::Local, ProviderConfig::default(), "http://localhost:11434", "m"
        ).is_ok());
    }

    #[test]
    fn test_base_trailing_slash_trimmed()
    {   assert_eq!(settings(ProviderConfig::new("k")).api_base, "https://x");
    }

    #[test]
    fn test_unparseable_base_is_config_error()
    {   for base in ["not a url", "ftp://example.com"]
        {   let err = AdapterSettings::new(
              Provider::OpenAI,
              ProviderConfig::new("k").with_api_base(base),
              "https://x",
              "m"
            ).unwrap_err();
            assert!(
              matches!(err, ConfigError::InvalidOption(ref m) if m.contains(base)),
              "{:?}", err
            );
        }
    }

    #[test]
    fn test_temperature_clamped_to_vendor_range()
    {   let s = settings(ProviderConfig::new("k").with_temperature(0.5));
        let request = GenerationRequest::new("p").with_temperature(1.8);
        assert_eq!(s.temperature_for(&request, 0.0, 1.0), Some(1.0));
        let request = GenerationRequest::new("p");
        assert_eq!(s.temperature_for(&request, 0.0, 1.0), Some(0.5));
    }

    #[test]
    fn test_max_tokens_uses_smallest_ceiling()
    {   let s = settings(ProviderConfig::new("k").with_max_tokens(1000));
        let request = GenerationRequest::new("p").with_max_tokens(5000);
        assert_eq!(s.max_tokens_for(&request, Some(4000)), Some(1000));
        let request = GenerationRequest::new("p").with_max_tokens(500);
        assert_eq!(s.max_tokens_for(&request, Some(4000)), Some(500));
        let request = GenerationRequest::new("p");
        assert_eq!(s.max_tokens_for(&request, Some(4000)), Some(1000));
    }

    #[test]
    fn test_classify_status()
    {   let body = r#"{"error":{"message":"Invalid API key","type":"auth"}}"#;
        let err = classify_status(Provider::OpenAI, 401, body);
        assert_eq!(err.kind, ProviderErrorKind::Auth);
        assert_eq!(err.message, "Invalid API key");
        assert_eq!(err.status, Some(401));

        let err = classify_status(Provider::Mistral, 429, "too many");
        assert_eq!(err.kind, ProviderErrorKind::RateLimited);
        assert!(err.is_retryable());

        let err = classify_status(Provider::Google, 404, r#"{"error":{"message":"models/x is not found"}}"#);
        assert_eq!(err.kind, ProviderErrorKind::ModelNotFound);
        assert!(!err.is_retryable());

        let err = classify_status(Provider::Cohere, 502, "");
        assert_eq!(err.kind, ProviderErrorKind::Status);
        assert_eq!(err.message, "empty error body");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_vendor_message_shapes()
    {   assert_eq!(vendor_message(r#"{"message":"m1"}"#), "m1");
        assert_eq!(vendor_message(r#"{"error":"m2"}"#), "m2");
        assert_eq!(vendor_message(r#"{"detail":"m3"}"#), "m3");
        assert_eq!(vendor_message("plain text"), "plain text");
    }
}
