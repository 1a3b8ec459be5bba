//! Unified request, result and envelope types

use serde::{Deserialize, Serialize};
use log::warn;

/// Highest temperature any caller may ask for
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Unified generation request. Built once per call, never mutated by adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest
{   /// The user prompt text
    pub prompt_text: String
  , /// Optional system instructions
    pub system_text: Option<String>
  , /// Sampling temperature in [0, 2]; adapter default when unset
    pub temperature: Option<f32>
  , /// Max tokens to generate
    pub max_tokens: Option<u32>
  , /// Model override; adapter default when unset
    pub model: Option<String>
  , /// Deliver the answer incrementally
    pub stream: bool
}

impl GenerationRequest
{   pub fn new(prompt_text: impl Into<String>) -> Self
    {   GenerationRequest
        {   prompt_text: prompt_text.into()
          , system_text: None
          , temperature: None
          , max_tokens: None
          , model: None
          , stream: false
        }
    }

    /// Build from a prompt produced by the prompt builder
    pub fn from_prompt(prompt: crate::prompt::Prompt) -> Self
    {   GenerationRequest::new(prompt.user).with_system(prompt.system)
    }

    pub fn with_system(mut self, system_text: impl Into<String>) -> Self
    {   self.system_text = Some(system_text.into());
        self
    }

    /// Values outside [0, 2] are clamped.
    pub fn with_temperature(mut self, temperature: f32) -> Self
    {   let clamped = if temperature.is_nan()
        {   0.0
        } else
        {   temperature.clamp(0.0, MAX_TEMPERATURE)
        };
        if clamped != temperature
        {   warn!("Temperature {} clamped to {}", temperature, clamped);
        }
        self.temperature = Some(clamped);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.model = Some(model.into());
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self
    {   self.stream = stream;
        self
    }
}

/// Normalized adapter output, consumed by the response extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult
{   /// Primary text returned by the vendor
    pub response_text: String
  , /// Model that actually served the request
    pub model_identifier: String
  , /// False when the vendor cut the answer short
    pub is_complete: bool
  , /// Provider that generated it
    pub provider: crate::Provider
}

/// Error body inside a failed envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody
{   /// Taxonomy code, e.g. `provider_error`
    pub code: String
  , /// Human-readable message
    pub message: String
  , /// Provider that errored, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<crate::Provider>
  , /// Vendor status code, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>
}

impl From<&crate::error::Error> for ErrorBody
{   fn from(err: &crate::error::Error) -> Self
    {   let (provider, status) = match err
        {   crate::error::Error::Provider(e) => (Some(e.provider), e.status)
          , _ => (None, None)
        };
        ErrorBody
        {   code: err.code().to_string()
          , message: err.to_string()
          , provider
          , status
        }
    }
}

/// `{success, data, model}` / `{success: false, error}` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse
{   pub success: bool
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>
}

impl ApiResponse
{   pub fn ok(data: serde_json::Value, model: impl Into<String>) -> Self
    {   ApiResponse
        {   success: true
          , data: Some(data)
          , model: Some(model.into())
          , error: None
        }
    }

    pub fn failed(err: &crate::error::Error) -> Self
    {   ApiResponse
        {   success: false
          , data: None
          , model: None
          , error: Some(ErrorBody::from(err))
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::error::{Error, ProviderError, ProviderErrorKind};

    #[test]
    fn test_temperature_is_clamped()
    {   let request = GenerationRequest::new("hi").with_temperature(3.5);
        assert_eq!(request.temperature, Some(2.0));
        let request = GenerationRequest::new("hi").with_temperature(-1.0);
        assert_eq!(request.temperature, Some(0.0));
        let request = GenerationRequest::new("hi").with_temperature(0.3);
        assert_eq!(request.temperature, Some(0.3));
    }

    #[test]
    fn test_failed_envelope_shape()
    {   let err: Error = ProviderError::new(
          crate::Provider::Mistral, ProviderErrorKind::RateLimited, "slow"
        ).with_status(429).into();
        let value = serde_json::to_value(ApiResponse::failed(&err)).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "provider_error");
        assert_eq!(value["error"]["provider"], "mistral");
        assert_eq!(value["error"]["status"], 429);
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_ok_envelope_shape()
    {   let value = serde_json::to_value(
          ApiResponse::ok(serde_json::json!({"a": 1}), "gpt-4o-mini")
        ).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["a"], 1);
        assert_eq!(value["model"], "gpt-4o-mini");
        assert!(value.get("error").is_none());
    }
}
