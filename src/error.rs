//! Error taxonomy shared by every layer of the pipeline

use std::fmt;
use thiserror::Error as ThisError;

/// Umbrella error returned by the pipeline client.
/// Implements Clone so results can be sent through channels
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error
{   #[error(transparent)]
    Config(#[from] ConfigError)
  , #[error(transparent)]
    Provider(#[from] ProviderError)
  , #[error(transparent)]
    Extraction(#[from] ExtractionError)
  , #[error(transparent)]
    Schema(#[from] SchemaError)
}

impl Error
{   /// Whether a fresh generate/extract/validate round may succeed.
    pub fn is_transient(&self) -> bool
    {   match self
        {   Error::Config(_) => false
          , Error::Provider(e) => e.is_retryable()
          , Error::Extraction(_) => true
          , Error::Schema(_) => true
        }
    }

    /// Stable taxonomy code used in the response envelope
    pub fn code(&self) -> &'static str
    {   match self
        {   Error::Config(_) => "config_error"
          , Error::Provider(_) => "provider_error"
          , Error::Extraction(_) => "extraction_error"
          , Error::Schema(_) => "schema_error"
        }
    }
}

// ===== ConfigError =====

/// Construction-time failures; never retryable.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ConfigError
{   /// Identifier not in the supported provider set
    #[error("unknown provider '{name}'; supported providers: {}", .supported.join(", "))]
    UnknownProvider
    {   name: String
      , supported: Vec<&'static str>
    }
  , /// API key is missing for a provider that requires one
    #[error("missing API key for provider: {0}")]
    MissingApiKey(crate::Provider)
  , /// Invalid option value (HTTP client settings, config file)
    #[error("invalid configuration: {0}")]
    InvalidOption(String)
}

// ===== ProviderError =====

/// Failure class of a vendor call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind
{   /// Connection, DNS, TLS or timeout failure
    Network
  , /// Non-2xx status not covered by a narrower kind
    Status
  , /// 429
    RateLimited
  , /// 401 / 403
    Auth
  , /// Vendor does not know the requested model
    ModelNotFound
  , /// Body could not be decoded into the vendor shape
    Malformed
  , /// Decoded body carried no text content
    MissingContent
  , /// Stream ended abnormally or carried an error event
    Stream
  , /// The HTTP request could not be built from the configured settings
    InvalidRequest
}

impl fmt::Display for ProviderErrorKind
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   let label = match self
        {   ProviderErrorKind::Network => "network error"
          , ProviderErrorKind::Status => "request failed"
          , ProviderErrorKind::RateLimited => "rate limited"
          , ProviderErrorKind::Auth => "authentication failed"
          , ProviderErrorKind::ModelNotFound => "model not found"
          , ProviderErrorKind::Malformed => "malformed response"
          , ProviderErrorKind::MissingContent => "response had no content"
          , ProviderErrorKind::Stream => "stream error"
          , ProviderErrorKind::InvalidRequest => "invalid request"
        };
        f.write_str(label)
    }
}

/// Normalized vendor failure. Never exposes the vendor's own error type.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{provider} {kind}{}: {message}", .status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
pub struct ProviderError
{   pub provider: crate::Provider
  , pub kind: ProviderErrorKind
  , pub status: Option<u16>
  , pub message: String
}

impl ProviderError
{   pub fn new(
      provider: crate::Provider
    , kind: ProviderErrorKind
    , message: impl Into<String>
    ) -> Self
    {   ProviderError
        {   provider
          , kind
          , status: None
          , message: message.into()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self
    {   self.status = Some(status);
        self
    }

    /// Network failures, 5xx, 429 and broken streams are worth another try.
    pub fn is_retryable(&self) -> bool
    {   match self.kind
        {   ProviderErrorKind::Network
          | ProviderErrorKind::RateLimited
          | ProviderErrorKind::Stream => true
          , ProviderErrorKind::Status => {
              self.status.map(|s| s >= 500).unwrap_or(false)
            }
          , ProviderErrorKind::Auth
          | ProviderErrorKind::ModelNotFound
          | ProviderErrorKind::Malformed
          | ProviderErrorKind::MissingContent
          | ProviderErrorKind::InvalidRequest => false
        }
    }
}

// ===== ExtractionError =====

/// Maximum characters of raw text kept for diagnostics
pub const PREVIEW_CHARS: usize = 200;

/// No parseable JSON object was found in the vendor text.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("no JSON object found in model output: {preview:?}")]
pub struct ExtractionError
{   pub preview: String
}

impl ExtractionError
{   pub fn from_raw(raw: &str) -> Self
    {   ExtractionError
        {   preview: raw.chars().take(PREVIEW_CHARS).collect()
        }
    }
}

// ===== SchemaError =====

/// Parsed JSON did not match the declared shape for its kind.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("schema mismatch at {path}: expected {expected}, found {found}")]
pub struct SchemaError
{   /// JSON path of the offending field, e.g. `$.issues[0].kind`
    pub path: String
  , pub expected: String
  , pub found: String
}
