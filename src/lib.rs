pub mod error;
pub mod config;
pub mod request;
pub mod catalog;
pub mod prompt;
pub mod extract;
pub mod schema;
pub mod providers;
pub mod factory;
pub mod retry;
pub mod client;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/*

uikit-ai: one request syntax over every LLM vendor we talk to, and one
typed answer back out, no matter how chatty the model was.

src/
├── lib.rs          # Re-exports, Provider and ResponseKind
├── error.rs        # Config / Provider / Extraction / Schema errors
├── config.rs       # Provider, retry and assistant configuration
├── request.rs      # GenerationRequest / GenerationResult / ApiResponse
├── catalog.rs      # Component catalog consumed by the prompt builder
├── prompt.rs       # System + user prompt construction
├── extract.rs      # Pull the JSON object out of model prose
├── schema.rs       # ComponentIntent and its strict validator
├── providers/      # One adapter per vendor behind ProviderAdapter
├── factory.rs      # Provider id -> adapter
├── retry.rs        # Exponential backoff
└── client.rs       # generate -> extract -> validate pipeline

*/

pub use error::{
  ConfigError, Error, ExtractionError, ProviderError, ProviderErrorKind,
  SchemaError
};
pub use config::{AssistantConfig, ProviderConfig, RetryConfig};
pub use request::{ApiResponse, GenerationRequest, GenerationResult};
pub use catalog::{CatalogEntry, ComponentCatalog};
pub use prompt::{Prompt, PromptBuilder};
pub use extract::ResponseExtractor;
pub use schema::{ComponentIntent, SchemaValidator};
pub use providers::{ChunkSender, ProviderAdapter};
pub use factory::ServiceFactory;
pub use retry::{with_retry, with_retry_if, RetryPolicy};
pub use client::{AssistantClient, Generated};

/// Supported LLM vendors.
/// Each variant has exactly one adapter under `providers/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider
{   /// OpenAI chat completions
    OpenAI
  , /// Anthropic messages API
    Anthropic
  , /// Google AI Studio (Gemini)
    Google
  , /// Cohere chat
    Cohere
  , /// Mistral AI (Le Chat, Mistral models)
    Mistral
  , /// Hugging Face Inference API
    HuggingFace
  , /// Local/self-hosted models served Ollama-style
    Local
}

impl Provider
{   /// Every provider, in the order error messages list them
    pub const ALL: [Provider; 7] = [
      Provider::OpenAI
    , Provider::Anthropic
    , Provider::Google
    , Provider::Cohere
    , Provider::Mistral
    , Provider::HuggingFace
    , Provider::Local
    ];

    pub fn as_str(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "openai"
          , Provider::Anthropic => "anthropic"
          , Provider::Google => "google"
          , Provider::Cohere => "cohere"
          , Provider::Mistral => "mistral"
          , Provider::HuggingFace => "huggingface"
          , Provider::Local => "local"
        }
    }

    /// Canonical identifiers accepted by the factory
    pub fn identifiers() -> Vec<&'static str>
    {   Provider::ALL.iter().map(|p| p.as_str()).collect()
    }

    /// Prefix for the explicit environment helper in `config`
    pub fn env_prefix(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "OPENAI"
          , Provider::Anthropic => "ANTHROPIC"
          , Provider::Google => "GOOGLE"
          , Provider::Cohere => "COHERE"
          , Provider::Mistral => "MISTRAL"
          , Provider::HuggingFace => "HUGGINGFACE"
          , Provider::Local => "LOCAL"
        }
    }

    pub fn requires_api_key(&self) -> bool
    {   !matches!(self, Provider::Local)
    }
}

impl fmt::Display for Provider
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.as_str())
    }
}

impl FromStr for Provider
{   type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "openai" => Ok(Provider::OpenAI)
          , "anthropic" | "claude" => Ok(Provider::Anthropic)
          , "google" | "gemini" => Ok(Provider::Google)
          , "cohere" => Ok(Provider::Cohere)
          , "mistral" | "mistralai" => Ok(Provider::Mistral)
          , "huggingface" | "hf" => Ok(Provider::HuggingFace)
          , "local" | "ollama" => Ok(Provider::Local)
          , _ => Err(ConfigError::UnknownProvider
            {   name: s.to_string()
              , supported: Provider::identifiers()
            })
        }
    }
}

/// What the caller wants back from the model.
/// Drives both prompt construction and schema validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseKind
{   /// Which catalog components fit a request
    Suggestion
  , /// HTML markup built from catalog components
    UiGeneration
  , /// CSS plus design tokens
    Theme
  , /// Review of existing markup
    Analysis
  , /// Rewrite of existing markup
    Improvement
  , /// Structured intent handed to code generators
    ComponentIntent
}

impl ResponseKind
{   pub const ALL: [ResponseKind; 6] = [
      ResponseKind::Suggestion
    , ResponseKind::UiGeneration
    , ResponseKind::Theme
    , ResponseKind::Analysis
    , ResponseKind::Improvement
    , ResponseKind::ComponentIntent
    ];

    pub fn as_str(&self) -> &'static str
    {   match self
        {   ResponseKind::Suggestion => "suggestion"
          , ResponseKind::UiGeneration => "ui-generation"
          , ResponseKind::Theme => "theme"
          , ResponseKind::Analysis => "analysis"
          , ResponseKind::Improvement => "improvement"
          , ResponseKind::ComponentIntent => "component-intent"
        }
    }

    /// Kinds whose prompt embeds the component catalog
    pub fn uses_catalog(&self) -> bool
    {   matches!(
          self,
          ResponseKind::Suggestion
            | ResponseKind::UiGeneration
            | ResponseKind::Analysis
            | ResponseKind::Improvement
        )
    }
}

impl fmt::Display for ResponseKind
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.as_str())
    }
}

impl FromStr for ResponseKind
{   type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   ResponseKind::ALL
          .iter()
          .copied()
          .find(|k| k.as_str() == s.trim())
          .ok_or_else(|| ConfigError::InvalidOption(
            format!("unknown response kind: {}", s)
          ))
    }
}
