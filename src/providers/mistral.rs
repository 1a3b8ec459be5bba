use async_trait::async_trait;
use serde::Serialize;
use log::{debug, trace};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError};
use crate::request::{GenerationRequest, GenerationResult};
use super::openai::{self, ChatMessage};
use super::{AdapterSettings, ChunkSender, ProviderAdapter};

const MISTRAL_API_BASE: &str
  = "https://api.mistral.ai/v1";
pub const DEFAULT_MODEL: &str = "mistral-small-latest";
const MAX_TEMPERATURE: f32 = 1.0;
const MAX_OUTPUT_TOKENS: u32 = 32000;

// ===== Message Types =====

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MistralChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>
  , /// Mistral's own guardrail prompt; the caller's system text rules
    pub safe_prompt: bool
}

/// Mistral chat adapter (OpenAI-compatible wire format)
pub struct MistralAdapter
{   settings: AdapterSettings
}

impl MistralAdapter
{   pub fn new(config: ProviderConfig) -> Result<Self, ConfigError>
    {   debug!("Creating MistralAdapter");
        Ok(MistralAdapter
        {   settings: AdapterSettings::new(
              crate::Provider::Mistral,
              config,
              MISTRAL_API_BASE,
              DEFAULT_MODEL
            )?
        })
    }

    fn build_request(&self, request: &GenerationRequest, stream: bool)
      -> MistralChatRequest
    {   let request = MistralChatRequest
        {   model: self.settings.model_for(request)
          , messages: openai::chat_messages(request)
          , max_tokens: self.settings
              .max_tokens_for(request, Some(MAX_OUTPUT_TOKENS))
          , temperature: self.settings
              .temperature_for(request, 0.0, MAX_TEMPERATURE)
          , stream: stream.then_some(true)
          , safe_prompt: false
        };
        trace!("Mistral request: {:?}", request);
        request
    }
}

#[async_trait]
impl ProviderAdapter for MistralAdapter
{   fn provider(&self) -> crate::Provider
    {   crate::Provider::Mistral
    }

    fn default_model(&self) -> &str
    {   &self.settings.model
    }

    async fn generate(&self, request: &GenerationRequest)
      -> Result<GenerationResult, ProviderError>
    {   debug!("Handling generate for: {:?}", request.model);
        let body = self.build_request(request, false);
        let model = body.model.clone();
        openai::complete(&self.settings, &body, model).await
    }

    async fn generate_stream(
      &self
    , request: &GenerationRequest
    , chunks: ChunkSender
    ) -> Result<GenerationResult, ProviderError>
    {   debug!("Handling generate_stream for: {:?}", request.model);
        let body = self.build_request(request, true);
        let model = body.model.clone();
        openai::complete_stream(&self.settings, &body, model, chunks).await
    }
}
