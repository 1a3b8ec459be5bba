use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, error, trace};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError, ProviderErrorKind};
use crate::request::{GenerationRequest, GenerationResult};
use super::stream::{self, Accumulator, Flow};
use super::{AdapterSettings, ChunkSender, ProviderAdapter};

const COHERE_API_BASE: &str = "https://api.cohere.ai/v1";
pub const DEFAULT_MODEL: &str = "command-r";
const MAX_TEMPERATURE: f32 = 1.0;
const MAX_OUTPUT_TOKENS: u32 = 4000;

#[derive(Debug, Clone, Serialize)]
struct CohereChatRequest
{   model: String
  , message: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    preamble: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>
}

#[derive(Debug, Clone, Deserialize)]
struct CohereChatResponse
{   #[serde(default)]
    text: Option<String>
  , #[serde(default)]
    finish_reason: Option<String>
}

/// Cohere chat adapter: system text travels as the `preamble`
pub struct CohereAdapter
{   settings: AdapterSettings
}

impl CohereAdapter
{   pub fn new(config: ProviderConfig) -> Result<Self, ConfigError>
    {   debug!("Creating CohereAdapter");
        Ok(CohereAdapter
        {   settings: AdapterSettings::new(
              crate::Provider::Cohere,
              config,
              COHERE_API_BASE,
              DEFAULT_MODEL
            )?
        })
    }

    fn build_request(&self, request: &GenerationRequest, stream: bool)
      -> CohereChatRequest
    {   CohereChatRequest
        {   model: self.settings.model_for(request)
          , message: request.prompt_text.clone()
          , preamble: request.system_text.clone()
          , temperature: self.settings
              .temperature_for(request, 0.0, MAX_TEMPERATURE)
          , max_tokens: self.settings
              .max_tokens_for(request, Some(MAX_OUTPUT_TOKENS))
          , stream: stream.then_some(true)
        }
    }

    async fn post(&self, body: &CohereChatRequest)
      -> Result<reqwest::Response, ProviderError>
    {   trace!("Cohere request: {:?}", body);
        self.settings.send(
          self.settings.http
            .post(format!("{}/chat", self.settings.api_base))
            .bearer_auth(self.settings.api_key())
            .json(body)
        ).await
    }
}

#[async_trait]
impl ProviderAdapter for CohereAdapter
{   fn provider(&self) -> crate::Provider
    {   crate::Provider::Cohere
    }

    fn default_model(&self) -> &str
    {   &self.settings.model
    }

    async fn generate(&self, request: &GenerationRequest)
      -> Result<GenerationResult, ProviderError>
    {   debug!("Cohere generate");
        let body = self.build_request(request, false);
        let response = self.post(&body).await?;
        let parsed: CohereChatResponse = self.settings.read_json(response).await?;

        let text = parsed.text.ok_or_else(|| {
          error!("Cohere response had no text");
          self.settings.error(
            ProviderErrorKind::MissingContent,
            "response contained no text"
          )
        })?;
        let complete = parsed.finish_reason
          .as_deref()
          .map(|r| !super::is_length_stop(r))
          .unwrap_or(true);
        Ok(self.settings.result(text, body.model, complete))
    }

    async fn generate_stream(
      &self
    , request: &GenerationRequest
    , chunks: ChunkSender
    ) -> Result<GenerationResult, ProviderError>
    {   debug!("Cohere generate_stream");
        let body = self.build_request(request, true);
        let response = self.post(&body).await?;

        let provider = self.settings.provider;
        let mut acc = Accumulator::default();
        // Newline-delimited JSON, one event per line
        let terminated = stream::for_each_line(provider, response, |line| {
          let event = stream::parse_event(provider, line)?;
          match event["event_type"].as_str().unwrap_or_default()
          {   "text-generation" => {
                if let Some(text) = event["text"].as_str()
                {   acc.push(text, &chunks);
                }
                Ok(Flow::Continue)
              }
            , "stream-end" => {
                let reason = event["finish_reason"].as_str().unwrap_or("COMPLETE");
                if reason.starts_with("ERROR")
                {   return Err(ProviderError::new(
                      provider,
                      ProviderErrorKind::Stream,
                      format!("stream ended with {}", reason)
                    ));
                }
                acc.finish_reason(reason);
                Ok(Flow::Done)
              }
            , _ => Ok(Flow::Continue)
          }
        }).await?;

        Ok(acc.into_result(&self.settings, body.model, terminated))
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_chat_request_uses_preamble()
    {   let adapter = CohereAdapter::new(ProviderConfig::new("k")).unwrap();
        let request = GenerationRequest::new("hi").with_system("sys");
        let json = serde_json::to_value(adapter.build_request(&request, false)).unwrap();
        assert_eq!(json["message"], "hi");
        assert_eq!(json["preamble"], "sys");
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert!(json.get("temperature").is_none());
    }
}
