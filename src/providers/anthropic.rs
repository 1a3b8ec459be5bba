use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, error, trace};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError, ProviderErrorKind};
use crate::request::{GenerationRequest, GenerationResult};
use super::stream::{self, Accumulator, Flow};
use super::{AdapterSettings, ChunkSender, ProviderAdapter};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const MAX_TEMPERATURE: f32 = 1.0;
const MAX_OUTPUT_TOKENS: u32 = 8192;
/// The messages API requires max_tokens on every call
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Serialize)]
struct Message
{   role: &'static str
  , content: String
}

#[derive(Debug, Clone, Serialize)]
struct MessagesRequest
{   model: String
  , max_tokens: u32
  , messages: Vec<Message>
  , #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>
}

#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse
{   #[serde(default)]
    model: Option<String>
  , #[serde(default)]
    content: Vec<ContentBlock>
  , #[serde(default)]
    stop_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock
{   #[serde(rename = "type")]
    block_type: String
  , #[serde(default)]
    text: Option<String>
}

/// Anthropic messages API adapter
pub struct AnthropicAdapter
{   settings: AdapterSettings
}

impl AnthropicAdapter
{   pub fn new(config: ProviderConfig) -> Result<Self, ConfigError>
    {   debug!("Creating AnthropicAdapter");
        Ok(AnthropicAdapter
        {   settings: AdapterSettings::new(
              crate::Provider::Anthropic,
              config,
              ANTHROPIC_API_BASE,
              DEFAULT_MODEL
            )?
        })
    }

    fn build_request(&self, request: &GenerationRequest, stream: bool)
      -> MessagesRequest
    {   MessagesRequest
        {   model: self.settings.model_for(request)
          , max_tokens: self.settings
              .max_tokens_for(request, Some(MAX_OUTPUT_TOKENS))
              .unwrap_or(DEFAULT_MAX_TOKENS)
          , messages: vec![Message
            {   role: "user"
              , content: request.prompt_text.clone()
            }]
          , system: request.system_text.clone()
          , temperature: self.settings
              .temperature_for(request, 0.0, MAX_TEMPERATURE)
          , stream: stream.then_some(true)
        }
    }

    async fn post(&self, body: &MessagesRequest)
      -> Result<reqwest::Response, ProviderError>
    {   trace!("Anthropic request: {:?}", body);
        self.settings.send(
          self.settings.http
            .post(format!("{}/messages", self.settings.api_base))
            .header("x-api-key", self.settings.api_key())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
        ).await
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter
{   fn provider(&self) -> crate::Provider
    {   crate::Provider::Anthropic
    }

    fn default_model(&self) -> &str
    {   &self.settings.model
    }

    async fn generate(&self, request: &GenerationRequest)
      -> Result<GenerationResult, ProviderError>
    {   debug!("Anthropic generate");
        let body = self.build_request(request, false);
        let response = self.post(&body).await?;
        let parsed: MessagesResponse = self.settings.read_json(response).await?;

        let texts: Vec<String> = parsed.content
          .into_iter()
          .filter(|block| block.block_type == "text")
          .filter_map(|block| block.text)
          .collect();
        if texts.is_empty()
        {   error!("Anthropic response had no text blocks");
            return Err(self.settings.error(
              ProviderErrorKind::MissingContent,
              "response contained no text content"
            ));
        }

        let complete = parsed.stop_reason
          .as_deref()
          .map(|r| !super::is_length_stop(r))
          .unwrap_or(true);
        Ok(self.settings.result(
          texts.concat(),
          parsed.model.unwrap_or(body.model),
          complete
        ))
    }

    async fn generate_stream(
      &self
    , request: &GenerationRequest
    , chunks: ChunkSender
    ) -> Result<GenerationResult, ProviderError>
    {   debug!("Anthropic generate_stream");
        let body = self.build_request(request, true);
        let response = self.post(&body).await?;

        let provider = self.settings.provider;
        let mut acc = Accumulator::default();
        let terminated = stream::for_each_line(provider, response, |line| {
          let Some(data) = stream::sse_data(line) else
          {   return Ok(Flow::Continue);
          };
          let event = stream::parse_event(provider, data)?;
          match event["type"].as_str().unwrap_or_default()
          {   "message_start" => {
                acc.model = event["message"]["model"].as_str().map(str::to_string);
              }
            , "content_block_delta" => {
                if let Some(text) = event["delta"]["text"].as_str()
                {   acc.push(text, &chunks);
                }
              }
            , "message_delta" => {
                if let Some(reason) = event["delta"]["stop_reason"].as_str()
                {   acc.finish_reason(reason);
                }
              }
            , "message_stop" => return Ok(Flow::Done)
            , "error" => {
                let message = event["error"]["message"]
                  .as_str()
                  .unwrap_or("Unknown streaming error");
                return Err(ProviderError::new(
                  provider,
                  ProviderErrorKind::Stream,
                  message
                ));
              }
            , _ => {}
          }
          Ok(Flow::Continue)
        }).await?;

        Ok(acc.into_result(&self.settings, body.model, terminated))
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_messages_request_mapping()
    {   let adapter = AnthropicAdapter::new(
          ProviderConfig::new("k").with_model("claude-test")
        ).unwrap();
        let request = GenerationRequest::new("hello")
          .with_system("sys")
          .with_temperature(2.0);
        let json = serde_json::to_value(adapter.build_request(&request, false)).unwrap();
        assert_eq!(json["model"], "claude-test");
        assert_eq!(json["system"], "sys");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(json["temperature"], 1.0);
    }
}
