use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use log::{debug, error, trace};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError, ProviderErrorKind};
use crate::request::{GenerationRequest, GenerationResult};
use super::stream::{self, Accumulator, Flow};
use super::{AdapterSettings, ChunkSender, ProviderAdapter};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_TEMPERATURE: f32 = 2.0;
const MAX_OUTPUT_TOKENS: u32 = 16384;

// ===== Chat completion wire types (shared with OpenAI-compatible vendors) =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse
{   #[serde(default)]
    pub model: Option<String>
  , #[serde(default)]
    pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Choice
{   pub message: ResponseMessage
  , pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResponseMessage
{   #[serde(default)]
    pub content: Option<String>
}

/// System message first (when present), then the user prompt
pub(crate) fn chat_messages(request: &GenerationRequest) -> Vec<ChatMessage>
{   let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system_text
    {   messages.push(ChatMessage
        {   role: "system".to_string()
          , content: system.clone()
        });
    }
    messages.push(ChatMessage
    {   role: "user".to_string()
      , content: request.prompt_text.clone()
    });
    messages
}

/// Build a chat completion request within the vendor's native bounds
pub(crate) fn chat_request(
  settings: &AdapterSettings
, request: &GenerationRequest
, max_temperature: f32
, max_output_tokens: u32
, stream: bool
) -> ChatRequest
{   ChatRequest
    {   model: settings.model_for(request)
      , messages: chat_messages(request)
      , max_tokens: settings.max_tokens_for(request, Some(max_output_tokens))
      , temperature: settings.temperature_for(request, 0.0, max_temperature)
      , stream: stream.then_some(true)
    }
}

/// POST a chat completion and normalize the first choice.
/// `model` is reported when the vendor does not echo one back.
pub(crate) async fn complete<B: Serialize + fmt::Debug>(
  settings: &AdapterSettings
, body: &B
, model: String
) -> Result<GenerationResult, ProviderError>
{   trace!("{} request: {:?}", settings.provider, body);
    let response = settings.send(
      settings.http
        .post(format!("{}/chat/completions", settings.api_base))
        .bearer_auth(settings.api_key())
        .json(body)
    ).await?;

    let chat_response: ChatResponse = settings.read_json(response).await?;
    let choice = chat_response.choices.into_iter().next().ok_or_else(|| {
      error!("No choices in response");
      settings.error(
        ProviderErrorKind::MissingContent,
        "response contained no choices"
      )
    })?;
    let text = choice.message.content.ok_or_else(|| {
      error!("First choice had no content");
      settings.error(
        ProviderErrorKind::MissingContent,
        "first choice had no content"
      )
    })?;
    let complete = choice.finish_reason
      .as_deref()
      .map(|r| !super::is_length_stop(r))
      .unwrap_or(true);

    Ok(settings.result(
      text,
      chat_response.model.unwrap_or(model),
      complete
    ))
}

/// POST a streamed chat completion and accumulate `delta.content`
pub(crate) async fn complete_stream<B: Serialize + fmt::Debug>(
  settings: &AdapterSettings
, body: &B
, model: String
, chunks: ChunkSender
) -> Result<GenerationResult, ProviderError>
{   trace!("{} stream request: {:?}", settings.provider, body);
    let response = settings.send(
      settings.http
        .post(format!("{}/chat/completions", settings.api_base))
        .bearer_auth(settings.api_key())
        .json(body)
    ).await?;

    let provider = settings.provider;
    let mut acc = Accumulator::default();
    let terminated = stream::for_each_line(provider, response, |line| {
      let Some(data) = stream::sse_data(line) else
      {   return Ok(Flow::Continue);
      };
      if data == "[DONE]"
      {   return Ok(Flow::Done);
      }
      let event = stream::parse_event(provider, data)?;
      if let Some(message) = event.pointer("/error/message").and_then(|m| m.as_str())
      {   return Err(ProviderError::new(
          provider,
          ProviderErrorKind::Stream,
          message
        ));
      }
      if acc.model.is_none()
      {   acc.model = event["model"].as_str().map(str::to_string);
      }
      let choice = &event["choices"][0];
      if let Some(delta) = choice["delta"]["content"].as_str()
      {   acc.push(delta, &chunks);
      }
      if let Some(reason) = choice["finish_reason"].as_str()
      {   acc.finish_reason(reason);
      }
      Ok(Flow::Continue)
    }).await?;

    Ok(acc.into_result(settings, model, terminated))
}

/// OpenAI chat completions adapter
pub struct OpenAIAdapter
{   settings: AdapterSettings
}

impl OpenAIAdapter
{   pub fn new(config: ProviderConfig) -> Result<Self, ConfigError>
    {   debug!("Creating OpenAIAdapter");
        Ok(OpenAIAdapter
        {   settings: AdapterSettings::new(
              crate::Provider::OpenAI,
              config,
              OPENAI_API_BASE,
              DEFAULT_MODEL
            )?
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAIAdapter
{   fn provider(&self) -> crate::Provider
    {   crate::Provider::OpenAI
    }

    fn default_model(&self) -> &str
    {   &self.settings.model
    }

    async fn generate(&self, request: &GenerationRequest)
      -> Result<GenerationResult, ProviderError>
    {   debug!("OpenAI generate");
        let body = chat_request(
          &self.settings, request, MAX_TEMPERATURE, MAX_OUTPUT_TOKENS, false
        );
        let model = body.model.clone();
        complete(&self.settings, &body, model).await
    }

    async fn generate_stream(
      &self
    , request: &GenerationRequest
    , chunks: ChunkSender
    ) -> Result<GenerationResult, ProviderError>
    {   debug!("OpenAI generate_stream");
        let body = chat_request(
          &self.settings, request, MAX_TEMPERATURE, MAX_OUTPUT_TOKENS, true
        );
        let model = body.model.clone();
        complete_stream(&self.settings, &body, model, chunks).await
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_chat_request_mapping()
    {   let adapter = OpenAIAdapter::new(ProviderConfig::new("k")).unwrap();
        let request = GenerationRequest::new("build a form")
          .with_system("be terse")
          .with_temperature(1.5)
          .with_max_tokens(100000);
        let body = chat_request(
          &adapter.settings, &request, MAX_TEMPERATURE, MAX_OUTPUT_TOKENS, false
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "build a form");
        assert_eq!(json["temperature"], 1.5);
        assert_eq!(json["max_tokens"], MAX_OUTPUT_TOKENS);
        assert!(json.get("stream").is_none());
    }
}
