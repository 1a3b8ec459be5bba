use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{debug, error, trace};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError, ProviderErrorKind};
use crate::request::{GenerationRequest, GenerationResult};
use super::stream::{self, Accumulator, Flow};
use super::{AdapterSettings, ChunkSender, ProviderAdapter};

const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const MAX_TEMPERATURE: f32 = 2.0;
const MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part
{   #[serde(default)]
    text: Option<String>
}

#[derive(Debug, Clone, Serialize)]
struct Content
{   #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>
  , parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig
{   #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest
{   contents: Vec<Content>
  , #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>
  , generation_config: GenerationConfig
}

/// Text and finish reason of the first candidate in a response or chunk
fn first_candidate(value: &Value) -> (Option<String>, Option<&str>)
{   let candidate = &value["candidates"][0];
    let text = candidate["content"]["parts"]
      .as_array()
      .map(|parts| {
        parts
          .iter()
          .filter_map(|p| p["text"].as_str())
          .collect::<String>()
      });
    (text, candidate["finishReason"].as_str())
}

/// Google AI Studio (Gemini) adapter
pub struct GoogleAdapter
{   settings: AdapterSettings
}

impl GoogleAdapter
{   pub fn new(config: ProviderConfig) -> Result<Self, ConfigError>
    {   debug!("Creating GoogleAdapter");
        Ok(GoogleAdapter
        {   settings: AdapterSettings::new(
              crate::Provider::Google,
              config,
              GOOGLE_API_BASE,
              DEFAULT_MODEL
            )?
        })
    }

    fn build_request(&self, request: &GenerationRequest)
      -> GenerateContentRequest
    {   GenerateContentRequest
        {   contents: vec![Content
            {   role: Some("user")
              , parts: vec![Part { text: Some(request.prompt_text.clone()) }]
            }]
          , system_instruction: request.system_text.as_ref().map(|system| Content
            {   role: None
              , parts: vec![Part { text: Some(system.clone()) }]
            })
          , generation_config: GenerationConfig
            {   temperature: self.settings
                  .temperature_for(request, 0.0, MAX_TEMPERATURE)
              , max_output_tokens: self.settings
                  .max_tokens_for(request, Some(MAX_OUTPUT_TOKENS))
            }
        }
    }

    async fn post(&self, url: String, body: &GenerateContentRequest)
      -> Result<reqwest::Response, ProviderError>
    {   trace!("Google request to {}: {:?}", url, body);
        self.settings.send(
          self.settings.http
            .post(url)
            .header("x-goog-api-key", self.settings.api_key())
            .json(body)
        ).await
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter
{   fn provider(&self) -> crate::Provider
    {   crate::Provider::Google
    }

    fn default_model(&self) -> &str
    {   &self.settings.model
    }

    async fn generate(&self, request: &GenerationRequest)
      -> Result<GenerationResult, ProviderError>
    {   let model = self.settings.model_for(request);
        debug!("Google generate with {}", model);
        let url = format!(
          "{}/models/{}:generateContent",
          self.settings.api_base, model
        );
        let response = self.post(url, &self.build_request(request)).await?;
        let parsed: Value = self.settings.read_json(response).await?;

        let (text, finish_reason) = first_candidate(&parsed);
        let text = text.filter(|t| !t.is_empty()).ok_or_else(|| {
          let reason = parsed["promptFeedback"]["blockReason"]
            .as_str()
            .or(finish_reason)
            .unwrap_or("no candidates");
          error!("Google response had no text: {}", reason);
          self.settings.error(
            ProviderErrorKind::MissingContent,
            format!("response contained no text ({})", reason)
          )
        })?;

        let complete = finish_reason
          .map(|r| !super::is_length_stop(r))
          .unwrap_or(true);
        let model_used = parsed["modelVersion"]
          .as_str()
          .map(str::to_string)
          .unwrap_or(model);
        Ok(self.settings.result(text, model_used, complete))
    }

    async fn generate_stream(
      &self
    , request: &GenerationRequest
    , chunks: ChunkSender
    ) -> Result<GenerationResult, ProviderError>
    {   let model = self.settings.model_for(request);
        debug!("Google generate_stream with {}", model);
        let url = format!(
          "{}/models/{}:streamGenerateContent?alt=sse",
          self.settings.api_base, model
        );
        let response = self.post(url, &self.build_request(request)).await?;

        let provider = self.settings.provider;
        let mut acc = Accumulator::default();
        let terminated = stream::for_each_line(provider, response, |line| {
          let Some(data) = stream::sse_data(line) else
          {   return Ok(Flow::Continue);
          };
          let event = stream::parse_event(provider, data)?;
          if let Some(message) = event.pointer("/error/message").and_then(|m| m.as_str())
          {   return Err(ProviderError::new(
              provider,
              ProviderErrorKind::Stream,
              message
            ));
          }
          if acc.model.is_none()
          {   acc.model = event["modelVersion"].as_str().map(str::to_string);
          }
          let (text, finish_reason) = first_candidate(&event);
          if let Some(text) = text
          {   acc.push(&text, &chunks);
          }
          match finish_reason
          {   Some(reason) => {
                acc.finish_reason(reason);
                Ok(Flow::Done)
              }
            , None => Ok(Flow::Continue)
          }
        }).await?;

        Ok(acc.into_result(&self.settings, model, terminated))
    }
}
