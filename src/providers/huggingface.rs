use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use log::{debug, error, trace};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError, ProviderErrorKind};
use crate::request::{GenerationRequest, GenerationResult};
use super::stream::{self, Accumulator, Flow};
use super::{AdapterSettings, ChunkSender, ProviderAdapter};

const HUGGINGFACE_API_BASE: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";
/// Text generation rejects a zero temperature
const MIN_TEMPERATURE: f32 = 0.01;
const MAX_TEMPERATURE: f32 = 2.0;
const MAX_NEW_TOKENS: u32 = 2048;

#[derive(Debug, Clone, Serialize)]
struct Parameters
{   #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>
  , return_full_text: bool
}

#[derive(Debug, Clone, Serialize)]
struct InferenceOptions
{   wait_for_model: bool
}

#[derive(Debug, Clone, Serialize)]
struct InferenceRequest
{   inputs: String
  , parameters: Parameters
  , options: InferenceOptions
  , #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>
}

/// The inference API takes one prompt string; system text goes first
fn combined_prompt(request: &GenerationRequest) -> String
{   match &request.system_text
    {   Some(system) => format!("{}\n\n{}", system.trim_end(), request.prompt_text)
      , None => request.prompt_text.clone()
    }
}

/// Hugging Face Inference API adapter (text-generation task)
pub struct HuggingFaceAdapter
{   settings: AdapterSettings
}

impl HuggingFaceAdapter
{   pub fn new(config: ProviderConfig) -> Result<Self, ConfigError>
    {   debug!("Creating HuggingFaceAdapter");
        Ok(HuggingFaceAdapter
        {   settings: AdapterSettings::new(
              crate::Provider::HuggingFace,
              config,
              HUGGINGFACE_API_BASE,
              DEFAULT_MODEL
            )?
        })
    }

    fn build_request(&self, request: &GenerationRequest, stream: bool)
      -> InferenceRequest
    {   InferenceRequest
        {   inputs: combined_prompt(request)
          , parameters: Parameters
            {   temperature: self.settings
                  .temperature_for(request, MIN_TEMPERATURE, MAX_TEMPERATURE)
              , max_new_tokens: self.settings
                  .max_tokens_for(request, Some(MAX_NEW_TOKENS))
              , return_full_text: false
            }
          , options: InferenceOptions { wait_for_model: true }
          , stream: stream.then_some(true)
        }
    }

    async fn post(&self, model: &str, body: &InferenceRequest)
      -> Result<reqwest::Response, ProviderError>
    {   trace!("HuggingFace request for {}: {:?}", model, body);
        self.settings.send(
          self.settings.http
            .post(format!("{}/models/{}", self.settings.api_base, model))
            .bearer_auth(self.settings.api_key())
            .json(body)
        ).await
    }
}

#[async_trait]
impl ProviderAdapter for HuggingFaceAdapter
{   fn provider(&self) -> crate::Provider
    {   crate::Provider::HuggingFace
    }

    fn default_model(&self) -> &str
    {   &self.settings.model
    }

    async fn generate(&self, request: &GenerationRequest)
      -> Result<GenerationResult, ProviderError>
    {   let model = self.settings.model_for(request);
        debug!("HuggingFace generate with {}", model);
        let response = self.post(&model, &self.build_request(request, false)).await?;
        let parsed: Value = self.settings.read_json(response).await?;

        // `[{"generated_text": ...}]`, or a bare object from some deployments
        let first = match &parsed
        {   Value::Array(items) => items.first()
          , other => Some(other)
        };
        let text = first
          .and_then(|item| item["generated_text"].as_str())
          .ok_or_else(|| {
            if let Some(message) = parsed["error"].as_str()
            {   error!("HuggingFace returned an error body: {}", message);
                return self.settings.error(ProviderErrorKind::Malformed, message);
            }
            error!("HuggingFace response had no generated_text");
            self.settings.error(
              ProviderErrorKind::MissingContent,
              "response contained no generated_text"
            )
          })?;

        let complete = first
          .and_then(|item| item["details"]["finish_reason"].as_str())
          .map(|r| !super::is_length_stop(r))
          .unwrap_or(true);
        Ok(self.settings.result(text.to_string(), model, complete))
    }

    async fn generate_stream(
      &self
    , request: &GenerationRequest
    , chunks: ChunkSender
    ) -> Result<GenerationResult, ProviderError>
    {   let model = self.settings.model_for(request);
        debug!("HuggingFace generate_stream with {}", model);
        let response = self.post(&model, &self.build_request(request, true)).await?;

        let provider = self.settings.provider;
        let mut acc = Accumulator::default();
        let terminated = stream::for_each_line(provider, response, |line| {
          let Some(data) = stream::sse_data(line) else
          {   return Ok(Flow::Continue);
          };
          let event = stream::parse_event(provider, data)?;
          if let Some(message) = event["error"].as_str()
          {   return Err(ProviderError::new(
              provider,
              ProviderErrorKind::Stream,
              message
            ));
          }
          let token = &event["token"];
          if !token["special"].as_bool().unwrap_or(false)
          {   if let Some(text) = token["text"].as_str()
              {   acc.push(text, &chunks);
              }
          }
          if let Some(reason) = event["details"]["finish_reason"].as_str()
          {   acc.finish_reason(reason);
          }
          if event["generated_text"].is_string()
          {   return Ok(Flow::Done);
          }
          Ok(Flow::Continue)
        }).await?;

        Ok(acc.into_result(&self.settings, model, terminated))
    }
}
