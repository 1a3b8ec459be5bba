use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, error, trace};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError, ProviderErrorKind};
use crate::request::{GenerationRequest, GenerationResult};
use super::stream::{self, Accumulator, Flow};
use super::{AdapterSettings, ChunkSender, ProviderAdapter};

const OLLAMA_API_BASE: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";
const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions
{   #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest
{   model: String
  , prompt: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>
  , /// Ollama streams unless told otherwise
    stream: bool
  , options: GenerateOptions
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse
{   #[serde(default)]
    model: Option<String>
  , #[serde(default)]
    response: Option<String>
  , #[serde(default)]
    done_reason: Option<String>
}

/// Self-hosted model server speaking the Ollama generate API.
/// No API key; the base URL points at the local daemon.
pub struct LocalAdapter
{   settings: AdapterSettings
}

impl LocalAdapter
{   pub fn new(config: ProviderConfig) -> Result<Self, ConfigError>
    {   debug!("Creating LocalAdapter");
        Ok(LocalAdapter
        {   settings: AdapterSettings::new(
              crate::Provider::Local,
              config,
              OLLAMA_API_BASE,
              DEFAULT_MODEL
            )?
        })
    }

    fn build_request(&self, request: &GenerationRequest, stream: bool)
      -> GenerateRequest
    {   GenerateRequest
        {   model: self.settings.model_for(request)
          , prompt: request.prompt_text.clone()
          , system: request.system_text.clone()
          , stream
          , options: GenerateOptions
            {   temperature: self.settings
                  .temperature_for(request, 0.0, MAX_TEMPERATURE)
              , num_predict: self.settings.max_tokens_for(request, None)
            }
        }
    }

    async fn post(&self, body: &GenerateRequest)
      -> Result<reqwest::Response, ProviderError>
    {   trace!("Local request: {:?}", body);
        let mut builder = self.settings.http
          .post(format!("{}/api/generate", self.settings.api_base))
          .json(body);
        // Proxies in front of a local server sometimes want a token
        if let Some(key) = &self.settings.api_key
        {   builder = builder.bearer_auth(key);
        }
        self.settings.send(builder).await
    }
}

#[async_trait]
impl ProviderAdapter for LocalAdapter
{   fn provider(&self) -> crate::Provider
    {   crate::Provider::Local
    }

    fn default_model(&self) -> &str
    {   &self.settings.model
    }

    async fn generate(&self, request: &GenerationRequest)
      -> Result<GenerationResult, ProviderError>
    {   debug!("Local generate");
        let body = self.build_request(request, false);
        let response = self.post(&body).await?;
        let parsed: GenerateResponse = self.settings.read_json(response).await?;

        let text = parsed.response.ok_or_else(|| {
          error!("Local response had no text");
          self.settings.error(
            ProviderErrorKind::MissingContent,
            "response contained no text"
          )
        })?;
        let complete = parsed.done_reason
          .as_deref()
          .map(|r| !super::is_length_stop(r))
          .unwrap_or(true);
        Ok(self.settings.result(
          text,
          parsed.model.unwrap_or(body.model),
          complete
        ))
    }

    async fn generate_stream(
      &self
    , request: &GenerationRequest
    , chunks: ChunkSender
    ) -> Result<GenerationResult, ProviderError>
    {   debug!("Local generate_stream");
        let body = self.build_request(request, true);
        let response = self.post(&body).await?;

        let provider = self.settings.provider;
        let mut acc = Accumulator::default();
        let terminated = stream::for_each_line(provider, response, |line| {
          let event = stream::parse_event(provider, line)?;
          if let Some(message) = event["error"].as_str()
          {   return Err(ProviderError::new(
              provider,
              ProviderErrorKind::Stream,
              message
            ));
          }
          if acc.model.is_none()
          {   acc.model = event["model"].as_str().map(str::to_string);
          }
          if let Some(text) = event["response"].as_str()
          {   acc.push(text, &chunks);
          }
          if event["done"].as_bool().unwrap_or(false)
          {   if let Some(reason) = event["done_reason"].as_str()
              {   acc.finish_reason(reason);
              }
              return Ok(Flow::Done);
          }
          Ok(Flow::Continue)
        }).await?;

        Ok(acc.into_result(&self.settings, body.model, terminated))
    }
}
