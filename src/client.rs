//! The assistant pipeline: prompt -> adapter -> extract -> validate

use std::sync::Arc;
use log::{debug, error, info, warn};
use crate::catalog::ComponentCatalog;
use crate::config::AssistantConfig;
use crate::error::{Error, SchemaError};
use crate::extract::ResponseExtractor;
use crate::factory::ServiceFactory;
use crate::prompt::PromptBuilder;
use crate::providers::{ChunkSender, ProviderAdapter};
use crate::request::{ApiResponse, GenerationRequest};
use crate::retry::{with_retry_if, RetryPolicy};
use crate::schema::{
  Analysis, CodegenIntent, ComponentIntent, Improvement, SchemaValidator,
  Suggestions, Theme, UiGeneration
};
use crate::ResponseKind;

/// One validated answer and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Generated
{   pub intent: ComponentIntent
  , pub model: String
  , pub provider: crate::Provider
  , /// False when the vendor truncated the text this was parsed from
    pub is_complete: bool
}

/// Runs requests against one adapter.
/// Holds only shared, immutable state, so one client can serve
/// concurrent callers.
#[derive(Clone)]
pub struct AssistantClient
{   adapter: Arc<dyn ProviderAdapter>
  , catalog: Arc<ComponentCatalog>
  , retry: RetryPolicy
  , prompt_builder: PromptBuilder
}

impl AssistantClient
{   pub fn new(
      adapter: Arc<dyn ProviderAdapter>
    , catalog: Arc<ComponentCatalog>
    ) -> Self
    {   debug!(
          "Creating AssistantClient for {} with {} catalog entries",
          adapter.provider(),
          catalog.len()
        );
        AssistantClient
        {   adapter
          , catalog
          , retry: RetryPolicy::default()
          , prompt_builder: PromptBuilder::new()
        }
    }

    /// Resolve the configured provider and adopt its retry settings
    pub fn from_config(
      config: &AssistantConfig
    , catalog: Arc<ComponentCatalog>
    ) -> Result<Self, Error>
    {   let adapter = ServiceFactory::resolve(
          &config.provider,
          config.provider_config.clone()
        )?;
        Ok(AssistantClient::new(adapter, catalog)
          .with_retry_policy(RetryPolicy::from(&config.retry)))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self
    {   self.retry = retry;
        self
    }

    pub fn with_prompt_builder(mut self, prompt_builder: PromptBuilder) -> Self
    {   self.prompt_builder = prompt_builder;
        self
    }

    pub fn provider(&self) -> crate::Provider
    {   self.adapter.provider()
    }

    pub fn catalog(&self) -> &ComponentCatalog
    {   &self.catalog
    }

    /// Generate, extract and validate one answer of `kind`.
    /// Transient failures rerun the whole round under the retry policy.
    pub async fn run(&self, kind: ResponseKind, user_text: &str)
      -> Result<Generated, Error>
    {   debug!("run {} via {}", kind, self.adapter.provider());
        let request = self.request_for(kind, user_text, false);
        self.retrying(kind, &request, None).await
    }

    /// Same as `run`, forwarding raw text to `chunks` as it arrives.
    /// A retried attempt streams again from the start.
    pub async fn run_streaming(
      &self
    , kind: ResponseKind
    , user_text: &str
    , chunks: ChunkSender
    ) -> Result<Generated, Error>
    {   debug!("run_streaming {} via {}", kind, self.adapter.provider());
        let request = self.request_for(kind, user_text, true);
        self.retrying(kind, &request, Some(chunks)).await
    }

    /// Which catalog components fit the request
    pub async fn suggest(&self, request: &str) -> Result<Suggestions, Error>
    {   self.run_typed(request).await
    }

    /// Markup assembled from catalog components
    pub async fn generate_ui(&self, description: &str)
      -> Result<UiGeneration, Error>
    {   self.run_typed(description).await
    }

    pub async fn generate_theme(&self, description: &str) -> Result<Theme, Error>
    {   self.run_typed(description).await
    }

    /// Review existing markup
    pub async fn analyze(&self, markup: &str) -> Result<Analysis, Error>
    {   self.run_typed(markup).await
    }

    /// Rewrite existing markup
    pub async fn improve(&self, markup: &str) -> Result<Improvement, Error>
    {   self.run_typed(markup).await
    }

    /// Structured intent for code generators
    pub async fn generate_intent(&self, description: &str)
      -> Result<CodegenIntent, Error>
    {   self.run_typed(description).await
    }

    /// `run`, folded into the response envelope. Never fails.
    pub async fn respond(&self, kind: ResponseKind, user_text: &str)
      -> ApiResponse
    {   match self.run(kind, user_text).await
        {   Ok(generated) => {
              info!(
                "{} answered {} with {}",
                generated.provider, kind, generated.model
              );
              ApiResponse::ok(generated.intent.to_json(), generated.model)
            }
          , Err(e) => {
              error!("{} request failed: {}", kind, e);
              ApiResponse::failed(&e)
            }
        }
    }

    fn request_for(&self, kind: ResponseKind, user_text: &str, stream: bool)
      -> GenerationRequest
    {   let prompt = self.prompt_builder.build(kind, user_text, &self.catalog);
        GenerationRequest::from_prompt(prompt).streaming(stream)
    }

    async fn retrying(
      &self
    , kind: ResponseKind
    , request: &GenerationRequest
    , chunks: Option<ChunkSender>
    ) -> Result<Generated, Error>
    {   with_retry_if(
          || self.attempt(kind, request, chunks.clone()),
          &self.retry,
          Error::is_transient,
          |attempt, err| {
            warn!("{} attempt {} failed: {}", kind, attempt, err);
          }
        ).await
    }

    async fn attempt(
      &self
    , kind: ResponseKind
    , request: &GenerationRequest
    , chunks: Option<ChunkSender>
    ) -> Result<Generated, Error>
    {   let result = match chunks
        {   Some(chunks) => self.adapter.generate_stream(request, chunks).await?
          , None => self.adapter.generate(request).await?
        };
        if !result.is_complete
        {   warn!(
              "{} returned a truncated {} response; parsing what arrived",
              result.provider, kind
            );
        }

        let json = ResponseExtractor::extract(&result.response_text)?;
        let intent = SchemaValidator::validate(kind, &json)?;
        Ok(Generated
        {   intent
          , model: result.model_identifier
          , provider: result.provider
          , is_complete: result.is_complete
        })
    }

    async fn run_typed<T: Payload>(&self, user_text: &str) -> Result<T, Error>
    {   let generated = self.run(T::KIND, user_text).await?;
        let found = generated.intent.kind();
        T::take(generated.intent).ok_or_else(|| {
          Error::Schema(SchemaError
          {   path: "$".to_string()
            , expected: T::KIND.to_string()
            , found: found.to_string()
          })
        })
    }
}

/// Payload types with a fixed `ResponseKind`
trait Payload: Sized
{   const KIND: ResponseKind;
    fn take(intent: ComponentIntent) -> Option<Self>;
}

impl Payload for Suggestions
{   const KIND: ResponseKind = ResponseKind::Suggestion;
    fn take(intent: ComponentIntent) -> Option<Self>
    {   match intent
        {   ComponentIntent::Suggestions(p) => Some(p)
          , _ => None
        }
    }
}

impl Payload for UiGeneration
{   const KIND: ResponseKind = ResponseKind::UiGeneration;
    fn take(intent: ComponentIntent) -> Option<Self>
    {   match intent
        {   ComponentIntent::UiGeneration(p) => Some(p)
          , _ => None
        }
    }
}

impl Payload for Theme
{   const KIND: ResponseKind = ResponseKind::Theme;
    fn take(intent: ComponentIntent) -> Option<Self>
    {   match intent
        {   ComponentIntent::Theme(p) => Some(p)
          , _ => None
        }
    }
}

impl Payload for Analysis
{   const KIND: ResponseKind = ResponseKind::Analysis;
    fn take(intent: ComponentIntent) -> Option<Self>
    {   match intent
        {   ComponentIntent::Analysis(p) => Some(p)
          , _ => None
        }
    }
}

impl Payload for Improvement
{   const KIND: ResponseKind = ResponseKind::Improvement;
    fn take(intent: ComponentIntent) -> Option<Self>
    {   match intent
        {   ComponentIntent::Improvement(p) => Some(p)
          , _ => None
        }
    }
}

impl Payload for CodegenIntent
{   const KIND: ResponseKind = ResponseKind::ComponentIntent;
    fn take(intent: ComponentIntent) -> Option<Self>
    {   match intent
        {   ComponentIntent::Codegen(p) => Some(p)
          , _ => None
        }
    }
}
