//! Text-generation seam: the one place the pipeline talks to an LLM.
//!
//! Summarisation and synthesis both reduce to "system prompt + user prompt +
//! output budget + temperature → text". [`TextGenerator`] captures exactly
//! that contract so the stages stay independent of any provider SDK and can
//! be exercised with a fake in tests.
//!
//! [`ProviderGenerator`] is the production implementation: it adapts an
//! `edgequake_llm::LLMProvider`, bounds every call with a timeout, and maps
//! any failure to [`UpstreamError`]. There is no retry; a failed call fails
//! the run.
//!
//! [`init_generator`] is the explicit start-up step that builds the client
//! once per process. A missing credential surfaces there as
//! [`SynthError::Configuration`], never in the middle of a run: a run only
//! picks up what start-up resolved, through [`configured_generator`].

use crate::config::{SynthesisConfig, DEFAULT_MODEL};
use crate::error::{SynthError, UpstreamError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One generation request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// Text returned by the model plus the usage it reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Generation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// `generate(system, user, max_tokens, temperature) -> text | error`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation, UpstreamError>;
}

/// [`TextGenerator`] backed by an `edgequake_llm` provider.
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl TextGenerator for ProviderGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation, UpstreamError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(request.system_prompt),
            ChatMessage::user(request.user_prompt),
        ];
        let options = build_options(&request);

        let response = tokio::time::timeout(self.timeout, self.provider.chat(&messages, Some(&options)))
            .await
            .map_err(|_| {
                warn!("LLM call timed out after {}s", self.timeout.as_secs());
                UpstreamError::Timeout {
                    secs: self.timeout.as_secs(),
                }
            })?
            .map_err(|e| UpstreamError::Service(e.to_string()))?;

        debug!(
            "LLM call: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(Generation {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

/// Build `CompletionOptions` from a generation request.
fn build_options(request: &GenerationRequest<'_>) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

/// Build the process-wide text generator from the configuration.
///
/// Resolution order, most specific first:
///
/// 1. **Pre-built generator** (`config.generator`): used as-is.
/// 2. **Pre-built provider** (`config.provider`).
/// 3. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key (`OPENAI_API_KEY`, …) from the environment.
/// 4. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 5. **OpenAI** when `OPENAI_API_KEY` is set.
/// 6. **Full auto-detection** via `ProviderFactory::from_env`.
///
/// # Errors
/// [`SynthError::Configuration`] when no provider can be initialised.
pub fn init_generator(config: &SynthesisConfig) -> Result<Arc<dyn TextGenerator>, SynthError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    let provider = resolve_provider(config)?;
    Ok(Arc::new(ProviderGenerator::new(
        provider,
        Duration::from_secs(config.api_timeout_secs),
    )))
}

/// The generator a run uses: the one resolved at start-up, or a pre-built
/// provider wrapped as-is.
///
/// Never reads the environment.
///
/// # Errors
/// [`SynthError::Configuration`] when neither was set, i.e. start-up
/// ([`SynthesisConfig::init`]) was skipped.
pub fn configured_generator(
    config: &SynthesisConfig,
) -> Result<Arc<dyn TextGenerator>, SynthError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }
    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderGenerator::new(
            Arc::clone(provider),
            Duration::from_secs(config.api_timeout_secs),
        )));
    }
    Err(SynthError::Configuration {
        provider: config
            .provider_name
            .clone()
            .unwrap_or_else(|| "auto".to_string()),
        hint: "No text generator was initialised.\n\
            Call SynthesisConfig::init() once at startup before running."
            .to_string(),
    })
}

fn resolve_provider(config: &SynthesisConfig) -> Result<Arc<dyn LLMProvider>, SynthError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    // Prefer OpenAI when its key is present, even if other provider keys exist.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SynthError::Configuration {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, SynthError> {
    info!("Using LLM provider '{}' with model '{}'", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SynthError::Configuration {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
