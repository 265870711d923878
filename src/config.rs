//! Configuration types for a synthesis run.
//!
//! All run behaviour is controlled through [`SynthesisConfig`], built via its
//! [`SynthesisConfigBuilder`]. One struct holds every knob so a config can be
//! shared across tasks, logged, and compared between runs.

use crate::error::SynthError;
use crate::pipeline::llm::{init_generator, TextGenerator};
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default report title.
pub const DEFAULT_REPORT_TITLE: &str = "PDF Document Synthesis Report";

/// Configuration for a synthesis run.
///
/// Built via [`SynthesisConfig::builder()`] or using
/// [`SynthesisConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdfsynth::SynthesisConfig;
///
/// let config = SynthesisConfig::builder()
///     .model("gpt-4o-mini")
///     .concurrency(2)
///     .max_input_chars(8_000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SynthesisConfig {
    /// LLM model identifier, e.g. "gpt-4o", "claude-sonnet-4-20250514".
    /// If None, [`DEFAULT_MODEL`] is used with named/OpenAI providers.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Text generator used by runs. Set by [`SynthesisConfig::init`] or
    /// injected directly (custom backends, test doubles); takes precedence
    /// over every provider setting.
    pub generator: Option<Arc<dyn TextGenerator>>,

    /// Maximum tokens the model may generate per document summary. Default: 600.
    ///
    /// 600 tokens comfortably holds the requested 200–400 words.
    pub summary_max_tokens: usize,

    /// Sampling temperature for summaries. Default: 0.3.
    pub summary_temperature: f32,

    /// Maximum tokens the model may generate for the synthesis. Default: 1200.
    pub synthesis_max_tokens: usize,

    /// Sampling temperature for the synthesis. Default: 0.3.
    pub synthesis_temperature: f32,

    /// Characters of extracted text sent per summary request. Default: 12 000.
    ///
    /// Longer texts are cut and suffixed with a truncation marker. 12 000
    /// characters is roughly 3 000 tokens, which bounds the cost of each call
    /// and fits every supported model's context window with room to spare.
    /// Raise it for long-context models when fuller coverage matters.
    pub max_input_chars: usize,

    /// Number of summarisation calls in flight at once. Default: 4.
    ///
    /// Summaries are still returned in upload order. Set to 1 to process
    /// documents strictly one after the other.
    pub concurrency: usize,

    /// Per-LLM-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Title printed at the top of the report.
    pub report_title: String,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            generator: None,
            summary_max_tokens: 600,
            summary_temperature: 0.3,
            synthesis_max_tokens: 1200,
            synthesis_temperature: 0.3,
            max_input_chars: 12_000,
            concurrency: 4,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            report_title: DEFAULT_REPORT_TITLE.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SynthesisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("generator", &self.generator.as_ref().map(|_| "<dyn TextGenerator>"))
            .field("summary_max_tokens", &self.summary_max_tokens)
            .field("summary_temperature", &self.summary_temperature)
            .field("synthesis_max_tokens", &self.synthesis_max_tokens)
            .field("synthesis_temperature", &self.synthesis_temperature)
            .field("max_input_chars", &self.max_input_chars)
            .field("concurrency", &self.concurrency)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("report_title", &self.report_title)
            .finish()
    }
}

impl SynthesisConfig {
    /// Create a new builder for `SynthesisConfig`.
    pub fn builder() -> SynthesisConfigBuilder {
        SynthesisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the text generator once, at startup.
    ///
    /// Reads provider credentials from the environment (unless a generator
    /// or provider was injected) and stores the client in
    /// [`SynthesisConfig::generator`]. Every run made with the returned
    /// config reuses it and never looks at the environment again.
    ///
    /// # Errors
    /// [`SynthError::Configuration`] when no provider can be initialised.
    pub fn init(mut self) -> Result<Self, SynthError> {
        let generator = init_generator(&self)?;
        self.generator = Some(generator);
        Ok(self)
    }
}

/// Builder for [`SynthesisConfig`].
pub struct SynthesisConfigBuilder {
    config: SynthesisConfig,
}

impl fmt::Debug for SynthesisConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl SynthesisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn summary_max_tokens(mut self, n: usize) -> Self {
        self.config.summary_max_tokens = n;
        self
    }

    pub fn summary_temperature(mut self, t: f32) -> Self {
        self.config.summary_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn synthesis_max_tokens(mut self, n: usize) -> Self {
        self.config.synthesis_max_tokens = n;
        self
    }

    pub fn synthesis_temperature(mut self, t: f32) -> Self {
        self.config.synthesis_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn report_title(mut self, title: impl Into<String>) -> Self {
        self.config.report_title = title.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SynthesisConfig, SynthError> {
        let c = &self.config;
        if c.summary_max_tokens == 0 || c.synthesis_max_tokens == 0 {
            return Err(SynthError::InvalidConfig(
                "max tokens must be ≥ 1".into(),
            ));
        }
        if c.max_input_chars == 0 {
            return Err(SynthError::InvalidConfig(
                "max_input_chars must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(SynthError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.report_title.trim().is_empty() {
            return Err(SynthError::InvalidConfig(
                "report title must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
