//! Cross-document synthesis: ordered summaries → one Markdown analysis.

use crate::config::SynthesisConfig;
use crate::error::{Stage, SynthError};
use crate::output::{DocumentSummary, SynthesisResult};
use crate::pipeline::llm::{GenerationRequest, TextGenerator};
use crate::prompts::{synthesis_prompt, SYNTHESIS_SYSTEM_PROMPT};
use std::sync::Arc;
use tracing::debug;

/// Produces the comparative synthesis over all document summaries.
#[derive(Clone)]
pub struct Synthesizer {
    generator: Arc<dyn TextGenerator>,
    max_tokens: usize,
    temperature: f32,
}

impl Synthesizer {
    pub fn from_config(generator: Arc<dyn TextGenerator>, config: &SynthesisConfig) -> Self {
        Self {
            generator,
            max_tokens: config.synthesis_max_tokens,
            temperature: config.synthesis_temperature,
        }
    }

    /// Synthesise `summaries`, numbered 1..n in the order given.
    ///
    /// One generation request is made; the Markdown answer is returned
    /// trimmed and otherwise unmodified.
    ///
    /// # Errors
    /// * [`SynthError::NoInput`] for an empty slice; no request is made
    /// * [`SynthError::Upstream`] with [`Stage::Synthesis`] on service failure
    /// * [`SynthError::EmptySynthesis`] when the model answers with blank text
    pub async fn synthesize(
        &self,
        summaries: &[DocumentSummary],
    ) -> Result<SynthesisResult, SynthError> {
        if summaries.is_empty() {
            return Err(SynthError::NoInput);
        }

        let user_prompt = synthesis_prompt(
            summaries
                .iter()
                .map(|s| (s.filename.as_str(), s.summary.as_str())),
        );
        debug!(
            "Synthesis prompt: {} summaries, {} chars",
            summaries.len(),
            user_prompt.len()
        );

        let request = GenerationRequest {
            system_prompt: SYNTHESIS_SYSTEM_PROMPT,
            user_prompt: &user_prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let generation =
            self.generator
                .generate(request)
                .await
                .map_err(|source| SynthError::Upstream {
                    stage: Stage::Synthesis,
                    filename: None,
                    source,
                })?;

        let markdown = generation.text.trim();
        if markdown.is_empty() {
            return Err(SynthError::EmptySynthesis);
        }

        Ok(SynthesisResult {
            markdown: markdown.to_string(),
            input_tokens: generation.input_tokens,
            output_tokens: generation.output_tokens,
        })
    }
}
