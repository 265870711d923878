//! Per-document summarisation: normalised text → one model-written summary.
//!
//! The input is cut to a character budget before it is sent, so a single
//! very long document cannot blow the request size. The cut counts Unicode
//! scalar values, never bytes, and is marked so the model knows the text is
//! incomplete.

use crate::config::SynthesisConfig;
use crate::error::{Stage, SynthError};
use crate::pipeline::llm::{Generation, GenerationRequest, TextGenerator};
use crate::prompts::{summary_prompt, SUMMARY_SYSTEM_PROMPT, TRUNCATION_MARKER};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// Summarises one document per call.
#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    max_input_chars: usize,
    max_tokens: usize,
    temperature: f32,
}

impl Summarizer {
    pub fn from_config(generator: Arc<dyn TextGenerator>, config: &SynthesisConfig) -> Self {
        Self {
            generator,
            max_input_chars: config.max_input_chars,
            max_tokens: config.summary_max_tokens,
            temperature: config.summary_temperature,
        }
    }

    /// Summarise `text`, naming `filename` in the prompt and in errors.
    ///
    /// Exactly one generation request is made. The returned text is trimmed
    /// and guaranteed non-empty.
    ///
    /// # Errors
    /// * [`SynthError::Upstream`] with [`Stage::Summarization`] on any
    ///   service failure; not retried
    /// * [`SynthError::EmptySummary`] when the model answers with blank text
    pub async fn summarize(
        &self,
        text: &str,
        filename: Option<&str>,
    ) -> Result<Generation, SynthError> {
        let input = truncate_chars(text, self.max_input_chars);
        if let Cow::Owned(_) = input {
            debug!(
                "Truncated {} to {} characters",
                filename.unwrap_or("document"),
                self.max_input_chars
            );
        }

        let user_prompt = summary_prompt(&input, filename);
        let request = GenerationRequest {
            system_prompt: SUMMARY_SYSTEM_PROMPT,
            user_prompt: &user_prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let generation =
            self.generator
                .generate(request)
                .await
                .map_err(|source| SynthError::Upstream {
                    stage: Stage::Summarization,
                    filename: filename.map(str::to_string),
                    source,
                })?;

        let summary = generation.text.trim();
        if summary.is_empty() {
            return Err(SynthError::EmptySummary {
                filename: filename.unwrap_or("document").to_string(),
            });
        }

        Ok(Generation {
            text: summary.to_string(),
            ..generation
        })
    }
}

/// Cut `text` to at most `max_chars` characters, appending the truncation
/// marker when anything was removed.
pub fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}
