//! Result types produced by a synthesis run.
//!
//! [`DocumentSummary`] and [`SynthesisResult`] are the two values the report
//! is built from. [`RunOutput`] bundles them with the rendered report bytes,
//! the documents that were skipped during extraction, and timing/token stats.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};

/// Fixed filename offered when the report is downloaded or written.
pub const REPORT_FILENAME: &str = "pdf_synthesis_summary.pdf";

/// MIME type of the rendered report.
pub const REPORT_MIME_TYPE: &str = "application/pdf";

/// One uploaded PDF: an opaque display name plus its raw bytes.
///
/// Filenames are not validated for uniqueness or path safety.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Summary of one successfully processed document.
///
/// Only constructed after extraction produced non-empty text *and* the
/// summarisation call succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// 1-based position in acceptance order.
    pub index: usize,
    pub filename: String,
    pub summary: String,
    /// Whitespace-separated word count of the extracted text.
    pub word_count: usize,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl DocumentSummary {
    pub fn new(
        index: usize,
        filename: impl Into<String>,
        summary: impl Into<String>,
        word_count: usize,
    ) -> Self {
        Self {
            index,
            filename: filename.into(),
            summary: summary.into(),
            word_count,
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self
    }
}

/// The cross-document synthesis for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    /// Markdown-like text as returned by the model (trimmed).
    pub markdown: String,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl SynthesisResult {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            input_tokens: 0,
            output_tokens: 0,
        }
    }
}

/// A document dropped during extraction, kept so callers can warn about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub filename: String,
    pub reason: ExtractError,
}

impl std::fmt::Display for SkippedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Skipped '{}': {}", self.filename, self.reason)
    }
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_documents: usize,
    pub summarized_documents: usize,
    pub skipped_documents: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a successful run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub summaries: Vec<DocumentSummary>,
    pub synthesis: SynthesisResult,
    pub skipped: Vec<SkippedDocument>,
    /// Rendered PDF report. Not serialised; write it with
    /// [`crate::run::run_to_file`] or take the bytes directly.
    #[serde(skip)]
    pub report: Vec<u8>,
    pub stats: RunStats,
}

/// Outcome of extracting a single document, as returned by
/// [`crate::run::inspect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub filename: String,
    pub word_count: usize,
    pub char_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExtractError>,
}
