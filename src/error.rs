//! Error types for the edgequake-pdfsynth library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SynthError`]: **Fatal**: the run cannot produce a report (no readable
//!   document, provider not configured, summarisation or synthesis failed,
//!   report could not be written). Returned as `Err(SynthError)` from the
//!   top-level `run*` functions.
//!
//! * [`ExtractError`]: **Non-fatal**: a single uploaded document could not be
//!   turned into text (encrypted, malformed, no text layer). The run skips it,
//!   records a [`crate::output::SkippedDocument`] warning and carries on with
//!   the remaining documents. Only when *every* document fails does the run
//!   abort with [`SynthError::NoReadableDocuments`].
//!
//! Every message names the pipeline [`Stage`] and, where one exists, the
//! offending filename, so callers can print errors verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extraction,
    Summarization,
    Synthesis,
    Rendering,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extraction => "extraction",
            Stage::Summarization => "summarization",
            Stage::Synthesis => "synthesis",
            Stage::Rendering => "rendering",
        };
        f.write_str(name)
    }
}

/// All fatal errors returned by the edgequake-pdfsynth library.
#[derive(Debug, Error)]
pub enum SynthError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The run was started with an empty document list.
    #[error("No documents were supplied")]
    NoDocuments,

    // ── Extraction errors ─────────────────────────────────────────────────
    /// A single document could not be extracted where skipping is not an
    /// option (e.g. [`crate::run::extract_document`]).
    #[error("extraction failed for '{filename}': {source}")]
    Extraction {
        filename: String,
        #[source]
        source: ExtractError,
    },

    /// Every supplied document failed extraction; nothing to summarise.
    #[error("extraction failed: no readable text found in any of the {total} uploaded PDFs.\nFirst error: {first_error}")]
    NoReadableDocuments { total: usize, first_error: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// No provider could be initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    Configuration { provider: String, hint: String },

    /// The text-generation service failed (transport, auth, rate limit,
    /// timeout). Never retried.
    #[error("{stage} failed{}: {source}", filename_suffix(.filename))]
    Upstream {
        stage: Stage,
        filename: Option<String>,
        #[source]
        source: UpstreamError,
    },

    /// The model answered a summarisation request with blank content.
    #[error("summarization failed for '{filename}': the model returned an empty summary")]
    EmptySummary { filename: String },

    /// Synthesis was requested over an empty summary set.
    #[error("synthesis failed: no summaries were provided")]
    NoInput,

    /// The model answered the synthesis request with blank content.
    #[error("synthesis failed: the model returned an empty synthesis")]
    EmptySynthesis,

    // ── Report errors ─────────────────────────────────────────────────────
    /// Layout or serialisation of the PDF report failed.
    #[error("rendering failed: {detail}")]
    Render { detail: String },

    /// Could not create or write the report file.
    #[error("Failed to write report file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SynthError {
    /// The pipeline stage this error belongs to, if it maps onto one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SynthError::Extraction { .. } | SynthError::NoReadableDocuments { .. } => {
                Some(Stage::Extraction)
            }
            SynthError::Upstream { stage, .. } => Some(*stage),
            SynthError::EmptySummary { .. } => Some(Stage::Summarization),
            SynthError::NoInput | SynthError::EmptySynthesis => Some(Stage::Synthesis),
            SynthError::Render { .. } => Some(Stage::Rendering),
            _ => None,
        }
    }
}

fn filename_suffix(filename: &Option<String>) -> String {
    match filename {
        Some(name) => format!(" for '{name}'"),
        None => String::new(),
    }
}

/// A non-fatal extraction failure for one uploaded document.
///
/// Stored inside [`crate::output::SkippedDocument`]; the run continues with
/// the remaining documents.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ExtractError {
    /// The PDF declares an encryption dictionary.
    #[error("PDF is encrypted and cannot be processed")]
    Encrypted,

    /// The bytes could not be parsed as a PDF.
    #[error("PDF could not be parsed: {detail}")]
    Unreadable { detail: String },

    /// Parsing succeeded but no text survived normalisation.
    #[error("No readable text content found in PDF")]
    EmptyContent,
}

/// Failure of a single call to the text-generation service.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// The call did not complete within the configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider returned an error (transport, auth, rate limit, API).
    #[error("{0}")]
    Service(String),
}
