//! # edgequake-pdfsynth
//!
//! Summarise a batch of PDF documents with an LLM and produce one PDF report
//! that compares them.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs (bytes, paths or URLs)
//!  │
//!  ├─ 1. Input       read local files / download URLs into memory
//!  ├─ 2. Extract     lopdf text extraction + whitespace normalisation
//!  │                 (unreadable or encrypted files are skipped with a warning)
//!  ├─ 3. Summarize   one bounded LLM call per document, order preserved
//!  ├─ 4. Synthesize  one LLM call over all summaries (themes, differences, outliers)
//!  └─ 5. Report      paginated A4 PDF: index, synthesis, per-document summaries
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfsynth::{run_to_file, SynthesisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     // once, here; runs reuse the client.
//!     let config = SynthesisConfig::default().init()?;
//!     let output = run_to_file(
//!         &["q1-review.pdf", "q2-review.pdf"],
//!         "pdf_synthesis_summary.pdf",
//!         &config,
//!     )
//!     .await?;
//!     for skipped in &output.skipped {
//!         eprintln!("warning: {skipped}");
//!     }
//!     println!("{}", output.synthesis.markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfsynth` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfsynth = { version = "0.1", default-features = false }
//! ```
//!
//! ## Testing without a provider
//!
//! Every model call goes through the [`TextGenerator`] trait. Inject a fake
//! with [`SynthesisConfigBuilder::generator`] to run the whole pipeline
//! offline.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SynthesisConfig, SynthesisConfigBuilder, DEFAULT_MODEL, DEFAULT_REPORT_TITLE};
pub use error::{ExtractError, Stage, SynthError, UpstreamError};
pub use output::{
    DocumentSummary, ExtractedDocument, RunOutput, RunStats, SkippedDocument, SynthesisResult,
    UploadedDocument, REPORT_FILENAME, REPORT_MIME_TYPE,
};
pub use pipeline::extract::extract_text;
pub use pipeline::llm::{
    configured_generator, init_generator, Generation, GenerationRequest, ProviderGenerator,
    TextGenerator,
};
pub use pipeline::summarize::Summarizer;
pub use pipeline::synthesize::Synthesizer;
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use report::blocks::{classify_paragraph, parse_blocks, Block};
pub use report::render_report;
pub use run::{extract_document, inspect, run, run_paths, run_sync, run_to_file, write_report};
