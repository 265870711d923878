//! Run entry points: uploaded PDFs in, summaries + synthesis + report out.
//!
//! Stages run strictly in order. Every document is extracted before any
//! summary is requested, every summary is back before the synthesis call,
//! and the report is rendered last. Within the summarisation stage up to
//! `config.concurrency` calls are in flight, but results keep upload order.
//!
//! Failure policy:
//!
//! * a document that cannot be extracted is **skipped** with a warning
//! * if every document is skipped the run fails with
//!   [`SynthError::NoReadableDocuments`]
//! * any summarisation, synthesis or rendering failure ends the run; nothing
//!   is retried and no partial report is produced

use crate::config::SynthesisConfig;
use crate::error::SynthError;
use crate::output::{
    DocumentSummary, ExtractedDocument, RunOutput, RunStats, SkippedDocument, UploadedDocument,
};
use crate::pipeline::extract::{extract_text, word_count};
use crate::pipeline::summarize::Summarizer;
use crate::pipeline::synthesize::Synthesizer;
use crate::pipeline::{input, llm, render};
use crate::progress::ProgressCallback;
use chrono::Local;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A document whose text was extracted and is waiting to be summarised.
struct AcceptedDocument {
    filename: String,
    text: String,
    word_count: usize,
}

/// Run the full pipeline over uploaded documents.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(RunOutput)` when a report was produced, even if some documents were
/// skipped (check `output.skipped`).
///
/// # Errors
/// * [`SynthError::NoDocuments`] for an empty upload list
/// * [`SynthError::Configuration`] when `config` was never initialised
///   (see [`SynthesisConfig::init`]); the environment is not consulted here
/// * [`SynthError::NoReadableDocuments`] when every document was skipped
/// * [`SynthError::Upstream`], [`SynthError::EmptySummary`],
///   [`SynthError::EmptySynthesis`] from the model calls
/// * [`SynthError::Render`] when the report cannot be produced
pub async fn run(
    documents: Vec<UploadedDocument>,
    config: &SynthesisConfig,
) -> Result<RunOutput, SynthError> {
    let total_start = Instant::now();
    if documents.is_empty() {
        return Err(SynthError::NoDocuments);
    }
    let total_documents = documents.len();
    info!("Starting synthesis run: {} documents", total_documents);

    // ── Step 1: Text generator (resolved at startup) ─────────────────────
    let generator = llm::configured_generator(config)?;
    let callback = config.progress_callback.clone();

    if let Some(ref cb) = callback {
        cb.on_run_start(total_documents);
    }

    // ── Step 2: Extract every document ───────────────────────────────────
    let extract_start = Instant::now();
    let (accepted, skipped) = extract_all(documents, callback.as_ref()).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!(
        "Extracted {}/{} documents in {}ms",
        accepted.len(),
        total_documents,
        extract_duration_ms
    );

    if accepted.is_empty() {
        let first_error = skipped
            .first()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(SynthError::NoReadableDocuments {
            total: total_documents,
            first_error,
        });
    }

    // ── Step 3: Summarise ────────────────────────────────────────────────
    let llm_start = Instant::now();
    let summarizer = Summarizer::from_config(Arc::clone(&generator), config);
    let summaries = summarize_all(&summarizer, accepted, config).await?;

    // ── Step 4: Synthesise ───────────────────────────────────────────────
    if let Some(ref cb) = callback {
        cb.on_synthesis_start(summaries.len());
    }
    let synthesis = Synthesizer::from_config(generator, config)
        .synthesize(&summaries)
        .await?;
    if let Some(ref cb) = callback {
        cb.on_synthesis_complete(synthesis.markdown.len());
    }
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 5: Render the report ────────────────────────────────────────
    let render_start = Instant::now();
    let report =
        render::render_report(&summaries, &synthesis, &config.report_title, Local::now()).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    if let Some(ref cb) = callback {
        cb.on_report_rendered(report.len());
    }

    // ── Step 6: Stats ────────────────────────────────────────────────────
    let stats = RunStats {
        total_documents,
        summarized_documents: summaries.len(),
        skipped_documents: skipped.len(),
        total_input_tokens: summaries.iter().map(|s| s.input_tokens).sum::<u64>()
            + synthesis.input_tokens,
        total_output_tokens: summaries.iter().map(|s| s.output_tokens).sum::<u64>()
            + synthesis.output_tokens,
        extract_duration_ms,
        llm_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Run complete: {} summarised, {} skipped, {}ms total",
        stats.summarized_documents, stats.skipped_documents, stats.total_duration_ms
    );
    if let Some(ref cb) = callback {
        cb.on_run_complete(stats.summarized_documents, stats.skipped_documents);
    }

    Ok(RunOutput {
        summaries,
        synthesis,
        skipped,
        report,
        stats,
    })
}

/// Resolve local paths and HTTP(S) URLs, then [`run`] over them.
pub async fn run_paths(
    inputs: &[impl AsRef<str>],
    config: &SynthesisConfig,
) -> Result<RunOutput, SynthError> {
    let documents = resolve_all(inputs, config.download_timeout_secs).await?;
    run(documents, config).await
}

/// Run over paths/URLs and write the report to `output_path`.
///
/// Uses atomic write (temp file in the target directory + rename) so a
/// failed run never leaves a partial report behind.
pub async fn run_to_file(
    inputs: &[impl AsRef<str>],
    output_path: impl AsRef<Path>,
    config: &SynthesisConfig,
) -> Result<RunOutput, SynthError> {
    let output = run_paths(inputs, config).await?;
    write_report(output_path.as_ref(), &output.report).await?;
    Ok(output)
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(
    documents: Vec<UploadedDocument>,
    config: &SynthesisConfig,
) -> Result<RunOutput, SynthError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SynthError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(documents, config))
}

/// Extract every input without calling the model.
///
/// Does not require an LLM provider or API key. Per-document extraction
/// failures are reported in [`ExtractedDocument::error`] instead of failing.
pub async fn inspect(
    inputs: &[impl AsRef<str>],
    download_timeout_secs: u64,
) -> Result<Vec<ExtractedDocument>, SynthError> {
    let documents = resolve_all(inputs, download_timeout_secs).await?;
    let mut results = Vec::with_capacity(documents.len());

    for document in documents {
        let filename = document.filename.clone();
        let entry = match extract_document(document).await {
            Ok(text) => ExtractedDocument {
                filename,
                word_count: word_count(&text),
                char_count: text.chars().count(),
                error: None,
            },
            Err(SynthError::Extraction { source, .. }) => ExtractedDocument {
                filename,
                word_count: 0,
                char_count: 0,
                error: Some(source),
            },
            Err(e) => return Err(e),
        };
        results.push(entry);
    }

    Ok(results)
}

/// Extract one document's normalised text on a blocking thread.
///
/// # Errors
/// [`SynthError::Extraction`] naming the document when it cannot be read.
pub async fn extract_document(document: UploadedDocument) -> Result<String, SynthError> {
    let UploadedDocument { filename, bytes } = document;
    let result = tokio::task::spawn_blocking(move || extract_text(&bytes))
        .await
        .map_err(|e| SynthError::Internal(format!("Extraction task panicked: {}", e)))?;

    result.map_err(|source| SynthError::Extraction { filename, source })
}

/// Write report bytes to `path` atomically.
pub async fn write_report(path: &Path, bytes: &[u8]) -> Result<(), SynthError> {
    let path = path.to_path_buf();
    let bytes = bytes.to_vec();
    tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
        .await
        .map_err(|e| SynthError::Internal(format!("Write task panicked: {}", e)))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn resolve_all(
    inputs: &[impl AsRef<str>],
    timeout_secs: u64,
) -> Result<Vec<UploadedDocument>, SynthError> {
    let mut documents = Vec::with_capacity(inputs.len());
    for raw in inputs {
        documents.push(input::resolve_input(raw.as_ref(), timeout_secs).await?);
    }
    Ok(documents)
}

/// Extract all documents, splitting them into accepted and skipped.
///
/// Upload bytes are moved into the extraction tasks and dropped there.
async fn extract_all(
    documents: Vec<UploadedDocument>,
    callback: Option<&ProgressCallback>,
) -> Result<(Vec<AcceptedDocument>, Vec<SkippedDocument>), SynthError> {
    let filenames: Vec<String> = documents.iter().map(|d| d.filename.clone()).collect();
    let results = futures::future::join_all(documents.into_iter().map(extract_document)).await;

    let mut accepted = Vec::new();
    let mut skipped = Vec::new();

    for (filename, result) in filenames.into_iter().zip(results) {
        match result {
            Ok(text) => {
                let word_count = word_count(&text);
                debug!("Extracted '{}': {} words", filename, word_count);
                if let Some(cb) = callback {
                    cb.on_document_extracted(&filename, word_count);
                }
                accepted.push(AcceptedDocument {
                    filename,
                    text,
                    word_count,
                });
            }
            Err(SynthError::Extraction { source, .. }) => {
                warn!("Skipping '{}': {}", filename, source);
                if let Some(cb) = callback {
                    cb.on_document_skipped(&filename, &source.to_string());
                }
                skipped.push(SkippedDocument {
                    filename,
                    reason: source,
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok((accepted, skipped))
}

/// Summarise accepted documents, at most `config.concurrency` at a time.
///
/// `buffered` (not `buffer_unordered`) keeps results in upload order; the
/// first error stops the stream and drops the calls still in flight.
async fn summarize_all(
    summarizer: &Summarizer,
    documents: Vec<AcceptedDocument>,
    config: &SynthesisConfig,
) -> Result<Vec<DocumentSummary>, SynthError> {
    let total = documents.len();

    stream::iter(documents.into_iter().enumerate().map(|(i, doc)| {
        let summarizer = summarizer.clone();
        let callback = config.progress_callback.clone();
        async move {
            let index = i + 1;
            if let Some(ref cb) = callback {
                cb.on_summary_start(index, total, &doc.filename);
            }
            let generation = summarizer.summarize(&doc.text, Some(&doc.filename)).await?;
            if let Some(ref cb) = callback {
                cb.on_summary_complete(index, total, &doc.filename);
            }
            Ok::<_, SynthError>(
                DocumentSummary::new(index, doc.filename, generation.text, doc.word_count)
                    .with_usage(generation.input_tokens, generation.output_tokens),
            )
        }
    }))
    .buffered(config.concurrency.max(1))
    .try_collect()
    .await
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SynthError> {
    let fail = |source: std::io::Error| SynthError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(fail)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}
