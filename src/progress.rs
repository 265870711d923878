//! Progress-callback trait for per-document and per-stage run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::SynthesisConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through extraction, summarisation, synthesis
//! and rendering.
//!
//! The callback is also where skipped documents become *visible*: every
//! extraction failure is reported through [`RunProgressCallback::on_document_skipped`]
//! before the run continues with the remaining documents.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfsynth::{RunProgressCallback, SynthesisConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     summarized: Arc<AtomicUsize>,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_summary_complete(&self, index: usize, total: usize, filename: &str) {
//!         self.summarized.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{index}/{total}] summarised {filename}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     summarized: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = SynthesisConfig::builder()
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the run pipeline as it processes each document and stage.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` the
/// summary events for different documents may fire from different tasks.
/// All methods default to no-ops.
pub trait RunProgressCallback: Send + Sync {
    /// Called once before extraction starts.
    fn on_run_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a document produced usable text.
    fn on_document_extracted(&self, filename: &str, word_count: usize) {
        let _ = (filename, word_count);
    }

    /// Called when a document is dropped because extraction failed.
    ///
    /// * `reason`: human-readable cause (encrypted, unreadable, no text)
    fn on_document_skipped(&self, filename: &str, reason: &str) {
        let _ = (filename, reason);
    }

    /// Called just before the summarisation request for a document is sent.
    ///
    /// * `index`: 1-based position among accepted documents
    /// * `total`: number of accepted documents
    fn on_summary_start(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called when a document's summary has been received.
    fn on_summary_complete(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called before the synthesis request is sent.
    fn on_synthesis_start(&self, summary_count: usize) {
        let _ = summary_count;
    }

    /// Called when the synthesis text has been received.
    fn on_synthesis_complete(&self, markdown_len: usize) {
        let _ = markdown_len;
    }

    /// Called once the PDF report has been serialised.
    fn on_report_rendered(&self, report_bytes: usize) {
        let _ = report_bytes;
    }

    /// Called once after a successful run.
    fn on_run_complete(&self, summarized: usize, skipped: usize) {
        let _ = (summarized, skipped);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SynthesisConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
