//! Report rendering stage: run the PDF layout off the async executor.
//!
//! Layout and serialisation are pure CPU work over the whole report, so they
//! run inside `tokio::task::spawn_blocking` like extraction does. The inputs
//! are cloned into the task because blocking tasks must own their data.

use crate::error::SynthError;
use crate::output::{DocumentSummary, SynthesisResult};
use crate::report;
use chrono::{DateTime, Local};
use std::time::Instant;
use tracing::info;

/// Render the report on a blocking thread.
pub async fn render_report(
    summaries: &[DocumentSummary],
    synthesis: &SynthesisResult,
    title: &str,
    generated_at: DateTime<Local>,
) -> Result<Vec<u8>, SynthError> {
    let summaries = summaries.to_vec();
    let synthesis = synthesis.clone();
    let title = title.to_string();
    let start = Instant::now();

    let bytes = tokio::task::spawn_blocking(move || {
        report::render_report(&summaries, &synthesis, &title, &generated_at)
    })
    .await
    .map_err(|e| SynthError::Internal(format!("Render task panicked: {}", e)))??;

    info!(
        "Rendered report: {} bytes in {}ms",
        bytes.len(),
        start.elapsed().as_millis()
    );
    Ok(bytes)
}
