//! The synthesis report: summaries + synthesis → paginated PDF bytes.
//!
//! Rendering is split in two steps so each can be tested on its own:
//!
//! ```text
//! summaries, synthesis ──▶ build_report_document ──▶ Vec<ReportElement> ──▶ writer ──▶ PDF bytes
//!                          (fixed section order)                         (layout + lopdf)
//! ```
//!
//! [`build_report_document`] decides *what* the report says and in which
//! order; [`writer`] decides *where* it goes on the page. Model-written text
//! passes through [`blocks::parse_blocks`] on the way in.
//!
//! Output is deterministic for identical inputs and `generated_at`: nothing
//! else in the file depends on the clock or on hash ordering.

pub mod blocks;
pub mod metrics;
pub mod writer;

use crate::error::SynthError;
use crate::output::{DocumentSummary, SynthesisResult};
use blocks::{parse_blocks, Block};
use chrono::{DateTime, Local};
use tracing::debug;

/// One element of the report, in reading order.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportElement {
    /// Centered report title.
    Title(String),
    /// Top-level section heading ("Comprehensive Synthesis", …).
    Subtitle(String),
    /// Subsection heading.
    Heading(String),
    Paragraph(String),
    Emphasized(String),
    Table(Vec<Vec<String>>),
    /// Vertical gap in points.
    Spacer(f32),
    /// Horizontal rule between documents.
    Separator,
    PageBreak,
    /// Centered, low-emphasis closing line.
    Footer(String),
}

impl From<Block> for ReportElement {
    fn from(block: Block) -> Self {
        match block {
            Block::Heading(t) => ReportElement::Heading(t),
            Block::Emphasized(t) => ReportElement::Emphasized(t),
            Block::Paragraph(t) => ReportElement::Paragraph(t),
            Block::Table(rows) => ReportElement::Table(rows),
        }
    }
}

/// Lay out the report content in its fixed order.
pub fn build_report_document(
    summaries: &[DocumentSummary],
    synthesis: &SynthesisResult,
    title: &str,
    generated_at: &DateTime<Local>,
) -> Vec<ReportElement> {
    let mut els = Vec::new();

    els.push(ReportElement::Title(title.to_string()));
    els.push(ReportElement::Paragraph(format!(
        "Generated on: {}",
        generated_at.format("%B %d, %Y at %I:%M %p")
    )));
    els.push(ReportElement::Paragraph(format!(
        "Number of documents analyzed: {}",
        summaries.len()
    )));
    els.push(ReportElement::Spacer(20.0));

    els.push(ReportElement::Emphasized("Documents Analyzed:".to_string()));
    for (i, s) in summaries.iter().enumerate() {
        els.push(ReportElement::Paragraph(format!(
            "{}. {} ({} words)",
            i + 1,
            s.filename,
            format_count(s.word_count)
        )));
    }

    els.push(ReportElement::PageBreak);
    els.push(ReportElement::Subtitle("Comprehensive Synthesis".to_string()));
    els.extend(parse_blocks(&synthesis.markdown).into_iter().map(ReportElement::from));

    els.push(ReportElement::PageBreak);
    els.push(ReportElement::Subtitle(
        "Individual Document Summaries".to_string(),
    ));
    for (i, s) in summaries.iter().enumerate() {
        els.push(ReportElement::Heading(format!(
            "Document {}: {}",
            i + 1,
            s.filename
        )));
        els.push(ReportElement::Paragraph(format!(
            "Original word count: {} words",
            format_count(s.word_count)
        )));
        els.extend(parse_blocks(&s.summary).into_iter().map(ReportElement::from));
        if i + 1 < summaries.len() {
            els.push(ReportElement::Separator);
        }
    }

    els.push(ReportElement::PageBreak);
    els.push(ReportElement::Spacer(50.0));
    els.push(ReportElement::Footer("End of Report".to_string()));

    els
}

/// Render the full report to PDF bytes.
///
/// # Errors
/// [`SynthError::Render`] if layout or serialisation fails; no partial
/// output is returned.
pub fn render_report(
    summaries: &[DocumentSummary],
    synthesis: &SynthesisResult,
    title: &str,
    generated_at: &DateTime<Local>,
) -> Result<Vec<u8>, SynthError> {
    let elements = build_report_document(summaries, synthesis, title, generated_at);
    debug!("Report: {} elements", elements.len());
    writer::write_pdf(&elements, title, generated_at)
}

/// Format an integer with comma thousands separators: `1234567` → `"1,234,567"`.
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
