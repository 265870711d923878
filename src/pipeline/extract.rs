//! Text extraction: raw PDF bytes → one normalised line of text.
//!
//! Parsing is done in memory with `lopdf`, so uploads never touch the file
//! system. The encryption check runs before any page is read: an encrypted
//! upload is rejected as a whole rather than yielding partial text.
//!
//! Normalisation mirrors how the text is later consumed by the model: page
//! breaks and layout line breaks carry no meaning, so everything is folded
//! into single-space-separated prose.

use crate::error::ExtractError;
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Extract and normalise the text of a PDF held in memory.
///
/// # Errors
/// * [`ExtractError::Encrypted`]: the document carries an `/Encrypt` dictionary
/// * [`ExtractError::Unreadable`]: the bytes are not a parseable PDF
/// * [`ExtractError::EmptyContent`]: no text survives normalisation
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = load_document(bytes)?;

    if document.is_encrypted() {
        return Err(ExtractError::Encrypted);
    }

    let pages = document.get_pages();
    debug!("PDF loaded: {} pages", pages.len());

    let page_texts: Vec<String> = pages
        .keys()
        .map(|&page_num| match document.extract_text(&[page_num]) {
            Ok(text) => text,
            Err(e) => {
                warn!("Page {}: no extractable text ({})", page_num, e);
                String::new()
            }
        })
        .collect();

    let text = normalize_text(&page_texts.join("\n"));
    if text.is_empty() {
        return Err(ExtractError::EmptyContent);
    }
    Ok(text)
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Fold raw extracted text into single-spaced prose.
///
/// Lines are trimmed, blank lines dropped, the rest joined with one space,
/// and any remaining whitespace run collapsed to a single space.
pub fn normalize_text(raw: &str) -> String {
    let joined = raw
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    RE_WHITESPACE.replace_all(&joined, " ").trim().to_string()
}

fn load_document(bytes: &[u8]) -> Result<Document, ExtractError> {
    match Document::load_mem(bytes) {
        Ok(document) => Ok(document),
        Err(e) => {
            let detail = e.to_string();
            // Some encrypted files fail inside the parser before the trailer
            // can be inspected; classify them by their encryption dictionary.
            if declares_encryption(bytes) {
                return Err(ExtractError::Encrypted);
            }
            Err(ExtractError::Unreadable { detail })
        }
    }
}

fn declares_encryption(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF") && bytes.windows(8).any(|w| w == b"/Encrypt")
}
