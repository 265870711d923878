//! Classification of model-written text into report blocks.
//!
//! Model output is only loosely Markdown. Rather than a full Markdown parser,
//! each blank-line-separated paragraph is classified by its first and last
//! characters, checked in order:
//!
//! 1. starts with `##` → [`Block::Heading`]
//! 2. starts with `#`  → [`Block::Heading`] (same weight as case 1)
//! 3. starts and ends with `**` → [`Block::Emphasized`]
//! 4. every line is a `|`-delimited row → [`Block::Table`]
//! 5. anything else → [`Block::Paragraph`], verbatim
//!
//! Paragraphs that are empty once their markers are stripped produce no block.

use crate::pipeline::postprocess::clean_model_text;
use once_cell::sync::Lazy;
use regex::Regex;

/// One classified unit of rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Emphasized(String),
    Paragraph(String),
    /// Rows of cells; the first row is the header. Every row has the same
    /// number of cells.
    Table(Vec<Vec<String>>),
}

/// Clean `text` and split it into classified blocks, in order.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    clean_model_text(text)
        .split("\n\n")
        .filter_map(classify_paragraph)
        .collect()
}

/// Classify one paragraph. Returns `None` when nothing printable remains.
pub fn classify_paragraph(paragraph: &str) -> Option<Block> {
    let p = paragraph.trim();
    if p.is_empty() {
        return None;
    }

    let block = if p.starts_with("##") || p.starts_with('#') {
        Block::Heading(p.trim_start_matches('#').trim().to_string())
    } else if p.starts_with("**") && p.ends_with("**") {
        Block::Emphasized(p.replace("**", "").trim().to_string())
    } else if let Some(rows) = parse_table(p) {
        Block::Table(rows)
    } else {
        Block::Paragraph(p.to_string())
    };

    let empty = matches!(&block, Block::Heading(t) | Block::Emphasized(t) if t.is_empty());
    (!empty).then_some(block)
}

static RE_SEPARATOR_CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:?-{1,}:?$").unwrap());

/// Parse a paragraph made only of `| a | b |` rows.
///
/// Alignment rows (`|---|:--:|`) are dropped. Short rows are padded with
/// empty cells so the result is rectangular. A lone `|` line without an
/// alignment row is not a table.
fn parse_table(paragraph: &str) -> Option<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut aligned = false;

    for line in paragraph.lines() {
        let line = line.trim();
        if !line.starts_with('|') {
            return None;
        }
        let inner = line.trim_start_matches('|');
        let inner = inner.strip_suffix('|').unwrap_or(inner);
        let cells: Vec<String> = inner.split('|').map(|c| c.trim().to_string()).collect();

        let is_separator = cells
            .iter()
            .all(|c| RE_SEPARATOR_CELL.is_match(c) || c.is_empty())
            && cells.iter().any(|c| !c.is_empty());
        if is_separator {
            aligned = true;
        } else {
            rows.push(cells);
        }
    }

    if rows.is_empty() || (rows.len() < 2 && !aligned) {
        return None;
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(columns, String::new());
    }
    Some(rows)
}
