//! Post-processing: deterministic cleanup of model-generated text before it
//! is split into report blocks.
//!
//! Even well-prompted models produce artefacts that are harmless in a chat
//! window but break paragraph detection:
//!
//! - wrapping the whole answer in a ` ```markdown ... ``` ` fence
//! - Windows-style `\r\n` line endings, so "blank" lines are not blank
//! - whitespace-only lines between paragraphs
//! - a heading immediately followed by body lines with no blank line, which
//!   would turn the whole run into one oversized heading
//! - zero-width spaces and BOMs that the report font cannot draw
//!
//! Each rule is a pure `&str → String` pass; [`clean_model_text`] runs them in
//! order. Line endings are normalised before trimming, and fences stripped
//! before heading isolation so heading detection sees clean input.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw model output.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip an outer markdown fence
/// 3. Trim trailing whitespace per line
/// 4. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 5. Give every markdown heading line its own paragraph
/// 6. Collapse runs of blank lines to a single blank line
/// 7. Trim the result
pub fn clean_model_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_markdown_fences(&s);
    let s = trim_trailing_whitespace(&s);
    let s = remove_invisible_chars(&s);
    let s = isolate_headings(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\n(.*)\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 5: Isolate heading lines ────────────────────────────────────────────

static RE_HEADING_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}(\s|$)").unwrap());

/// Surround each markdown heading line with blank lines.
///
/// Paragraph classification looks only at a paragraph's first characters, so
/// `"### Themes\nBody text"` would otherwise render entirely as a heading.
fn isolate_headings(input: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        if RE_HEADING_LINE.is_match(line.trim_start()) {
            if out.last().is_some_and(|prev| !prev.is_empty()) {
                out.push("");
            }
            out.push(line);
            if lines.peek().is_some_and(|next| !next.is_empty()) {
                out.push("");
            }
        } else {
            out.push(line);
        }
    }

    out.join("\n")
}

// ── Rule 6: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────
