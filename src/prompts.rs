//! Prompts for per-document summarisation and cross-document synthesis.
//!
//! Every prompt lives here so wording changes touch exactly one file and
//! tests can inspect the prompts without a live model.

/// Marker appended to text that was cut to the input budget.
pub const TRUNCATION_MARKER: &str = "... [text truncated]";

/// System instruction for summarising a single document.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert document analyzer and summarizer. \
Create clear, comprehensive summaries that capture the essence of a document \
while keeping its important details.";

/// System instruction for synthesising several summaries.
pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You are an expert analyst who specializes in \
synthesizing information from multiple sources. Produce well-structured analyses \
that reveal insights and connections across documents.";

/// Section structure the synthesis must follow.
///
/// Headings are plain text (no emoji) because the report uses the standard
/// PDF Helvetica font, which cannot draw them.
pub const SYNTHESIS_TEMPLATE: &str = r#"### Common Themes
List the major insights or conclusions that appear across multiple documents.

**Theme 1:** Description

**Theme 2:** Description

### Key Differences
Compare how the documents approach the major themes in a table.

| Theme / Topic | Doc 1 Perspective | Doc 2 Perspective |
|---------------|-------------------|-------------------|
| Theme A       | Summary           | Summary           |

### Outlier / Unique Themes
Highlight ideas or approaches that appear in only one or two documents.
- Doc X uniquely emphasizes [idea]

### Individual Document Summaries
#### Doc 1: [Filename]
- **Main Idea:**
- **Key Points:**
- **Tone/Perspective:**"#;

/// Build the user prompt for summarising one document.
///
/// `text` must already be truncated to the input budget.
pub fn summary_prompt(text: &str, filename: Option<&str>) -> String {
    let source = match filename {
        Some(name) if !name.trim().is_empty() => format!(" ({name})"),
        _ => String::new(),
    };
    format!(
        "Please provide a comprehensive summary of the following document{source}.\n\n\
The summary should:\n\
- Capture the main topics and key points\n\
- Be well-structured with clear sections\n\
- Include important details and findings\n\
- Be approximately 200-400 words\n\
- Use clear, professional language\n\n\
Document content:\n{text}"
    )
}

/// Build the user prompt for synthesising numbered document summaries.
///
/// `entries` yields `(filename, summary)` in upload order; numbering starts at 1.
pub fn synthesis_prompt<'a>(entries: impl ExactSizeIterator<Item = (&'a str, &'a str)>) -> String {
    let count = entries.len();
    let mut listing = String::new();
    for (i, (filename, summary)) in entries.enumerate() {
        listing.push_str(&format!(
            "\n\nDocument {}: {}\nSummary: {}",
            i + 1,
            filename,
            summary
        ));
    }

    format!(
        "I have {count} document summaries that I need you to synthesize. \
Follow these formatting instructions exactly.\n\n\
1. Extract the main ideas, themes, and insights from each document.\n\
2. Produce a structured synthesis covering:\n\
   - Common themes across all documents\n\
   - Key differences in perspective, focus, or tone\n\
   - Outlier or unique ideas that appear in only one or a few documents\n\
   - A brief summary of each document individually\n\n\
Format the output in Markdown. Separate every heading and paragraph with a blank line. \
Use concise, professional language.\n\n\
Use this EXACT structure:\n\n{SYNTHESIS_TEMPLATE}\n\n\
Stay neutral, avoid repetition, and be precise. Assume the audience is analytical \
and values clarity over verbosity.\n\n\
Here are the individual document summaries:{listing}"
    )
}
