//! End-to-end tests for edgequake-pdfsynth.
//!
//! Every test drives the public entry points (`run`, `run_paths`,
//! `run_to_file`) with PDFs generated in memory and a scripted
//! [`TextGenerator`], then decodes the report that comes out.
//!
//! The single live test at the bottom calls a real provider and is gated
//! behind the `E2E_ENABLED` environment variable:
//!
//!   E2E_ENABLED=1 OPENAI_API_KEY=... cargo test --test e2e -- --nocapture

use async_trait::async_trait;
use edgequake_pdfsynth::prompts::SYNTHESIS_SYSTEM_PROMPT;
use edgequake_pdfsynth::{
    run, run_paths, run_to_file, ExtractError, Generation, GenerationRequest, RunProgressCallback,
    Stage, SynthError, SynthesisConfig, TextGenerator, UploadedDocument, UpstreamError,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Build a one-page PDF showing `text` on a single line.
fn pdf(text: &str) -> Vec<u8> {
    build_pdf(text, false)
}

/// Same as [`pdf`] but with a Standard security handler in the trailer.
fn encrypted_pdf(text: &str) -> Vec<u8> {
    build_pdf(text, true)
}

fn build_pdf(text: &str, encrypt: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 750.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if encrypt {
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "O" => Object::string_literal(vec![0x41u8; 32]),
            "U" => Object::string_literal(vec![0x42u8; 32]),
            "P" => -4,
        });
        doc.trailer.set("Encrypt", encrypt_id);
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Every string shown on every page of a report, flattened in page order.
fn report_strings(report: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(report).expect("report must parse");
    doc.get_pages()
        .values()
        .flat_map(|&page_id| {
            let data = doc.get_page_content(page_id).unwrap();
            Content::decode(&data).unwrap().operations
        })
        .filter(|op| op.operator == "Tj")
        .map(|op| match &op.operands[0] {
            Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
            other => panic!("unexpected operand {other:?}"),
        })
        .collect()
}

fn position(strings: &[String], needle: &str) -> usize {
    strings
        .iter()
        .position(|s| s.contains(needle))
        .unwrap_or_else(|| panic!("{needle:?} not found in report: {strings:#?}"))
}

/// A generator whose answers are chosen by a marker word in the prompt.
///
/// Summary requests are matched against `rules` in order; the synthesis
/// request (recognised by its system prompt) gets `synthesis`.
#[derive(Default)]
struct ScriptedGenerator {
    rules: Vec<Rule>,
    synthesis: Option<Result<String, UpstreamError>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

struct Rule {
    marker: &'static str,
    reply: String,
    delay: Duration,
}

impl ScriptedGenerator {
    fn reply(mut self, marker: &'static str, reply: impl Into<String>) -> Self {
        self.rules.push(Rule {
            marker,
            reply: reply.into(),
            delay: Duration::ZERO,
        });
        self
    }

    fn slow_reply(mut self, marker: &'static str, reply: impl Into<String>, ms: u64) -> Self {
        self.rules.push(Rule {
            marker,
            reply: reply.into(),
            delay: Duration::from_millis(ms),
        });
        self
    }

    fn synthesis(mut self, reply: impl Into<String>) -> Self {
        self.synthesis = Some(Ok(reply.into()));
        self
    }

    fn synthesis_fails(mut self, error: UpstreamError) -> Self {
        self.synthesis = Some(Err(error));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if request.system_prompt == SYNTHESIS_SYSTEM_PROMPT {
            return match &self.synthesis {
                Some(Ok(text)) => Ok(Generation {
                    text: text.clone(),
                    input_tokens: 300,
                    output_tokens: 120,
                }),
                Some(Err(e)) => Err(e.clone()),
                None => Err(UpstreamError::Service("no synthesis scripted".into())),
            };
        }

        let rule = self
            .rules
            .iter()
            .find(|r| request.user_prompt.contains(r.marker))
            .ok_or_else(|| UpstreamError::Service("no reply scripted".into()))?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(rule.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(Generation {
            text: rule.reply.clone(),
            input_tokens: 100,
            output_tokens: 40,
        })
    }
}

/// Records callback events as short strings.
#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl RecordingCallback {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl RunProgressCallback for RecordingCallback {
    fn on_run_start(&self, total_documents: usize) {
        self.push(format!("start:{total_documents}"));
    }
    fn on_document_extracted(&self, filename: &str, word_count: usize) {
        self.push(format!("extracted:{filename}:{word_count}"));
    }
    fn on_document_skipped(&self, filename: &str, reason: &str) {
        self.push(format!("skipped:{filename}:{reason}"));
    }
    fn on_synthesis_start(&self, summary_count: usize) {
        self.push(format!("synthesis:{summary_count}"));
    }
    fn on_run_complete(&self, summarized: usize, skipped: usize) {
        self.push(format!("complete:{summarized}:{skipped}"));
    }
}

fn config_with(generator: Arc<ScriptedGenerator>) -> SynthesisConfig {
    SynthesisConfig::builder()
        .generator(generator)
        .build()
        .unwrap()
}

const SYNTHESIS: &str = "### Common Themes\n\n\
Both documents track revenue.\n\n\
### Key Differences\n\n\
**Tone**\n\n\
Alpha is upbeat while beta is cautious.";

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_documents_produce_a_report_naming_both() {
    let generator = Arc::new(
        ScriptedGenerator::default()
            .reply("ALPHA", "Alpha reports strong growth.")
            .reply("BETA", "## Outlook\n\nBeta expects a slower year.")
            .synthesis(SYNTHESIS),
    );
    let documents = vec![
        UploadedDocument::new("alpha.pdf", pdf("ALPHA quarterly revenue grew strongly")),
        UploadedDocument::new("beta.pdf", pdf("BETA outlook is cautious for next year")),
    ];

    let output = run(documents, &config_with(Arc::clone(&generator)))
        .await
        .unwrap();

    assert_eq!(output.summaries.len(), 2);
    assert!(output.skipped.is_empty());
    assert_eq!(output.summaries[0].index, 1);
    assert_eq!(output.summaries[0].filename, "alpha.pdf");
    assert_eq!(output.summaries[0].word_count, 5);
    assert_eq!(output.summaries[0].summary, "Alpha reports strong growth.");
    assert_eq!(output.summaries[1].index, 2);
    assert_eq!(output.summaries[1].filename, "beta.pdf");
    assert_eq!(output.summaries[1].word_count, 7);
    assert_eq!(output.synthesis.markdown, SYNTHESIS);
    assert_eq!(generator.calls(), 3);

    assert_eq!(output.stats.total_documents, 2);
    assert_eq!(output.stats.summarized_documents, 2);
    assert_eq!(output.stats.skipped_documents, 0);
    assert_eq!(output.stats.total_input_tokens, 500);
    assert_eq!(output.stats.total_output_tokens, 200);

    let strings = report_strings(&output.report);
    assert_eq!(strings[0], "PDF Document Synthesis Report");
    assert!(strings.contains(&"Number of documents analyzed: 2".to_string()));
    assert!(strings.contains(&"1. alpha.pdf (5 words)".to_string()));
    assert!(strings.contains(&"2. beta.pdf (7 words)".to_string()));

    // Index, synthesis, individual summaries, footer.
    let synthesis = position(&strings, "Comprehensive Synthesis");
    let themes = position(&strings, "Common Themes");
    let individual = position(&strings, "Individual Document Summaries");
    let first = position(&strings, "Document 1: alpha.pdf");
    let second = position(&strings, "Document 2: beta.pdf");
    let footer = position(&strings, "End of Report");
    assert!(synthesis < themes && themes < individual);
    assert!(individual < first && first < second && second < footer);

    // Markdown markers never reach the page.
    assert!(strings.contains(&"Tone".to_string()));
    assert!(strings.contains(&"Outlook".to_string()));
    assert!(strings.iter().all(|s| !s.contains("##") && !s.contains("**")));
    assert!(strings.contains(&"Original word count: 7 words".to_string()));
    assert!(strings.contains(&"Beta expects a slower year.".to_string()));
}

#[tokio::test]
async fn custom_title_heads_the_report() {
    let generator = Arc::new(
        ScriptedGenerator::default()
            .reply("ALPHA", "Alpha summary.")
            .synthesis("One theme."),
    );
    let config = SynthesisConfig::builder()
        .generator(generator)
        .report_title("Board Pack Review")
        .build()
        .unwrap();

    let output = run(
        vec![UploadedDocument::new("alpha.pdf", pdf("ALPHA text"))],
        &config,
    )
    .await
    .unwrap();

    let strings = report_strings(&output.report);
    assert_eq!(strings[0], "Board Pack Review");
    assert!(strings.contains(&"Number of documents analyzed: 1".to_string()));
}

// ── Skipping unreadable documents ────────────────────────────────────────────

#[tokio::test]
async fn encrypted_document_is_skipped_with_a_warning() {
    let generator = Arc::new(
        ScriptedGenerator::default()
            .reply("ALPHA", "Alpha summary.")
            .synthesis(SYNTHESIS),
    );
    let callback = Arc::new(RecordingCallback::default());
    let config = SynthesisConfig::builder()
        .generator(Arc::clone(&generator) as Arc<dyn TextGenerator>)
        .progress_callback(Arc::clone(&callback) as Arc<dyn RunProgressCallback>)
        .build()
        .unwrap();

    let documents = vec![
        UploadedDocument::new("locked.pdf", encrypted_pdf("SECRET payroll figures")),
        UploadedDocument::new("alpha.pdf", pdf("ALPHA quarterly revenue grew strongly")),
    ];
    let output = run(documents, &config).await.unwrap();

    assert_eq!(output.summaries.len(), 1);
    assert_eq!(output.summaries[0].index, 1);
    assert_eq!(output.summaries[0].filename, "alpha.pdf");

    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.skipped[0].filename, "locked.pdf");
    assert_eq!(output.skipped[0].reason, ExtractError::Encrypted);
    assert!(output.skipped[0].to_string().contains("locked.pdf"));
    assert_eq!(output.stats.skipped_documents, 1);

    // One summary call and one synthesis call; nothing for the locked file.
    assert_eq!(generator.calls(), 2);

    let events = callback.events();
    assert_eq!(events.first().map(String::as_str), Some("start:2"));
    assert!(events
        .iter()
        .any(|e| e.starts_with("skipped:locked.pdf:") && e.contains("encrypted")));
    assert!(events.contains(&"extracted:alpha.pdf:5".to_string()));
    assert!(events.contains(&"synthesis:1".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("complete:1:1"));

    let strings = report_strings(&output.report);
    assert!(strings.contains(&"Number of documents analyzed: 1".to_string()));
    assert!(strings.iter().all(|s| !s.contains("locked.pdf")));
}

#[tokio::test]
async fn run_fails_when_no_document_is_readable() {
    let generator = Arc::new(ScriptedGenerator::default().synthesis(SYNTHESIS));
    let documents = vec![
        UploadedDocument::new("locked.pdf", encrypted_pdf("SECRET")),
        UploadedDocument::new("junk.pdf", b"not a pdf at all".to_vec()),
    ];

    let err = run(documents, &config_with(Arc::clone(&generator)))
        .await
        .unwrap_err();

    match &err {
        SynthError::NoReadableDocuments { total, first_error } => {
            assert_eq!(*total, 2);
            assert!(first_error.contains("locked.pdf"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.stage(), Some(Stage::Extraction));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn blank_pages_are_skipped_as_empty_content() {
    let generator = Arc::new(
        ScriptedGenerator::default()
            .reply("ALPHA", "Alpha summary.")
            .synthesis(SYNTHESIS),
    );
    let documents = vec![
        UploadedDocument::new("alpha.pdf", pdf("ALPHA text here")),
        UploadedDocument::new("blank.pdf", pdf("   ")),
    ];

    let output = run(documents, &config_with(generator)).await.unwrap();
    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.skipped[0].filename, "blank.pdf");
    assert_eq!(output.skipped[0].reason, ExtractError::EmptyContent);
}

// ── Model failures ───────────────────────────────────────────────────────────

#[tokio::test]
async fn synthesis_failure_fails_the_run_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = dir.path().join("alpha.pdf");
    let beta = dir.path().join("beta.pdf");
    std::fs::write(&alpha, pdf("ALPHA revenue grew")).unwrap();
    std::fs::write(&beta, pdf("BETA costs fell")).unwrap();
    let report_path = dir.path().join("out").join("report.pdf");

    let generator = Arc::new(
        ScriptedGenerator::default()
            .reply("ALPHA", "Alpha summary.")
            .reply("BETA", "Beta summary.")
            .synthesis_fails(UpstreamError::Service("connection reset by peer".into())),
    );
    let inputs = [alpha.to_str().unwrap(), beta.to_str().unwrap()];

    let err = run_to_file(&inputs, &report_path, &config_with(generator))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Synthesis));
    let message = err.to_string();
    assert!(message.contains("synthesis"), "got: {message}");
    assert!(message.contains("connection reset by peer"), "got: {message}");
    assert!(!report_path.exists());
}

#[tokio::test]
async fn synthesis_timeout_is_reported_as_such() {
    let generator = Arc::new(
        ScriptedGenerator::default()
            .reply("ALPHA", "Alpha summary.")
            .synthesis_fails(UpstreamError::Timeout { secs: 120 }),
    );
    let err = run(
        vec![UploadedDocument::new("alpha.pdf", pdf("ALPHA text"))],
        &config_with(generator),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SynthError::Upstream {
            stage: Stage::Synthesis,
            source: UpstreamError::Timeout { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn summary_failure_names_the_document() {
    // No rule matches BETA, so its summary call fails.
    let generator = Arc::new(
        ScriptedGenerator::default()
            .reply("ALPHA", "Alpha summary.")
            .synthesis(SYNTHESIS),
    );
    let documents = vec![
        UploadedDocument::new("alpha.pdf", pdf("ALPHA text")),
        UploadedDocument::new("beta.pdf", pdf("BETA text")),
    ];

    let err = run(documents, &config_with(generator)).await.unwrap_err();
    match err {
        SynthError::Upstream {
            stage, filename, ..
        } => {
            assert_eq!(stage, Stage::Summarization);
            assert_eq!(filename.as_deref(), Some("beta.pdf"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn blank_summary_fails_the_run() {
    let generator = Arc::new(
        ScriptedGenerator::default()
            .reply("ALPHA", "  \n\n ")
            .synthesis(SYNTHESIS),
    );
    let err = run(
        vec![UploadedDocument::new("alpha.pdf", pdf("ALPHA text"))],
        &config_with(generator),
    )
    .await
    .unwrap_err();

    match err {
        SynthError::EmptySummary { filename } => assert_eq!(filename, "alpha.pdf"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn blank_synthesis_fails_the_run() {
    let generator = Arc::new(
        ScriptedGenerator::default()
            .reply("ALPHA", "Alpha summary.")
            .synthesis("\n  \n"),
    );
    let err = run(
        vec![UploadedDocument::new("alpha.pdf", pdf("ALPHA text"))],
        &config_with(generator),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SynthError::EmptySynthesis));
}

// ── Ordering and concurrency ─────────────────────────────────────────────────

#[tokio::test]
async fn summaries_keep_upload_order_under_concurrency() {
    // The first document is the slowest, so completion order is reversed.
    let generator = Arc::new(
        ScriptedGenerator::default()
            .slow_reply("FIRST", "First summary.", 150)
            .slow_reply("SECOND", "Second summary.", 75)
            .slow_reply("THIRD", "Third summary.", 10)
            .synthesis(SYNTHESIS),
    );
    let config = SynthesisConfig::builder()
        .generator(Arc::clone(&generator) as Arc<dyn TextGenerator>)
        .concurrency(3)
        .build()
        .unwrap();
    let documents = vec![
        UploadedDocument::new("one.pdf", pdf("FIRST document")),
        UploadedDocument::new("two.pdf", pdf("SECOND document")),
        UploadedDocument::new("three.pdf", pdf("THIRD document")),
    ];

    let output = run(documents, &config).await.unwrap();

    let names: Vec<_> = output.summaries.iter().map(|s| s.filename.as_str()).collect();
    assert_eq!(names, ["one.pdf", "two.pdf", "three.pdf"]);
    let indices: Vec<_> = output.summaries.iter().map(|s| s.index).collect();
    assert_eq!(indices, [1, 2, 3]);
    assert_eq!(output.summaries[0].summary, "First summary.");
    assert!(generator.peak_in_flight.load(Ordering::SeqCst) > 1);

    let strings = report_strings(&output.report);
    let one = position(&strings, "Document 1: one.pdf");
    let three = position(&strings, "Document 3: three.pdf");
    assert!(one < three);
}

#[tokio::test]
async fn concurrency_one_runs_summaries_sequentially() {
    let generator = Arc::new(
        ScriptedGenerator::default()
            .slow_reply("FIRST", "First.", 20)
            .slow_reply("SECOND", "Second.", 20)
            .synthesis(SYNTHESIS),
    );
    let config = SynthesisConfig::builder()
        .generator(Arc::clone(&generator) as Arc<dyn TextGenerator>)
        .concurrency(1)
        .build()
        .unwrap();
    let documents = vec![
        UploadedDocument::new("one.pdf", pdf("FIRST")),
        UploadedDocument::new("two.pdf", pdf("SECOND")),
    ];

    run(documents, &config).await.unwrap();
    assert_eq!(generator.peak_in_flight.load(Ordering::SeqCst), 1);
}

// ── Path inputs and report files ─────────────────────────────────────────────

#[tokio::test]
async fn run_to_file_writes_a_parseable_report() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = dir.path().join("alpha.pdf");
    std::fs::write(&alpha, pdf("ALPHA revenue grew")).unwrap();
    let report_path = dir.path().join("pdf_synthesis_summary.pdf");

    let generator = Arc::new(
        ScriptedGenerator::default()
            .reply("ALPHA", "Alpha summary.")
            .synthesis(SYNTHESIS),
    );
    let output = run_to_file(&[alpha.to_str().unwrap()], &report_path, &config_with(generator))
        .await
        .unwrap();

    let written = std::fs::read(&report_path).unwrap();
    assert!(written.starts_with(b"%PDF-"));
    assert_eq!(written, output.report);

    let strings = report_strings(&written);
    assert!(strings.contains(&"1. alpha.pdf (3 words)".to_string()));
}

#[tokio::test]
async fn missing_input_fails_before_any_model_call() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.pdf");
    let generator = Arc::new(ScriptedGenerator::default().synthesis(SYNTHESIS));

    let err = run_paths(&[missing.to_str().unwrap()], &config_with(Arc::clone(&generator)))
        .await
        .unwrap_err();

    assert!(matches!(err, SynthError::FileNotFound { .. }));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn empty_input_list_is_rejected() {
    let generator = Arc::new(ScriptedGenerator::default());
    let inputs: [&str; 0] = [];
    let err = run_paths(&inputs, &config_with(generator)).await.unwrap_err();
    assert!(matches!(err, SynthError::NoDocuments));
}

// ── Live provider ────────────────────────────────────────────────────────────

#[tokio::test]
async fn live_provider_synthesises_two_documents() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }

    let documents = vec![
        UploadedDocument::new(
            "remote-work.pdf",
            pdf("Remote work improves focus and reduces commuting time for most employees"),
        ),
        UploadedDocument::new(
            "office-work.pdf",
            pdf("Office work builds team culture and makes mentoring junior staff easier"),
        ),
    ];
    let config = SynthesisConfig::builder()
        .model(std::env::var("EDGEQUAKE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()))
        .concurrency(2)
        .build()
        .and_then(SynthesisConfig::init)
        .unwrap();

    let output = run(documents, &config).await.unwrap();

    println!("{}", output.synthesis.markdown);
    assert_eq!(output.summaries.len(), 2);
    assert!(!output.synthesis.markdown.trim().is_empty());
    let strings = report_strings(&output.report);
    assert!(strings.contains(&"Document 1: remote-work.pdf".to_string()));
    assert!(strings.contains(&"Document 2: office-work.pdf".to_string()));
}
