//! CLI binary for edgequake-pdfsynth.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `SynthesisConfig`, writes the report and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfsynth::{
    inspect, run_to_file, ProgressCallback, RunOutput, RunProgressCallback,
    SynthesisConfig, DEFAULT_REPORT_TITLE, REPORT_FILENAME,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over all summaries plus the synthesis
/// step, with a log line per document. Skipped documents are printed as
/// warnings above the bar.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-document wall-clock start times, keyed by 1-based index.
    start_times: Mutex<HashMap<usize, Instant>>,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDFs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            skipped: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, steps: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} steps  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(steps as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Summarising");
        self.bar.reset_eta();
    }

    fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_documents: usize) {
        // One step per document, one for the synthesis.
        self.activate_bar(total_documents + 1);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Synthesising {total_documents} documents…"))
        ));
    }

    fn on_document_skipped(&self, filename: &str, reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {}  {}",
            yellow("⚠"),
            bold(filename),
            yellow(&format!("skipped: {reason}")),
        ));
        self.bar.inc(1);
    }

    fn on_summary_start(&self, index: usize, _total: usize, filename: &str) {
        self.start_times
            .lock()
            .unwrap()
            .insert(index, Instant::now());
        self.bar.set_message(filename.to_string());
    }

    fn on_summary_complete(&self, index: usize, total: usize, filename: &str) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&index)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            filename,
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_synthesis_start(&self, summary_count: usize) {
        self.bar.set_prefix("Synthesising");
        self.bar
            .set_message(format!("comparing {summary_count} summaries"));
    }

    fn on_synthesis_complete(&self, _markdown_len: usize) {
        self.bar.inc(1);
        self.bar.set_prefix("Rendering");
        self.bar.set_message("report");
    }

    fn on_run_complete(&self, summarized: usize, skipped: usize) {
        self.bar.finish_and_clear();
        if skipped == 0 {
            eprintln!(
                "{} {} documents summarised",
                green("✔"),
                bold(&summarized.to_string())
            );
        } else {
            eprintln!(
                "{} {} documents summarised  ({} skipped)",
                cyan("⚠"),
                bold(&summarized.to_string()),
                yellow(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Synthesise two reports into pdf_synthesis_summary.pdf
  pdfsynth q1-review.pdf q2-review.pdf

  # Choose the output file and model
  pdfsynth --model gpt-4o-mini -o board-pack.pdf minutes/*.pdf

  # Mix local files and URLs
  pdfsynth policy.pdf https://example.com/whitepaper.pdf

  # Check what text can be extracted (no API key needed)
  pdfsynth --extract-only scans/*.pdf

  # Machine-readable summaries and synthesis
  pdfsynth --json a.pdf b.pdf > synthesis.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override log filter (e.g. edgequake_pdfsynth=debug)

NOTES:
  Encrypted PDFs and PDFs without a text layer are skipped with a warning.
  The run fails only when no document yields any text.
"#;

/// Summarise PDF documents and synthesise them into one comparative report.
#[derive(Parser, Debug)]
#[command(
    name = "pdfsynth",
    version,
    about = "Summarise PDF documents with an LLM and synthesise them into one PDF report",
    long_about = "Extract the text of each PDF, summarise every document with an LLM, \
then synthesise the summaries into a report of common themes, key differences and \
outliers. Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any \
OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file paths or HTTP/HTTPS URLs, in report order.
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<String>,

    /// Write the PDF report to this file.
    #[arg(short, long, env = "PDFSYNTH_OUTPUT", default_value = REPORT_FILENAME)]
    output: PathBuf,

    /// LLM model ID (e.g. gpt-4o, gpt-4o-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Number of concurrent summarisation calls.
    #[arg(short, long, env = "PDFSYNTH_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Characters of extracted text sent per summary request.
    #[arg(long, env = "PDFSYNTH_MAX_INPUT_CHARS", default_value_t = 12_000)]
    max_input_chars: usize,

    /// Report title.
    #[arg(long, env = "PDFSYNTH_TITLE", default_value = DEFAULT_REPORT_TITLE)]
    title: String,

    /// Also print summaries and synthesis as JSON on stdout.
    #[arg(long, env = "PDFSYNTH_JSON")]
    json: bool,

    /// Only extract text and print word counts; no LLM calls, no report.
    #[arg(long)]
    extract_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFSYNTH_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSYNTH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSYNTH_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFSYNTH_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "PDFSYNTH_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; warnings stay visible.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let docs = inspect(&cli.inputs, cli.download_timeout)
            .await
            .context("Failed to read input PDFs")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&docs).context("Failed to serialize results")?
            );
        } else {
            for doc in &docs {
                match &doc.error {
                    None => println!(
                        "{} {:<40} {:>8} words  {:>9} chars",
                        green("✓"),
                        doc.filename,
                        doc.word_count,
                        doc.char_count
                    ),
                    Some(e) => println!("{} {:<40} {}", red("✗"), doc.filename, red(&e.to_string())),
                }
            }
        }
        return Ok(());
    }

    // ── Build config and initialise the provider once ────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };
    let config = build_config(&cli, progress.clone().map(|cb| cb as ProgressCallback))?;

    // ── Run ──────────────────────────────────────────────────────────────
    let result = run_to_file(&cli.inputs, &cli.output, &config).await;
    if let Some(ref cb) = progress {
        cb.clear();
    }
    let output = result.context("Synthesis failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    }

    if !cli.quiet {
        // The progress callback already printed skip warnings as they happened.
        if !show_progress {
            for skipped in &output.skipped {
                eprintln!("{} {}", yellow("warning:"), skipped);
            }
        }
        print_summary(&output, &cli);
    }

    Ok(())
}

/// Map CLI args to `SynthesisConfig` and resolve the LLM provider.
///
/// A missing credential fails here, before any document is read.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SynthesisConfig> {
    let mut builder = SynthesisConfig::builder()
        .concurrency(cli.concurrency)
        .max_input_chars(cli.max_input_chars)
        .report_title(cli.title.clone())
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder
        .build()
        .context("Invalid configuration")?
        .init()
        .context("LLM provider initialisation failed")
}

fn print_summary(output: &RunOutput, cli: &Cli) {
    let stats = &output.stats;
    eprintln!(
        "{}  {}/{} documents  {}ms  →  {}",
        if stats.skipped_documents == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        stats.summarized_documents,
        stats.total_documents,
        stats.total_duration_ms,
        bold(&cli.output.display().to_string()),
    );
    eprintln!(
        "   {} tokens in  /  {} tokens out  ·  {} report bytes",
        dim(&stats.total_input_tokens.to_string()),
        dim(&stats.total_output_tokens.to_string()),
        output.report.len(),
    );
}
