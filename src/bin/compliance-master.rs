//! CLI binary for compliance-master.
//!
//! A thin shim over the library crate: `serve` runs the HTTP API, the other
//! subcommands run one pipeline operation locally and print the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use compliance_master::pipeline::input::resolve_input;
use compliance_master::server::{self, DEFAULT_MAX_UPLOAD_BYTES};
use compliance_master::{
    ComplianceService, DocumentInput, DocumentParser, NativeParser, PipelineConfig,
    PipelineProgressCallback, PipelineStep, ProgressCallback, RuleCatalog, RunOptions, Severity,
    DEFAULT_DOCUMENT_TYPE, DEFAULT_ISO_STANDARD,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar over the pipeline steps, one log line per step.
struct CliProgressCallback {
    bar: ProgressBar,
    started: std::sync::Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:30.green/238}] {pos}/{len}  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Pipeline");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: std::sync::Mutex::new(None),
        })
    }

    fn step_elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_pipeline_start(&self, total_steps: usize) {
        self.bar.set_length(total_steps as u64);
    }

    fn on_step_start(&self, step: PipelineStep) {
        if let Ok(mut t) = self.started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("{step}…"));
    }

    fn on_step_complete(&self, step: PipelineStep) {
        self.bar
            .println(format!("  {} {:<22} {}", green("✓"), step.label(), self.step_elapsed()));
        self.bar.inc(1);
    }

    fn on_step_error(&self, step: PipelineStep, error: &str) {
        self.bar.println(format!(
            "  {} {:<22} {}  {}",
            red("✗"),
            step.label(),
            red(error),
            self.step_elapsed()
        ));
        self.bar.abandon();
    }

    fn on_pipeline_complete(&self) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the HTTP API on 0.0.0.0:8765
  compliance-master serve

  # List the quality rules
  compliance-master rules --severity error

  # Parse a document (no API key needed)
  compliance-master parse calibration_procedure.docx

  # Extract selected fields
  compliance-master extract sop.pdf --field document_number --field department

  # Full workflow, template to a file, report as JSON
  compliance-master workflow sop.docx --iso-standard "ISO 13485:2016" -o template.md

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Provider used with EDGEQUAKE_MODEL when --provider is unset
  EDGEQUAKE_MODEL         Model ID
  SAVE_LOCAL_COPIES       Archive results as JSON (true/false)
  PDFIUM_LIB_PATH         Path to libpdfium for PDF text extraction
  RUST_LOG                Log filter (overrides --verbose/--quiet)

A .env file in the working directory is loaded before arguments are parsed.
"#;

/// Extract, template and grade quality documents with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "compliance-master",
    version,
    about = "Turn quality documents into graded ISO templates using an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    llm: LlmArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "COMPLIANCE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "COMPLIANCE_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "COMPLIANCE_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, global = true, env = "COMPLIANCE_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: usize,

    /// Archive results as timestamped JSON files.
    #[arg(long, global = true, env = "SAVE_LOCAL_COPIES")]
    save_local_copies: bool,

    /// Directory for archived templates and pipeline runs.
    #[arg(long, global = true, env = "COMPLIANCE_OUTPUTS_DIR", default_value = "outputs")]
    outputs_dir: PathBuf,

    /// Directory for archived quality checks.
    #[arg(long, global = true, env = "COMPLIANCE_QUALITY_CHECKS_DIR", default_value = "quality_checks")]
    quality_checks_dir: PathBuf,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, global = true, env = "COMPLIANCE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "COMPLIANCE_HOST", default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "COMPLIANCE_PORT", default_value_t = 8765)]
        port: u16,

        /// Maximum request body size in MiB.
        #[arg(long, env = "COMPLIANCE_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_BYTES / (1024 * 1024))]
        max_upload_mb: usize,
    },

    /// Print the quality rule catalog.
    Rules {
        /// Only rules of this severity (error, warning, info).
        #[arg(long)]
        severity: Option<String>,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract a document's text.
    Parse {
        /// Local file path or HTTP/HTTPS URL.
        input: String,

        /// Output text and metadata as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract fields from a document with the LLM.
    Extract {
        /// Local file path or HTTP/HTTPS URL.
        input: String,

        /// Field to extract (repeatable). Default: the standard eight fields.
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// Parse, extract, generate and grade in one run.
    Workflow {
        /// Local file path or HTTP/HTTPS URL.
        input: String,

        #[arg(long, default_value = DEFAULT_DOCUMENT_TYPE)]
        document_type: String,

        #[arg(long, default_value = DEFAULT_ISO_STANDARD)]
        iso_standard: String,

        /// Write the generated template to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output the full workflow result as JSON.
        #[arg(long)]
        json: bool,

        /// Disable the progress bar.
        #[arg(long, env = "COMPLIANCE_NO_PROGRESS")]
        no_progress: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env in the working directory.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || shows_progress(&cli) {
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

    match &cli.command {
        Command::Serve {
            host,
            port,
            max_upload_mb,
        } => {
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("Invalid listen address {host}:{port}"))?;
            let service = build_service(&cli, None)?;
            let app = server::build_router(Arc::new(service), max_upload_mb * 1024 * 1024);
            server::serve(addr, app).await.context("Server failed")?;
        }

        Command::Rules { severity, json } => {
            let catalog = RuleCatalog::standard();
            let rules: Vec<_> = match severity {
                Some(s) => catalog.rules_by_severity(&Severity::from(s.as_str())),
                None => catalog.all_rules().iter().collect(),
            };
            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&rules).context("Failed to serialise rules")?
                );
            } else {
                for rule in rules {
                    println!(
                        "{}  {:<8} {}",
                        bold(rule.id),
                        rule.severity.as_str().to_uppercase(),
                        rule.name
                    );
                    println!("       {}", dim(rule.description));
                }
            }
        }

        Command::Parse { input, json } => {
            let resolved = resolve_input(input, cli.llm.download_timeout)
                .await
                .context("Failed to resolve input")?;
            let parsed = NativeParser::from_env()
                .parse(resolved.path())
                .await
                .context("Failed to parse document")?;
            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&parsed).context("Failed to serialise document")?
                );
            } else {
                write_stdout(&parsed.text)?;
                if !cli.quiet {
                    eprintln!(
                        "{} {}  {} chars{}",
                        green("✔"),
                        bold(&parsed.metadata.filename),
                        parsed.text.chars().count(),
                        parsed
                            .metadata
                            .page_count
                            .map(|n| format!(", {n} pages"))
                            .unwrap_or_default(),
                    );
                }
            }
        }

        Command::Extract { input, fields } => {
            let service = build_service(&cli, None)?;
            let parsed = service
                .parse_document(DocumentInput::Location(input.clone()))
                .await
                .context("Failed to parse document")?;
            let requested = (!fields.is_empty()).then(|| fields.clone());
            let extracted = service
                .extract_fields(&parsed.text, requested)
                .await
                .context("Field extraction failed")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&extracted).context("Failed to serialise fields")?
            );
        }

        Command::Workflow {
            input,
            document_type,
            iso_standard,
            output,
            json,
            ..
        } => {
            let progress: Option<ProgressCallback> = if shows_progress(&cli) {
                Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
            } else {
                None
            };
            let service = build_service(&cli, progress)?;
            let options = RunOptions::new(Some(document_type.as_str()), Some(iso_standard.as_str()));
            let result = service
                .workflow_complete(DocumentInput::Location(input.clone()), &options)
                .await
                .context("Workflow failed")?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result).context("Failed to serialise result")?
                );
            } else if let Some(path) = output {
                tokio::fs::write(path, &result.template.text)
                    .await
                    .with_context(|| format!("Failed to write template to {}", path.display()))?;
            } else {
                write_stdout(&result.template.text)?;
            }

            if !cli.quiet {
                let q = &result.quality;
                let tick = if q.rules_failed == 0 { green("✔") } else { red("✘") };
                eprintln!(
                    "{}  grade {}  score {:.1}  {}/{} rules passed",
                    tick,
                    bold(&q.grade.to_string()),
                    q.overall_score,
                    q.rules_passed,
                    q.total_rules_checked,
                );
                for v in q.violations.iter().filter(|v| !v.passed) {
                    eprintln!(
                        "   {} {} {}",
                        red(&v.rule_id),
                        v.rule_name,
                        dim(&v.violation_details)
                    );
                }
                for r in &q.recommendations {
                    eprintln!("   → {r}");
                }
                if let Some(ref p) = result.saved_file_path {
                    eprintln!("   saved {}", dim(p));
                }
            }
        }
    }

    Ok(())
}

fn shows_progress(cli: &Cli) -> bool {
    match &cli.command {
        Command::Workflow {
            json, no_progress, ..
        } => !cli.quiet && !cli.verbose && !json && !no_progress,
        _ => false,
    }
}

/// Map CLI args to `PipelineConfig` and build the service.
fn build_service(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ComplianceService> {
    let mut builder = PipelineConfig::builder()
        .temperature(cli.llm.temperature)
        .max_tokens(cli.llm.max_tokens)
        .save_local_copies(cli.llm.save_local_copies)
        .outputs_dir(&cli.llm.outputs_dir)
        .quality_checks_dir(&cli.llm.quality_checks_dir)
        .download_timeout_secs(cli.llm.download_timeout);
    if let Some(ref model) = cli.llm.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.llm.provider {
        builder = builder.provider_name(provider);
    }
    let config = builder.build().context("Invalid configuration")?;

    let service = ComplianceService::from_config(&config).context("Failed to initialise LLM provider")?;
    Ok(match progress {
        Some(cb) => service.with_progress(cb),
        None => service,
    })
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
