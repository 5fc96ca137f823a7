//! # compliance-master
//!
//! Turn an uploaded quality document into a standards-compliant ISO template
//! and grade it, using a hosted LLM.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Parse     PDF (pdfium) / DOCX / plain text → text + metadata
//!  ├─ 2. Extract   LLM pulls named fields out of the text
//!  ├─ 3. Generate  LLM drafts an ISO template from the fields
//!  └─ 4. Grade     LLM judges the template against 15 quality rules;
//!                  score and grade are computed locally
//! ```
//!
//! The model's answers are free text. [`recovery`] pulls a JSON object out of
//! them and each step degrades to documented placeholder values when that
//! fails, so a confused model lowers data quality instead of failing the
//! request. Only collaborator failures (unreadable document, unreachable
//! provider) surface as [`ComplianceError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use compliance_master::{ComplianceService, DocumentInput, PipelineConfig, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let service = ComplianceService::from_config(&PipelineConfig::default())?;
//!     let output = service
//!         .workflow_complete(
//!             DocumentInput::Location("calibration_procedure.docx".into()),
//!             &RunOptions::default(),
//!         )
//!         .await?;
//!     println!("{}", output.template.text);
//!     eprintln!("grade {} ({:.1})", output.quality.grade, output.quality.overall_score);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum HTTP API ([`server`]) |
//! | `cli`    | on      | the `compliance-master` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable both when using only the library:
//! ```toml
//! compliance-master = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod recovery;
pub mod rules;
pub mod scoring;
#[cfg(feature = "server")]
pub mod server;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use archive::{Archive, ArchiveKind};
pub use config::{PipelineConfig, PipelineConfigBuilder, DEFAULT_DOCUMENT_TYPE, DEFAULT_ISO_STANDARD};
pub use error::ComplianceError;
pub use output::{
    DocumentMetadata, ExtractedField, FieldMap, GeneratedTemplate, ParsedDocument, ProcessOutput,
    QualityEvaluation, QualityOutcome, QualityReport, RuleViolation, TemplateOutcome,
    WorkflowOutput,
};
pub use pipeline::input::DocumentInput;
pub use pipeline::llm::{LlmGenerator, TextGenerator};
pub use pipeline::parse::{DocumentParser, NativeParser};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, PipelineStep, ProgressCallback};
pub use recovery::{recover, recover_json, ParseOutcome, RecoveryFailure};
pub use rules::{QualityRule, RuleCatalog, Severity};
pub use scoring::{Grade, Score};
pub use service::{ComplianceService, RunOptions};
