//! The public operation set: validation, step chaining and archival.
//!
//! [`ComplianceService`] is constructed once with its collaborators and
//! shared (behind an `Arc`) by every request. It holds no per-request state;
//! each call builds its own data and drops it on return.
//!
//! Validation happens here, before any model call. The pipeline steps
//! themselves are more lenient (an empty field map is a valid generation
//! input) so the combined operations can chain them without re-checking.

use crate::archive::{Archive, ArchiveKind};
use crate::config::{PipelineConfig, DEFAULT_DOCUMENT_TYPE, DEFAULT_ISO_STANDARD};
use crate::error::ComplianceError;
use crate::output::{
    fields_to_map, ExtractedField, FieldMap, GeneratedTemplate, ParsedDocument, ProcessOutput,
    QualityOutcome, QualityReport, TemplateOutcome, WorkflowOutput,
};
use crate::pipeline::input::{self, DocumentInput};
use crate::pipeline::llm::{LlmGenerator, TextGenerator};
use crate::pipeline::parse::{DocumentParser, NativeParser};
use crate::pipeline::{extract, generate, grade};
use crate::progress::{PipelineStep, ProgressCallback};
use crate::prompts::default_fields;
use crate::rules::RuleCatalog;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// Target and field set for the combined operations.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub document_type: String,
    pub iso_standard: String,
    pub field_names: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            document_type: DEFAULT_DOCUMENT_TYPE.to_string(),
            iso_standard: DEFAULT_ISO_STANDARD.to_string(),
            field_names: default_fields(),
        }
    }
}

impl RunOptions {
    /// Options with the given target; `None` or blank values fall back to the
    /// defaults.
    pub fn new(document_type: Option<&str>, iso_standard: Option<&str>) -> Self {
        let pick = |v: Option<&str>, default: &str| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        Self {
            document_type: pick(document_type, DEFAULT_DOCUMENT_TYPE),
            iso_standard: pick(iso_standard, DEFAULT_ISO_STANDARD),
            field_names: default_fields(),
        }
    }
}

#[derive(Serialize)]
struct TemplateRecord<'a> {
    document_type: &'a str,
    iso_standard: &'a str,
    extracted_fields: &'a FieldMap,
    generated_template: &'a str,
    timestamp: DateTime<Local>,
}

#[derive(Serialize)]
struct QualityRecord<'a> {
    document_type: &'a str,
    iso_standard: &'a str,
    #[serde(flatten)]
    report: &'a QualityReport,
    timestamp: DateTime<Local>,
}

/// Document compliance pipeline with injected collaborators.
pub struct ComplianceService {
    generator: Arc<dyn TextGenerator>,
    parser: Arc<dyn DocumentParser>,
    catalog: Arc<RuleCatalog>,
    archive: Option<Archive>,
    progress: Option<ProgressCallback>,
    download_timeout_secs: u64,
}

impl ComplianceService {
    /// A service over the standard rule catalog, without archival.
    pub fn new(generator: Arc<dyn TextGenerator>, parser: Arc<dyn DocumentParser>) -> Self {
        Self {
            generator,
            parser,
            catalog: Arc::new(RuleCatalog::standard()),
            archive: None,
            progress: None,
            download_timeout_secs: PipelineConfig::default().download_timeout_secs,
        }
    }

    /// Resolve the LLM provider, bind the native parser and set up archival
    /// from `config`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ComplianceError> {
        let generator = LlmGenerator::from_config(config)?;
        let mut service = Self::new(Arc::new(generator), Arc::new(NativeParser::from_env()))
            .with_archive(Archive::from_config(config));
        service.download_timeout_secs = config.download_timeout_secs;
        Ok(service)
    }

    pub fn with_catalog(mut self, catalog: Arc<RuleCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_archive(mut self, archive: Option<Archive>) -> Self {
        self.archive = archive;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    // ── Single operations ─────────────────────────────────────────────────

    /// Resolve and parse a document.
    pub async fn parse_document(&self, input: DocumentInput) -> Result<ParsedDocument, ComplianceError> {
        let resolved = input::resolve(input, self.download_timeout_secs).await?;
        let parsed = self.parser.parse(resolved.path()).await;
        if let Err(e) = &parsed {
            if !e.is_client_error() {
                error!("Document parsing failed: {}", e);
            }
        }
        parsed
    }

    /// Extract `field_names` (default set when `None`) from `document_text`.
    pub async fn extract_fields(
        &self,
        document_text: &str,
        field_names: Option<Vec<String>>,
    ) -> Result<Vec<ExtractedField>, ComplianceError> {
        if document_text.trim().is_empty() {
            return Err(ComplianceError::InvalidRequest(
                "Document text cannot be empty".into(),
            ));
        }
        let field_names = field_names.unwrap_or_else(default_fields);
        if field_names.is_empty() {
            return Ok(Vec::new());
        }
        extract::extract_fields(self.generator.as_ref(), document_text, &field_names).await
    }

    /// Draft a template from a non-empty field map and archive it.
    pub async fn generate_template(
        &self,
        document_type: &str,
        iso_standard: &str,
        fields: &FieldMap,
    ) -> Result<TemplateOutcome, ComplianceError> {
        if fields.is_empty() {
            return Err(ComplianceError::InvalidRequest(
                "Extracted fields cannot be empty".into(),
            ));
        }
        let template =
            generate::generate_template(self.generator.as_ref(), document_type, iso_standard, fields)
                .await?;

        let record = TemplateRecord {
            document_type,
            iso_standard,
            extracted_fields: fields,
            generated_template: &template.text,
            timestamp: Local::now(),
        };
        let saved_file_path = self
            .archive(ArchiveKind::Output, &format!("iso_template_{document_type}"), &record)
            .await;

        Ok(TemplateOutcome {
            template,
            saved_file_path,
        })
    }

    /// Grade a non-blank template and archive the report.
    pub async fn check_quality(
        &self,
        template: &str,
        fields: Option<&FieldMap>,
        document_type: &str,
        iso_standard: &str,
    ) -> Result<QualityOutcome, ComplianceError> {
        if template.trim().is_empty() {
            return Err(ComplianceError::InvalidRequest(
                "Generated template cannot be empty".into(),
            ));
        }
        let report = self.grade(template, fields, document_type, iso_standard).await?;

        let record = QualityRecord {
            document_type,
            iso_standard,
            report: &report,
            timestamp: Local::now(),
        };
        let saved_file_path = self
            .archive(ArchiveKind::QualityCheck, &format!("quality_check_{document_type}"), &record)
            .await;

        Ok(QualityOutcome {
            report,
            saved_file_path,
        })
    }

    // ── Combined operations ───────────────────────────────────────────────

    /// Parse → extract → generate.
    pub async fn process_complete(
        &self,
        input: DocumentInput,
        options: &RunOptions,
    ) -> Result<ProcessOutput, ComplianceError> {
        self.pipeline_start(3);
        let source_document = input.display_name();
        info!("Processing '{}' as {} / {}", source_document, options.document_type, options.iso_standard);

        let (parsed, fields, template) = self.parse_extract_generate(input, options).await?;

        let mut output = ProcessOutput {
            document_metadata: parsed.metadata,
            extracted_fields: fields,
            template,
            source_document,
            timestamp: Local::now(),
            saved_file_path: None,
        };
        output.saved_file_path = self
            .archive(
                ArchiveKind::Output,
                &format!("complete_pipeline_{}", options.document_type),
                &output,
            )
            .await;

        self.pipeline_complete();
        Ok(output)
    }

    /// Parse → extract → generate → grade.
    pub async fn workflow_complete(
        &self,
        input: DocumentInput,
        options: &RunOptions,
    ) -> Result<WorkflowOutput, ComplianceError> {
        self.pipeline_start(4);
        let source_document = input.display_name();
        info!("Workflow for '{}' as {} / {}", source_document, options.document_type, options.iso_standard);

        let (parsed, fields, template) = self.parse_extract_generate(input, options).await?;
        // Grade the template body even when the model wrapped it in JSON.
        let quality = {
            let body = template.unwrap_nested();
            self.step(
                PipelineStep::Grade,
                self.grade(&body, Some(&fields), &options.document_type, &options.iso_standard),
            )
            .await?
        };

        let mut output = WorkflowOutput {
            extracted_text: parsed.text,
            document_metadata: parsed.metadata,
            extracted_fields: fields,
            template,
            quality,
            source_document,
            timestamp: Local::now(),
            saved_file_path: None,
        };
        output.saved_file_path = self
            .archive(
                ArchiveKind::Output,
                &format!("complete_workflow_{}", options.document_type),
                &output,
            )
            .await;

        info!(
            "Workflow complete: grade {} ({:.1})",
            output.quality.grade, output.quality.overall_score
        );
        self.pipeline_complete();
        Ok(output)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    async fn parse_extract_generate(
        &self,
        input: DocumentInput,
        options: &RunOptions,
    ) -> Result<(ParsedDocument, FieldMap, GeneratedTemplate), ComplianceError> {
        let parsed = self
            .step(PipelineStep::Parse, self.parse_document(input))
            .await?;

        let extracted = self
            .step(
                PipelineStep::Extract,
                extract::extract_fields(self.generator.as_ref(), &parsed.text, &options.field_names),
            )
            .await?;
        let fields = fields_to_map(&extracted);

        let template = self
            .step(
                PipelineStep::Generate,
                generate::generate_template(
                    self.generator.as_ref(),
                    &options.document_type,
                    &options.iso_standard,
                    &fields,
                ),
            )
            .await?;

        Ok((parsed, fields, template))
    }

    async fn grade(
        &self,
        template: &str,
        fields: Option<&FieldMap>,
        document_type: &str,
        iso_standard: &str,
    ) -> Result<QualityReport, ComplianceError> {
        let request = grade::GradeRequest {
            template,
            fields,
            document_type,
            iso_standard,
            catalog: &self.catalog,
            today: Local::now().date_naive(),
        };
        grade::check_quality(self.generator.as_ref(), &request).await
    }

    async fn archive<T: Serialize>(&self, kind: ArchiveKind, prefix: &str, record: &T) -> Option<String> {
        match &self.archive {
            Some(archive) => archive.save_logged(kind, prefix, record, Local::now()).await,
            None => None,
        }
    }

    /// Run one step, reporting it to the progress callback.
    async fn step<T>(
        &self,
        step: PipelineStep,
        fut: impl Future<Output = Result<T, ComplianceError>>,
    ) -> Result<T, ComplianceError> {
        if let Some(cb) = &self.progress {
            cb.on_step_start(step);
        }
        let result = fut.await;
        if let Some(cb) = &self.progress {
            match &result {
                Ok(_) => cb.on_step_complete(step),
                Err(e) => cb.on_step_error(step, &e.to_string()),
            }
        }
        result
    }

    fn pipeline_start(&self, total_steps: usize) {
        if let Some(cb) = &self.progress {
            cb.on_pipeline_start(total_steps);
        }
    }

    fn pipeline_complete(&self) {
        if let Some(cb) = &self.progress {
            cb.on_pipeline_complete();
        }
    }
}
