//! Request and response bodies of the HTTP API.

use crate::config::{DEFAULT_DOCUMENT_TYPE, DEFAULT_ISO_STANDARD};
use crate::output::{
    DocumentMetadata, ExtractedField, FieldMap, ParsedDocument, ProcessOutput, QualityOutcome,
    RuleViolation, TemplateOutcome, WorkflowOutput,
};
use crate::rules::QualityRule;
use crate::scoring::Grade;
use serde::{Deserialize, Serialize};

fn default_document_type() -> String {
    DEFAULT_DOCUMENT_TYPE.to_string()
}

fn default_iso_standard() -> String {
    DEFAULT_ISO_STANDARD.to_string()
}

// ── Requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractFieldsRequest {
    pub document_text: String,
    /// Absent → default field set; `[]` → empty result.
    #[serde(default)]
    pub fields_to_extract: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateTemplateRequest {
    #[serde(default = "default_document_type")]
    pub document_type: String,
    pub extracted_fields: FieldMap,
    #[serde(default = "default_iso_standard")]
    pub iso_standard: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckQualityRequest {
    pub generated_template: String,
    /// Absent or `null` → graded from the template alone.
    #[serde(default)]
    pub extracted_fields: Option<FieldMap>,
    pub document_type: String,
    pub iso_standard: String,
}

/// Optional target for the upload endpoints, read from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct TargetQuery {
    pub iso_standard: Option<String>,
    pub document_type: Option<String>,
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub rules: Vec<QualityRule>,
    pub total: usize,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ParseDocumentResponse {
    pub extracted_text: String,
    pub metadata: DocumentMetadata,
    pub success: bool,
    pub message: String,
}

impl From<ParsedDocument> for ParseDocumentResponse {
    fn from(doc: ParsedDocument) -> Self {
        Self {
            extracted_text: doc.text,
            metadata: doc.metadata,
            success: true,
            message: "Document parsed successfully".into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractFieldsResponse {
    pub extracted_fields: Vec<ExtractedField>,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub generated_template: String,
    pub document_type: String,
    pub iso_standard: String,
    pub success: bool,
    pub message: String,
    pub saved_file_path: Option<String>,
}

impl TemplateResponse {
    pub fn from_outcome(outcome: TemplateOutcome, message: &str) -> Self {
        Self {
            generated_template: outcome.template.text,
            document_type: outcome.template.document_type,
            iso_standard: outcome.template.iso_standard,
            success: true,
            message: message.to_string(),
            saved_file_path: outcome.saved_file_path,
        }
    }
}

impl From<ProcessOutput> for TemplateResponse {
    fn from(out: ProcessOutput) -> Self {
        Self::from_outcome(
            TemplateOutcome {
                template: out.template,
                saved_file_path: out.saved_file_path,
            },
            "Complete processing pipeline executed successfully",
        )
    }
}

#[derive(Debug, Serialize)]
pub struct QualityCheckResponse {
    pub overall_score: f64,
    pub total_rules_checked: usize,
    pub rules_passed: usize,
    pub rules_failed: usize,
    pub violations: Vec<RuleViolation>,
    pub recommendations: Vec<String>,
    pub quality_grade: Grade,
    pub success: bool,
    pub message: String,
    pub saved_file_path: Option<String>,
}

impl From<QualityOutcome> for QualityCheckResponse {
    fn from(outcome: QualityOutcome) -> Self {
        let r = outcome.report;
        Self {
            message: format!("Quality check completed with grade {}", r.grade),
            overall_score: r.overall_score,
            total_rules_checked: r.total_rules_checked,
            rules_passed: r.rules_passed,
            rules_failed: r.rules_failed,
            violations: r.violations,
            recommendations: r.recommendations,
            quality_grade: r.grade,
            success: true,
            saved_file_path: outcome.saved_file_path,
        }
    }
}

/// Flat view of a [`WorkflowOutput`].
#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub extracted_text: String,
    pub document_metadata: DocumentMetadata,
    pub extracted_fields: FieldMap,
    pub generated_template: String,
    pub document_type: String,
    pub iso_standard: String,
    pub quality_score: f64,
    pub quality_grade: Grade,
    pub total_rules_checked: usize,
    pub rules_passed: usize,
    pub rules_failed: usize,
    pub violations: Vec<RuleViolation>,
    pub recommendations: Vec<String>,
    pub source_document: String,
    pub timestamp: String,
    pub success: bool,
    pub message: String,
    pub saved_file_path: Option<String>,
}

impl From<WorkflowOutput> for WorkflowResponse {
    fn from(out: WorkflowOutput) -> Self {
        let q = out.quality;
        Self {
            message: format!("Complete workflow executed successfully with grade {}", q.grade),
            extracted_text: out.extracted_text,
            document_metadata: out.document_metadata,
            extracted_fields: out.extracted_fields,
            generated_template: out.template.text,
            document_type: out.template.document_type,
            iso_standard: out.template.iso_standard,
            quality_score: q.overall_score,
            quality_grade: q.grade,
            total_rules_checked: q.total_rules_checked,
            rules_passed: q.rules_passed,
            rules_failed: q.rules_failed,
            violations: q.violations,
            recommendations: q.recommendations,
            source_document: out.source_document,
            timestamp: out.timestamp.to_rfc3339(),
            success: true,
            saved_file_path: out.saved_file_path,
        }
    }
}
