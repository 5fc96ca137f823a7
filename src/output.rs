//! Data produced by the pipeline.
//!
//! Every value here is created fresh per request and never shared or mutated
//! afterwards. All types serialise with `serde` so the HTTP layer and the
//! optional JSON archive can emit them unchanged.

use crate::recovery::{self, ParseOutcome};
use crate::rules::Severity;
use crate::scoring::{self, Grade};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Ordered mapping field-name → extracted value.
///
/// Kept as a map rather than a struct because the field set is chosen by the
/// caller. Insertion order is preserved so prompts list fields in the order
/// they were requested.
pub type FieldMap = IndexMap<String, String>;

/// Value reported for a field the model did not return.
pub const NOT_FOUND: &str = "Not found";

/// Value reported for every field when the model response is unusable.
pub const EXTRACTION_FAILED: &str = "Error: Could not extract";

// ── Parsing ──────────────────────────────────────────────────────────────

/// Metadata about a parsed source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// File name without directories.
    pub filename: String,
    /// Lowercase extension without the dot, or `"unknown"`.
    pub format: String,
    /// Page count when the format has pages (PDF).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
}

/// Text extracted from a document plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

// ── Extraction ───────────────────────────────────────────────────────────

/// One field pulled out of a document by the model.
///
/// `confidence` is a heuristic in `[0, 1]`, not a calibrated probability: the
/// model's own estimate when it answered in the requested shape, otherwise a
/// fixed constant describing how the value was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub field_name: String,
    pub value: String,
    pub confidence: f64,
}

impl ExtractedField {
    /// Confidence used when the model omitted a field or its confidence.
    pub const DEFAULT_CONFIDENCE: f64 = 0.5;
    /// Confidence used when the model answered with a bare value.
    pub const RAW_VALUE_CONFIDENCE: f64 = 0.7;

    pub fn new(field_name: impl Into<String>, value: impl Into<String>, confidence: f64) -> Self {
        Self {
            field_name: field_name.into(),
            value: value.into(),
            confidence,
        }
    }

    /// A field the model did not mention.
    pub fn not_found(field_name: impl Into<String>) -> Self {
        Self::new(field_name, NOT_FOUND, Self::DEFAULT_CONFIDENCE)
    }

    /// A field lost because the whole response could not be recovered.
    pub fn failed(field_name: impl Into<String>) -> Self {
        Self::new(field_name, EXTRACTION_FAILED, 0.0)
    }

    /// `true` when the value is one of the degraded placeholders.
    pub fn is_missing(&self) -> bool {
        self.value == NOT_FOUND || self.value == EXTRACTION_FAILED
    }
}

/// Collapse extracted fields into a [`FieldMap`], keeping request order.
pub fn fields_to_map(fields: &[ExtractedField]) -> FieldMap {
    fields
        .iter()
        .map(|f| (f.field_name.clone(), f.value.clone()))
        .collect()
}

// ── Generation ───────────────────────────────────────────────────────────

/// A drafted document template and the target it was drafted for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTemplate {
    #[serde(rename = "generated_template")]
    pub text: String,
    pub document_type: String,
    pub iso_standard: String,
}

impl GeneratedTemplate {
    /// Keys under which a model sometimes nests the real template text.
    const NESTED_KEYS: [&'static str; 3] = ["template", "generated_template", "content"];

    /// The template text, unwrapped if the model serialised it inside JSON.
    ///
    /// Returns the original text when no JSON object is recoverable or none
    /// of the known keys holds a string.
    pub fn unwrap_nested(&self) -> Cow<'_, str> {
        match recovery::recover(&self.text) {
            ParseOutcome::Recovered(map) => Self::NESTED_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(|v| v.as_str()))
                .map(|inner| Cow::Owned(inner.trim().to_string()))
                .unwrap_or(Cow::Borrowed(self.text.as_str())),
            ParseOutcome::Unparseable(_) => Cow::Borrowed(self.text.as_str()),
        }
    }
}

// ── Grading ──────────────────────────────────────────────────────────────

/// The model's verdict on one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    #[serde(default)]
    pub rule_id: String,
    #[serde(default)]
    pub rule_name: String,
    #[serde(default = "unknown_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub violation_details: String,
    pub passed: bool,
}

fn unknown_severity() -> Severity {
    Severity::Unknown(String::new())
}

/// Raw pass/fail judgments as returned by the model, before scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityEvaluation {
    pub violations: Vec<RuleViolation>,
    pub recommendations: Vec<String>,
}

/// A graded template.
///
/// `overall_score` and `grade` are derived locally from `violations` by
/// [`crate::scoring::score`]; the model never supplies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub violations: Vec<RuleViolation>,
    pub recommendations: Vec<String>,
    pub overall_score: f64,
    #[serde(rename = "quality_grade")]
    pub grade: Grade,
    pub total_rules_checked: usize,
    pub rules_passed: usize,
    pub rules_failed: usize,
}

impl From<QualityEvaluation> for QualityReport {
    fn from(eval: QualityEvaluation) -> Self {
        let score = scoring::score(&eval.violations);
        let rules_passed = eval.violations.iter().filter(|v| v.passed).count();
        let total = eval.violations.len();
        Self {
            overall_score: score.overall_score,
            grade: score.grade,
            total_rules_checked: total,
            rules_passed,
            rules_failed: total - rules_passed,
            violations: eval.violations,
            recommendations: eval.recommendations,
        }
    }
}

// ── Operation results ────────────────────────────────────────────────────

/// Result of template generation, with the archive location if one was
/// written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateOutcome {
    #[serde(flatten)]
    pub template: GeneratedTemplate,
    pub saved_file_path: Option<String>,
}

/// Result of a quality check, with the archive location if one was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityOutcome {
    #[serde(flatten)]
    pub report: QualityReport,
    pub saved_file_path: Option<String>,
}

/// Everything produced by a parse → extract → generate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutput {
    pub document_metadata: DocumentMetadata,
    pub extracted_fields: FieldMap,
    #[serde(flatten)]
    pub template: GeneratedTemplate,
    pub source_document: String,
    pub timestamp: DateTime<Local>,
    pub saved_file_path: Option<String>,
}

/// Everything produced by a parse → extract → generate → grade run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutput {
    pub extracted_text: String,
    pub document_metadata: DocumentMetadata,
    pub extracted_fields: FieldMap,
    #[serde(flatten)]
    pub template: GeneratedTemplate,
    pub quality: QualityReport,
    pub source_document: String,
    pub timestamp: DateTime<Local>,
    pub saved_file_path: Option<String>,
}
