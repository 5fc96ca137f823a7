//! Quality grading: template → per-rule verdicts → locally computed score.
//!
//! The model only judges pass/fail per rule. Its answer is shape-checked
//! entry by entry; anything unusable is dropped or replaced by an explanatory
//! recommendation, and the score is always computed by [`crate::scoring`].

use crate::error::ComplianceError;
use crate::output::{FieldMap, QualityEvaluation, QualityReport, RuleViolation};
use crate::pipeline::llm::TextGenerator;
use crate::prompts::{build_grading_prompt, GradingPromptInput};
use crate::recovery::{self, ParseOutcome, RecoveryFailure};
use crate::rules::RuleCatalog;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

pub const EMPTY_RESPONSE: &str = "LLM returned empty response. Please try again.";
pub const INVALID_FORMAT: &str = "LLM returned invalid response format.";
pub const MALFORMED_RESPONSE: &str =
    "Failed to parse quality check results. Please review manually.";
pub const NO_JSON_RESPONSE: &str =
    "Unable to parse quality check results. Please review manually.";

/// What to grade and against which catalog.
#[derive(Debug, Clone, Copy)]
pub struct GradeRequest<'a> {
    pub template: &'a str,
    pub fields: Option<&'a FieldMap>,
    pub document_type: &'a str,
    pub iso_standard: &'a str,
    pub catalog: &'a RuleCatalog,
    pub today: NaiveDate,
}

/// Grade a template against every rule in the catalog.
pub async fn check_quality(
    generator: &dyn TextGenerator,
    request: &GradeRequest<'_>,
) -> Result<QualityReport, ComplianceError> {
    let prompt = build_grading_prompt(&GradingPromptInput {
        template: request.template,
        fields: request.fields,
        document_type: request.document_type,
        iso_standard: request.iso_standard,
        catalog: request.catalog,
        today: request.today,
    });
    debug!("Grading prompt: {} chars", prompt.len());

    let evaluation = match generator.generate(&prompt).await? {
        None => {
            warn!("Grading: model returned no content");
            degraded(EMPTY_RESPONSE)
        }
        Some(raw) => match recovery::recover(&raw) {
            ParseOutcome::Recovered(map) => evaluation_from(map, request.catalog),
            ParseOutcome::Unparseable(reason) => {
                warn!("Grading: could not recover model output ({})", reason);
                degraded(match reason {
                    RecoveryFailure::NoObject => NO_JSON_RESPONSE,
                    RecoveryFailure::Malformed { .. } => MALFORMED_RESPONSE,
                    RecoveryFailure::NotAnObject => INVALID_FORMAT,
                })
            }
        },
    };

    let report = QualityReport::from(evaluation);
    info!(
        "Grading: {}/{} rules passed, score {:.1} ({})",
        report.rules_passed, report.total_rules_checked, report.overall_score, report.grade
    );
    Ok(report)
}

fn degraded(recommendation: &str) -> QualityEvaluation {
    QualityEvaluation {
        violations: Vec::new(),
        recommendations: vec![recommendation.to_string()],
    }
}

fn evaluation_from(mut map: Map<String, Value>, catalog: &RuleCatalog) -> QualityEvaluation {
    let violations = match map.remove("violations") {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<RuleViolation>(entry) {
                Ok(v) => Some(backfill(v, catalog)),
                Err(e) => {
                    warn!("Grading: skipping malformed violation entry: {}", e);
                    None
                }
            })
            .collect(),
        Some(_) => {
            warn!("Grading: 'violations' is not an array");
            Vec::new()
        }
        None => Vec::new(),
    };

    let recommendations = match map.remove("recommendations") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    QualityEvaluation {
        violations,
        recommendations,
    }
}

/// Fill an empty name or description from the catalog entry with the same id.
fn backfill(mut v: RuleViolation, catalog: &RuleCatalog) -> RuleViolation {
    if let Some(rule) = catalog.get(&v.rule_id) {
        if v.rule_name.is_empty() {
            v.rule_name = rule.name.to_string();
        }
        if v.description.is_empty() {
            v.description = rule.description.to_string();
        }
    }
    v
}
