//! The quality rule catalog.
//!
//! The catalog is the single source of truth for what "quality" means: the
//! LLM is only ever asked to *evaluate against* this text, never to invent
//! rules of its own. It is fixed at compile time, ordered, and read-only, so a
//! single [`RuleCatalog`] can be shared across concurrent requests behind an
//! `Arc` without locking.
//!
//! Rules are grouped by concern:
//!
//! | Ids | Concern |
//! |-----|---------|
//! | QR001–QR002 | completeness |
//! | QR003–QR007 | data quality of extracted fields |
//! | QR008–QR010 | content quality |
//! | QR011–QR013 | ISO compliance |
//! | QR014–QR015 | consistency |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ── Severity ─────────────────────────────────────────────────────────────

/// How much a rule matters when it fails.
///
/// Severity is only ever a scoring weight (see [`crate::scoring`]); it never
/// drives control flow. Model-supplied severities are free text, so parsing
/// is tolerant: the three known names match case-insensitively and anything
/// else, non-string JSON included, is kept verbatim in [`Severity::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum Severity {
    Error,
    Warning,
    Info,
    /// A severity the model made up. Scored with the fallback weight.
    Unknown(String),
}

impl Severity {
    /// Canonical lowercase name (`"error"`, `"warning"`, `"info"`), or the
    /// original text for [`Severity::Unknown`].
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for Severity {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            "info" => Severity::Info,
            _ => Severity::Unknown(raw.to_string()),
        }
    }
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        Severity::from(raw.as_str())
    }
}

impl From<Value> for Severity {
    fn from(raw: Value) -> Self {
        match raw {
            Value::String(s) => Severity::from(s.as_str()),
            other => Severity::Unknown(other.to_string()),
        }
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Rules ────────────────────────────────────────────────────────────────

/// A single immutable quality rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityRule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    /// Judged against extracted field values rather than template structure.
    ///
    /// When a grading request carries no fields, the prompt tells the model
    /// to judge these from the template text alone.
    #[serde(skip)]
    pub field_specific: bool,
}

const fn rule(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    severity: Severity,
    field_specific: bool,
) -> QualityRule {
    QualityRule {
        id,
        name,
        description,
        severity,
        field_specific,
    }
}

static STANDARD_RULES: [QualityRule; 15] = [
    // Completeness
    rule(
        "QR001",
        "Required Fields Present",
        "All required fields (document_title, document_number, revision_number, effective_date, department, author, purpose, scope) must be present and not empty or 'Not found'.",
        Severity::Error,
        true,
    ),
    rule(
        "QR002",
        "Document Structure Complete",
        "Generated template must include all required sections: header, purpose, scope, definitions, procedures/records, responsibilities, related documents, and revision history.",
        Severity::Error,
        false,
    ),
    // Data quality
    rule(
        "QR003",
        "Department Field Validation",
        "Department field must contain a valid department name, not 'Not found', 'N/A', or be empty.",
        Severity::Error,
        true,
    ),
    rule(
        "QR004",
        "Date Validity Check",
        "Effective date must be a valid date and not older than 2 years from today.",
        Severity::Warning,
        true,
    ),
    rule(
        "QR005",
        "Document Number Format",
        "Document number should follow a standard format (e.g., XXX-### or similar alphanumeric pattern).",
        Severity::Warning,
        false,
    ),
    rule(
        "QR006",
        "Revision Number Format",
        "Revision number should be in a standard format (e.g., 1.0, 2.1, Rev A, etc.).",
        Severity::Info,
        false,
    ),
    rule(
        "QR007",
        "Author Field Populated",
        "Author field must contain a person's name, not 'Not found' or generic text.",
        Severity::Error,
        true,
    ),
    // Content quality
    rule(
        "QR008",
        "Purpose Statement Quality",
        "Purpose statement must be clear, concise, and at least 20 characters long.",
        Severity::Warning,
        false,
    ),
    rule(
        "QR009",
        "Scope Statement Quality",
        "Scope statement must be specific and at least 20 characters long.",
        Severity::Warning,
        false,
    ),
    rule(
        "QR010",
        "Template Length Check",
        "Generated template must be at least 500 characters long to ensure adequate detail.",
        Severity::Error,
        false,
    ),
    // ISO compliance
    rule(
        "QR011",
        "ISO Standard Referenced",
        "Template must explicitly reference the ISO standard it complies with.",
        Severity::Error,
        false,
    ),
    rule(
        "QR012",
        "Traceability Present",
        "Template should include document control information (version, date, approval).",
        Severity::Warning,
        false,
    ),
    rule(
        "QR013",
        "Professional Language",
        "Template must use professional, formal language appropriate for ISO documentation.",
        Severity::Info,
        false,
    ),
    // Consistency
    rule(
        "QR014",
        "Field Consistency",
        "Extracted fields must be consistently used throughout the generated template.",
        Severity::Warning,
        true,
    ),
    rule(
        "QR015",
        "No Placeholder Text",
        "Template must not contain placeholder text like '[INSERT TEXT]', 'TBD', or similar.",
        Severity::Error,
        false,
    ),
];

/// Ordered, read-only collection of [`QualityRule`]s.
#[derive(Debug, Clone, Copy)]
pub struct RuleCatalog {
    rules: &'static [QualityRule],
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleCatalog {
    /// The built-in ISO documentation catalog (QR001–QR015).
    pub fn standard() -> Self {
        Self {
            rules: &STANDARD_RULES,
        }
    }

    /// Every rule, in catalog order.
    pub fn all_rules(&self) -> &[QualityRule] {
        self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules with the given severity, in catalog order.
    pub fn rules_by_severity(&self, severity: &Severity) -> Vec<&QualityRule> {
        self.rules
            .iter()
            .filter(|r| &r.severity == severity)
            .collect()
    }

    /// Rules whose failure is an error.
    pub fn critical_rules(&self) -> Vec<&QualityRule> {
        self.rules_by_severity(&Severity::Error)
    }

    /// Look a rule up by id (exact match).
    pub fn get(&self, id: &str) -> Option<&QualityRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Ids of the rules that are judged against extracted field values.
    pub fn field_specific_ids(&self) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|r| r.field_specific)
            .map(|r| r.id)
            .collect()
    }

    /// Render the catalog for embedding in a grading prompt.
    ///
    /// Each rule becomes `[id] name (SEVERITY)` followed by the indented
    /// description; rules are separated by a blank line.
    pub fn format_for_prompt(&self) -> String {
        self.rules
            .iter()
            .map(|r| {
                format!(
                    "[{}] {} ({})\n   {}",
                    r.id,
                    r.name,
                    r.severity.as_str().to_uppercase(),
                    r.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
