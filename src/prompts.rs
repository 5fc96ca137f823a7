//! Prompt construction for the three LLM tasks.
//!
//! Centralising every prompt here keeps the wording in one place and lets
//! unit tests inspect prompts directly without a live model.
//!
//! Every builder is a pure function: identical inputs give identical text,
//! nothing here touches the network, and "today" is passed in rather than
//! read from the clock. Each prompt ends with a strict output-format example
//! because the only guarantee we get back is free text (see
//! [`crate::recovery`]).

use crate::output::FieldMap;
use crate::rules::RuleCatalog;
use chrono::NaiveDate;

/// Characters of document text sent to the model for field extraction.
///
/// Longer documents are cut silently; there is no chunking.
pub const EXTRACTION_CHAR_BUDGET: usize = 3000;

/// Field names extracted when the caller does not choose any.
pub const DEFAULT_FIELDS: [&str; 8] = [
    "document_title",
    "document_number",
    "revision_number",
    "effective_date",
    "department",
    "author",
    "purpose",
    "scope",
];

/// `DEFAULT_FIELDS` as owned strings.
pub fn default_fields() -> Vec<String> {
    DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
}

const NO_FIELDS_FOR_TEMPLATE: &str = "(No fields provided - template will use generic placeholders)";

const NO_FIELDS_FOR_GRADING: &str =
    "(No extracted fields provided - field-specific validation will be limited)";

/// First `budget` characters of `text`, never splitting a character.
fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn render_fields(fields: &FieldMap) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("- {k}: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking the model to pull `field_names` out of `document_text`.
pub fn build_extraction_prompt(document_text: &str, field_names: &[String]) -> String {
    let fields_list = field_names
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an expert at extracting structured information from documents.

Given the following document text, extract the requested fields. If a field is not found in the document, indicate "Not found".

Document text:
{text}

Extract the following fields:
{fields_list}

Provide your response as a JSON object with this exact format:
{{
  "field_name": {{
    "value": "extracted value or 'Not found'",
    "confidence": 0.95
  }}
}}

Response:"#,
        text = truncate_chars(document_text, EXTRACTION_CHAR_BUDGET),
    )
}

/// Prompt asking the model to draft a `document_type` template for
/// `iso_standard`, populated from `fields`.
///
/// An empty map is allowed and switches the model to generic placeholders.
pub fn build_template_prompt(document_type: &str, iso_standard: &str, fields: &FieldMap) -> String {
    let fields_text = if fields.is_empty() {
        NO_FIELDS_FOR_TEMPLATE.to_string()
    } else {
        render_fields(fields)
    };

    format!(
        r#"You are an expert in creating ISO compliant documentation.

Generate a complete {document_type} template following the {iso_standard} standard.

Use the following extracted information to populate the template:
{fields_text}

The template should include:
1. Document header with document number, revision, date
2. Purpose and scope section
3. Definitions and references
4. Procedure or record structure appropriate for {document_type}
5. Responsibilities section
6. Related documents section
7. Revision history section

Create a professional, well-formatted document template that complies with {iso_standard} requirements.

Template:"#
    )
}

/// Inputs to [`build_grading_prompt`].
#[derive(Debug, Clone, Copy)]
pub struct GradingPromptInput<'a> {
    pub template: &'a str,
    /// `None` and an empty map are treated alike.
    pub fields: Option<&'a FieldMap>,
    pub document_type: &'a str,
    pub iso_standard: &'a str,
    pub catalog: &'a RuleCatalog,
    /// Reference date for the staleness check.
    pub today: NaiveDate,
}

/// Prompt asking the model to judge a template against every catalog rule.
pub fn build_grading_prompt(input: &GradingPromptInput<'_>) -> String {
    let fields = input.fields.filter(|f| !f.is_empty());
    let fields_text = match fields {
        Some(f) => render_fields(f),
        None => NO_FIELDS_FOR_GRADING.to_string(),
    };
    let limited_note = match fields {
        Some(_) => String::new(),
        None => format!(
            "NOTE: Since no extracted fields were provided, focus primarily on structural and content quality rules. Field-specific rules ({}) should be evaluated based only on what appears in the template itself.",
            input.catalog.field_specific_ids().join(", ")
        ),
    };

    format!(
        r#"You are a quality assurance expert specializing in ISO documentation.

Analyze the following generated ISO document template against the provided quality rules.

DOCUMENT INFORMATION:
- Document Type: {document_type}
- ISO Standard: {iso_standard}

EXTRACTED FIELDS:
{fields_text}

GENERATED TEMPLATE:
{template}

QUALITY RULES TO CHECK:
{rules}

For each rule, evaluate whether the template passes or fails. Pay special attention to:
- Department field being "Not found", "N/A", empty, or containing generic text
- Dates older than 2 years from today's date ({today})
- Missing required fields or sections
- Placeholder text or incomplete content

{limited_note}

Provide your analysis in the following JSON format:
{{
  "violations": [
    {{
      "rule_id": "QR001",
      "rule_name": "Rule Name",
      "severity": "error",
      "description": "What this rule checks",
      "violation_details": "Specific details of what failed or passed",
      "passed": false
    }}
  ],
  "recommendations": [
    "Specific recommendation 1",
    "Specific recommendation 2"
  ]
}}

Return ONLY the JSON object, no additional text."#,
        document_type = input.document_type,
        iso_standard = input.iso_standard,
        template = input.template,
        rules = input.catalog.format_for_prompt(),
        today = input.today.format("%Y-%m-%d"),
    )
}
