//! Field extraction: document text → one [`ExtractedField`] per requested name.
//!
//! The model is asked for `{"field": {"value": …, "confidence": …}}` but the
//! answer is taken as whatever it is. Each requested field is resolved
//! independently from the recovered object, so one odd entry never costs the
//! others. Only a transport failure propagates.

use crate::error::ComplianceError;
use crate::output::{ExtractedField, NOT_FOUND};
use crate::pipeline::llm::TextGenerator;
use crate::prompts::build_extraction_prompt;
use crate::recovery::{self, ParseOutcome};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Ask the model for `field_names` and normalise its answer.
///
/// The result always holds exactly one entry per requested name, in request
/// order.
pub async fn extract_fields(
    generator: &dyn TextGenerator,
    document_text: &str,
    field_names: &[String],
) -> Result<Vec<ExtractedField>, ComplianceError> {
    let prompt = build_extraction_prompt(document_text, field_names);
    debug!("Extraction prompt: {} chars, {} fields", prompt.len(), field_names.len());

    let Some(raw) = generator.generate(&prompt).await? else {
        warn!("Extraction: model returned no content");
        return Ok(field_names.iter().map(ExtractedField::failed).collect());
    };

    match recovery::recover(&raw) {
        ParseOutcome::Recovered(map) => {
            let fields: Vec<_> = field_names
                .iter()
                .map(|name| resolve_field(name, &map))
                .collect();
            let found = fields.iter().filter(|f| !f.is_missing()).count();
            info!("Extraction: {}/{} fields found", found, fields.len());
            Ok(fields)
        }
        ParseOutcome::Unparseable(reason) => {
            warn!("Extraction: could not recover model output ({})", reason);
            Ok(field_names.iter().map(ExtractedField::failed).collect())
        }
    }
}

fn resolve_field(name: &str, map: &Map<String, Value>) -> ExtractedField {
    match map.get(name) {
        None => ExtractedField::not_found(name),
        Some(Value::Object(entry)) => {
            let value = match entry.get("value") {
                None | Some(Value::Null) => NOT_FOUND.to_string(),
                Some(v) => stringify(v),
            };
            let confidence = entry
                .get("confidence")
                .and_then(Value::as_f64)
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or(ExtractedField::DEFAULT_CONFIDENCE);
            ExtractedField::new(name, value, confidence)
        }
        Some(raw) => {
            let value = if is_falsy(raw) {
                NOT_FOUND.to_string()
            } else {
                stringify(raw)
            };
            ExtractedField::new(name, value, ExtractedField::RAW_VALUE_CONFIDENCE)
        }
    }
}

/// Strings pass through unquoted; everything else uses its JSON form.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
