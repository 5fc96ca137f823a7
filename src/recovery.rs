//! Best-effort recovery of a JSON object from free-text model output.
//!
//! Models are told to answer with pure JSON, but routinely wrap it in prose
//! ("Here is the analysis: {...} Let me know if…"). Recovery strips that
//! incidental text and nothing more: take the slice from the first `{` to the
//! last `}` and parse it strictly. There is no brace balancing, no comment or
//! fence stripping, and no second attempt.
//!
//! The result is a tagged [`ParseOutcome`] so every caller must decide what
//! its own degraded value looks like when recovery fails.

use serde_json::{Map, Value};
use std::fmt;

/// Why a response could not be recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryFailure {
    /// No `{` … `}` pair in the text.
    NoObject,
    /// The brace slice is not valid JSON.
    Malformed { detail: String },
    /// The brace slice parsed to something other than an object.
    NotAnObject,
}

impl fmt::Display for RecoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryFailure::NoObject => f.write_str("no JSON object found"),
            RecoveryFailure::Malformed { detail } => write!(f, "malformed JSON: {detail}"),
            RecoveryFailure::NotAnObject => f.write_str("JSON value is not an object"),
        }
    }
}

/// Outcome of [`recover`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Recovered(Map<String, Value>),
    Unparseable(RecoveryFailure),
}

impl ParseOutcome {
    /// The recovered object, discarding the failure reason.
    pub fn into_option(self) -> Option<Map<String, Value>> {
        match self {
            ParseOutcome::Recovered(map) => Some(map),
            ParseOutcome::Unparseable(_) => None,
        }
    }
}

/// Locate the outermost brace pair in `raw` and parse it as a JSON object.
pub fn recover(raw: &str) -> ParseOutcome {
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        return ParseOutcome::Unparseable(RecoveryFailure::NoObject);
    };
    if end < start {
        return ParseOutcome::Unparseable(RecoveryFailure::NoObject);
    }

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(Value::Object(map)) => ParseOutcome::Recovered(map),
        Ok(_) => ParseOutcome::Unparseable(RecoveryFailure::NotAnObject),
        Err(e) => ParseOutcome::Unparseable(RecoveryFailure::Malformed {
            detail: e.to_string(),
        }),
    }
}

/// Shorthand for `recover(raw).into_option()`.
pub fn recover_json(raw: &str) -> Option<Map<String, Value>> {
    recover(raw).into_option()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_object() {
        let map = recover_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(Value::Object(map), json!({"a": 1}));
    }

    #[test]
    fn strips_surrounding_prose() {
        let original = json!({
            "violations": [{"rule_id": "QR001", "passed": true}],
            "recommendations": ["Add an approval block"]
        });
        let raw = format!(
            "Sure! Here is the analysis you asked for:\n{}\nLet me know if you need more.",
            serde_json::to_string_pretty(&original).unwrap()
        );
        let map = recover_json(&raw).unwrap();
        assert_eq!(Value::Object(map), original);
    }

    #[test]
    fn no_braces() {
        assert_eq!(
            recover("I could not find any fields."),
            ParseOutcome::Unparseable(RecoveryFailure::NoObject)
        );
        assert!(recover_json("").is_none());
    }

    #[test]
    fn reversed_braces() {
        assert_eq!(
            recover("} nothing here {"),
            ParseOutcome::Unparseable(RecoveryFailure::NoObject)
        );
    }

    #[test]
    fn unbalanced_braces_are_malformed() {
        let outcome = recover(r#"{"a": {"b": 1}"#);
        assert!(
            matches!(outcome, ParseOutcome::Unparseable(RecoveryFailure::Malformed { .. })),
            "got {outcome:?}"
        );
    }

    #[test]
    fn two_objects_are_not_merged() {
        // First '{' to last '}' spans both objects, which is not valid JSON.
        assert!(recover_json(r#"{"a": 1} and also {"b": 2}"#).is_none());
    }

    #[test]
    fn multibyte_prose_is_sliced_safely() {
        let map = recover_json("Résumé → {\"ok\": true} ✓").unwrap();
        assert_eq!(map["ok"], json!(true));
    }
}
