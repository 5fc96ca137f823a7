//! Service-level tests with a scripted model.
//!
//! No network: every model call is answered from a queue of canned replies,
//! and every prompt is recorded so tests can assert how many calls were made.

use async_trait::async_trait;
use compliance_master::{
    Archive, ComplianceError, ComplianceService, DocumentInput, FieldMap, Grade, NativeParser,
    PipelineProgressCallback, PipelineStep, RunOptions, TextGenerator,
};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Some(r.to_string())).collect()),
            prompts: Mutex::default(),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, i: usize) -> String {
        self.prompts.lock().unwrap()[i].clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ComplianceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.replies.lock().unwrap().pop_front().flatten())
    }
}

/// A model whose transport always fails.
struct Unreachable;

#[async_trait]
impl TextGenerator for Unreachable {
    async fn generate(&self, _prompt: &str) -> Result<Option<String>, ComplianceError> {
        Err(ComplianceError::LlmApiError {
            message: "connection refused".into(),
        })
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl PipelineProgressCallback for Recorder {
    fn on_pipeline_start(&self, total_steps: usize) {
        self.0.lock().unwrap().push(format!("start:{total_steps}"));
    }
    fn on_step_start(&self, step: PipelineStep) {
        self.0.lock().unwrap().push(format!("begin:{step:?}"));
    }
    fn on_step_complete(&self, step: PipelineStep) {
        self.0.lock().unwrap().push(format!("done:{step:?}"));
    }
    fn on_step_error(&self, step: PipelineStep, _error: &str) {
        self.0.lock().unwrap().push(format!("error:{step:?}"));
    }
    fn on_pipeline_complete(&self) {
        self.0.lock().unwrap().push("complete".into());
    }
}

fn service(model: &Arc<ScriptedModel>) -> ComplianceService {
    ComplianceService::new(model.clone(), Arc::new(NativeParser::new()))
}

fn upload(name: &str, text: &str) -> DocumentInput {
    DocumentInput::Upload {
        filename: name.into(),
        bytes: text.as_bytes().to_vec(),
    }
}

const RECORD: &str = "Calibration record CR-2291\n\
    Performed by: Dana Whitfield\n\
    Date: 2024-03-14\n\
    Department: Metrology\n";

const EXTRACTION: &str = r#"Here you go:
{
  "document_title": {"value": "Calibration record CR-2291", "confidence": 0.92},
  "date": {"value": "2024-03-14", "confidence": 0.88},
  "author": "Dana Whitfield",
  "department": {"value": null, "confidence": 0.1}
}"#;

const TEMPLATE: &str = "  # Calibration Record\n\nDocument: CR-2291\nAuthor: Dana Whitfield\n";

const GRADING: &str = r#"```json
{
  "violations": [
    {"rule_id": "QR001", "rule_name": "Required Fields Present", "severity": "error", "description": "", "violation_details": "", "passed": true},
    {"rule_id": "QR004", "rule_name": "Date Validity Check", "severity": "error", "description": "", "violation_details": "", "passed": true},
    {"rule_id": "QR008", "severity": "warning", "violation_details": "Purpose is one word", "passed": false}
  ],
  "recommendations": ["Expand the purpose statement", 42]
}
```"#;

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn blank_document_text_is_rejected_without_a_model_call() {
    let model = ScriptedModel::new(&[]);
    let err = service(&model)
        .extract_fields("   \n", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ComplianceError::InvalidRequest(_)));
    assert_eq!(err.to_string(), "Document text cannot be empty");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn empty_field_list_returns_nothing_without_a_model_call() {
    let model = ScriptedModel::new(&[]);
    let fields = service(&model)
        .extract_fields(RECORD, Some(Vec::new()))
        .await
        .unwrap();

    assert!(fields.is_empty());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn empty_field_map_is_rejected_before_generation() {
    let model = ScriptedModel::new(&[]);
    let err = service(&model)
        .generate_template("calibration_record", "ISO 9001:2015", &FieldMap::new())
        .await
        .unwrap_err();

    assert!(err.is_client_error());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn blank_template_is_rejected_before_grading() {
    let model = ScriptedModel::new(&[]);
    let err = service(&model)
        .check_quality(" ", None, "calibration_record", "ISO 9001:2015")
        .await
        .unwrap_err();

    assert!(matches!(err, ComplianceError::InvalidRequest(_)));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn unsupported_upload_fails_before_any_model_call() {
    let model = ScriptedModel::new(&[]);
    let err = service(&model)
        .workflow_complete(upload("payload.exe", "MZ"), &RunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ComplianceError::UnsupportedFormat { .. }));
    assert_eq!(model.calls(), 0);
}

// ── Single operations ────────────────────────────────────────────────────────

#[tokio::test]
async fn extraction_degrades_per_field() {
    let model = ScriptedModel::new(&[EXTRACTION]);
    let names = ["document_title", "author", "department", "version"]
        .map(String::from)
        .to_vec();
    let fields = service(&model)
        .extract_fields(RECORD, Some(names))
        .await
        .unwrap();

    let summary: Vec<(&str, &str, f64)> = fields
        .iter()
        .map(|f| (f.field_name.as_str(), f.value.as_str(), f.confidence))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("document_title", "Calibration record CR-2291", 0.92),
            ("author", "Dana Whitfield", 0.7),
            ("department", "Not found", 0.1),
            ("version", "Not found", 0.5),
        ]
    );
    assert!(model.prompt(0).contains("version"));
}

#[tokio::test]
async fn unparseable_extraction_marks_every_field_failed() {
    let model = ScriptedModel::new(&["I could not read that document."]);
    let fields = service(&model)
        .extract_fields(RECORD, Some(vec!["author".into(), "date".into()]))
        .await
        .unwrap();

    assert_eq!(fields.len(), 2);
    assert!(fields
        .iter()
        .all(|f| f.value == "Error: Could not extract" && f.confidence == 0.0));
}

#[tokio::test]
async fn generated_template_is_trimmed_and_archived() {
    let dir = tempfile::tempdir().unwrap();
    let archive = Archive::new(dir.path().join("outputs"), dir.path().join("quality_checks"));
    let model = ScriptedModel::new(&[TEMPLATE]);
    let svc = service(&model).with_archive(Some(archive));

    let mut fields = FieldMap::new();
    fields.insert("document_title".into(), "Calibration record CR-2291".into());
    let outcome = svc
        .generate_template("calibration_record", "ISO 9001:2015", &fields)
        .await
        .unwrap();

    assert!(outcome.template.text.starts_with("# Calibration Record"));
    assert_eq!(outcome.template.document_type, "calibration_record");

    let saved = outcome.saved_file_path.expect("archive path");
    let name = std::path::Path::new(&saved).file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("iso_template_calibration_record_"), "{name}");
    assert!(name.ends_with(".json"));

    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(record["extracted_fields"]["document_title"], "Calibration record CR-2291");
    assert_eq!(record["iso_standard"], "ISO 9001:2015");
}

#[tokio::test]
async fn quality_check_scores_locally() {
    let model = ScriptedModel::new(&[GRADING]);
    let outcome = service(&model)
        .check_quality(TEMPLATE, None, "calibration_record", "ISO 9001:2015")
        .await
        .unwrap();
    let report = outcome.report;

    // 20 of 25 weighted points.
    assert!((report.overall_score - 80.0).abs() < 1e-9);
    assert_eq!(report.grade, Grade::B);
    assert_eq!(report.total_rules_checked, 3);
    assert_eq!(report.rules_passed, 2);
    assert_eq!(report.rules_failed, 1);
    assert_eq!(report.recommendations, vec!["Expand the purpose statement".to_string()]);
    // Missing name backfilled from the catalog.
    assert_eq!(report.violations[2].rule_name, "Purpose Statement Quality");
    assert!(outcome.saved_file_path.is_none());
}

#[tokio::test]
async fn silent_grader_degrades_to_a_review_note() {
    let model = Arc::new(ScriptedModel::default());
    let report = service(&model)
        .check_quality(TEMPLATE, None, "calibration_record", "ISO 9001:2015")
        .await
        .unwrap()
        .report;

    assert_eq!(model.calls(), 1);
    assert!(report.violations.is_empty());
    assert_eq!(
        report.recommendations,
        vec!["LLM returned empty response. Please try again.".to_string()]
    );
}

// ── Combined operations ──────────────────────────────────────────────────────

#[tokio::test]
async fn workflow_chains_all_four_steps() {
    let model = ScriptedModel::new(&[EXTRACTION, TEMPLATE, GRADING]);
    let recorder = Arc::new(Recorder::default());
    let svc = service(&model).with_progress(recorder.clone());

    let options = RunOptions::new(Some("calibration_record"), None);
    let out = svc
        .workflow_complete(upload("cr-2291.txt", RECORD), &options)
        .await
        .unwrap();

    assert_eq!(model.calls(), 3);
    assert_eq!(out.source_document, "cr-2291.txt");
    assert_eq!(out.document_metadata.format, "txt");
    assert!(out.extracted_text.contains("Dana Whitfield"));
    assert_eq!(out.extracted_fields["author"], "Dana Whitfield");
    assert_eq!(out.extracted_fields["revision_number"], "Not found");
    assert_eq!(out.template.iso_standard, "ISO 9001:2015");
    assert_eq!(out.quality.grade, Grade::B);
    assert!(out.saved_file_path.is_none());

    // The generation prompt carries the extracted values.
    assert!(model.prompt(1).contains("Dana Whitfield"));
    // The grading prompt carries the generated template.
    assert!(model.prompt(2).contains("# Calibration Record"));

    assert_eq!(
        *recorder.0.lock().unwrap(),
        vec![
            "start:4",
            "begin:Parse",
            "done:Parse",
            "begin:Extract",
            "done:Extract",
            "begin:Generate",
            "done:Generate",
            "begin:Grade",
            "done:Grade",
            "complete",
        ]
    );
}

#[tokio::test]
async fn process_complete_stops_after_generation() {
    let dir = tempfile::tempdir().unwrap();
    let archive = Archive::new(dir.path().join("outputs"), dir.path().join("quality_checks"));
    let model = ScriptedModel::new(&[EXTRACTION, TEMPLATE]);
    let svc = service(&model).with_archive(Some(archive));

    let out = svc
        .process_complete(upload("cr-2291.md", RECORD), &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(model.calls(), 2);
    assert_eq!(out.template.document_type, "quality_system_record");
    let saved = out.saved_file_path.expect("archive path");
    assert!(saved.contains("complete_pipeline_quality_system_record_"), "{saved}");
    assert!(!dir.path().join("quality_checks").exists());
}

#[tokio::test]
async fn failed_step_is_reported_and_stops_the_run() {
    let model = ScriptedModel::new(&[]);
    let recorder = Arc::new(Recorder::default());
    let svc = service(&model).with_progress(recorder.clone());

    let err = svc
        .workflow_complete(
            DocumentInput::Location("/nonexistent/record.txt".into()),
            &RunOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ComplianceError::FileNotFound { .. }));
    assert_eq!(model.calls(), 0);
    assert_eq!(
        *recorder.0.lock().unwrap(),
        vec!["start:4", "begin:Parse", "error:Parse"]
    );
}

#[tokio::test]
async fn workflow_grades_the_unwrapped_template() {
    let wrapped = r##"{"template": "# Nested Record\n\nAuthor: Dana Whitfield"}"##;
    let model = ScriptedModel::new(&[EXTRACTION, wrapped, GRADING]);

    let out = service(&model)
        .workflow_complete(upload("cr-2291.txt", RECORD), &RunOptions::default())
        .await
        .unwrap();

    // The returned template is what the model said; grading sees the body.
    assert_eq!(out.template.text, wrapped);
    let grading_prompt = model.prompt(2);
    assert!(grading_prompt.contains("# Nested Record"));
    assert!(!grading_prompt.contains(r#"{"template""#));
}

// ── Transport failures ───────────────────────────────────────────────────────

fn unreachable_service() -> ComplianceService {
    ComplianceService::new(Arc::new(Unreachable), Arc::new(NativeParser::new()))
}

fn is_transport_failure(err: &ComplianceError) -> bool {
    matches!(err, ComplianceError::LlmApiError { message } if message == "connection refused")
}

#[tokio::test]
async fn transport_failure_propagates_from_every_step() {
    let svc = unreachable_service();

    let err = svc.extract_fields(RECORD, None).await.unwrap_err();
    assert!(is_transport_failure(&err), "{err}");

    let mut fields = FieldMap::new();
    fields.insert("author".into(), "Dana Whitfield".into());
    let err = svc
        .generate_template("calibration_record", "ISO 9001:2015", &fields)
        .await
        .unwrap_err();
    assert!(is_transport_failure(&err), "{err}");

    let err = svc
        .check_quality(TEMPLATE, Some(&fields), "calibration_record", "ISO 9001:2015")
        .await
        .unwrap_err();
    assert!(is_transport_failure(&err), "{err}");
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn transport_failure_stops_the_workflow_at_extraction() {
    let recorder = Arc::new(Recorder::default());
    let svc = unreachable_service().with_progress(recorder.clone());

    let err = svc
        .workflow_complete(upload("cr-2291.txt", RECORD), &RunOptions::default())
        .await
        .unwrap_err();

    assert!(is_transport_failure(&err), "{err}");
    assert_eq!(
        *recorder.0.lock().unwrap(),
        vec!["start:4", "begin:Parse", "done:Parse", "begin:Extract", "error:Extract"]
    );
}
