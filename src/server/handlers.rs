//! Endpoint handlers. Each one validates its transport input, calls one
//! [`ComplianceService`](crate::service::ComplianceService) operation and
//! wraps the result with `success` and `message`.

use super::error::ApiError;
use super::types::*;
use super::AppState;
use crate::pipeline::input::DocumentInput;
use crate::service::RunOptions;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::Json;
use tracing::info;

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /api/v1/quality-rules`
pub async fn quality_rules(State(state): State<AppState>) -> Json<RulesResponse> {
    let rules = state.service.catalog().all_rules().to_vec();
    Json(RulesResponse {
        total: rules.len(),
        rules,
        success: true,
    })
}

/// `POST /api/v1/parse-document`
pub async fn parse_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ParseDocumentResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    info!("parse-document: '{}' ({} bytes)", upload.filename, upload.bytes.len());
    let parsed = state.service.parse_document(upload.into_input()).await?;
    Ok(Json(parsed.into()))
}

/// `POST /api/v1/extract-fields`
pub async fn extract_fields(
    State(state): State<AppState>,
    payload: Result<Json<ExtractFieldsRequest>, JsonRejection>,
) -> Result<Json<ExtractFieldsResponse>, ApiError> {
    let Json(req) = payload?;
    let extracted_fields = state
        .service
        .extract_fields(&req.document_text, req.fields_to_extract)
        .await?;
    Ok(Json(ExtractFieldsResponse {
        extracted_fields,
        success: true,
        message: "Fields extracted successfully".into(),
    }))
}

/// `POST /api/v1/generate-iso-template`
pub async fn generate_iso_template(
    State(state): State<AppState>,
    payload: Result<Json<GenerateTemplateRequest>, JsonRejection>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let Json(req) = payload?;
    let outcome = state
        .service
        .generate_template(&req.document_type, &req.iso_standard, &req.extracted_fields)
        .await?;
    Ok(Json(TemplateResponse::from_outcome(
        outcome,
        "ISO template generated successfully",
    )))
}

/// `POST /api/v1/check-quality`
pub async fn check_quality(
    State(state): State<AppState>,
    payload: Result<Json<CheckQualityRequest>, JsonRejection>,
) -> Result<Json<QualityCheckResponse>, ApiError> {
    let Json(req) = payload?;
    let outcome = state
        .service
        .check_quality(
            &req.generated_template,
            req.extracted_fields.as_ref(),
            &req.document_type,
            &req.iso_standard,
        )
        .await?;
    Ok(Json(outcome.into()))
}

/// `POST /api/v1/process-complete`
pub async fn process_complete(
    State(state): State<AppState>,
    query: Result<Query<TargetQuery>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<TemplateResponse>, ApiError> {
    let Query(target) = query?;
    let upload = read_upload(multipart).await?;
    let options = upload.run_options(&target);
    let output = state
        .service
        .process_complete(upload.into_input(), &options)
        .await?;
    Ok(Json(output.into()))
}

/// `POST /api/v1/workflow-complete`
pub async fn workflow_complete(
    State(state): State<AppState>,
    query: Result<Query<TargetQuery>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let Query(target) = query?;
    let upload = read_upload(multipart).await?;
    let options = upload.run_options(&target);
    let output = state
        .service
        .workflow_complete(upload.into_input(), &options)
        .await?;
    Ok(Json(output.into()))
}

// ── Multipart ─────────────────────────────────────────────────────────────

struct Upload {
    filename: String,
    bytes: Vec<u8>,
    iso_standard: Option<String>,
    document_type: Option<String>,
}

impl Upload {
    /// Form fields win over query parameters; blanks fall back to defaults.
    fn run_options(&self, query: &TargetQuery) -> RunOptions {
        RunOptions::new(
            self.document_type.as_deref().or(query.document_type.as_deref()),
            self.iso_standard.as_deref().or(query.iso_standard.as_deref()),
        )
    }

    fn into_input(self) -> DocumentInput {
        DocumentInput::Upload {
            filename: self.filename,
            bytes: self.bytes,
        }
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut iso_standard = None;
    let mut document_type = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await?;
                file = Some((filename, bytes.to_vec()));
            }
            "iso_standard" => iso_standard = Some(field.text().await?),
            "document_type" => document_type = Some(field.text().await?),
            _ => {}
        }
    }

    match file {
        Some((filename, bytes)) if !filename.trim().is_empty() => Ok(Upload {
            filename,
            bytes,
            iso_standard,
            document_type,
        }),
        _ => Err(ApiError::BadRequest("No file provided".into())),
    }
}
