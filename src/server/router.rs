//! HTTP router.
//!
//! Returns a composable `Router` with every endpoint mounted; the binary
//! binds it with [`super::serve`] and tests drive it with `oneshot`.

use super::handlers;
use super::AppState;
use crate::service::ComplianceService;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the API router over a shared service.
///
/// `max_upload_bytes` caps every request body, multipart uploads included.
pub fn build_router(service: Arc<ComplianceService>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/quality-rules", get(handlers::quality_rules))
        .route("/api/v1/parse-document", post(handlers::parse_document))
        .route("/api/v1/extract-fields", post(handlers::extract_fields))
        .route(
            "/api/v1/generate-iso-template",
            post(handlers::generate_iso_template),
        )
        .route("/api/v1/check-quality", post(handlers::check_quality))
        .route("/api/v1/process-complete", post(handlers::process_complete))
        .route("/api/v1/workflow-complete", post(handlers::workflow_complete))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}
