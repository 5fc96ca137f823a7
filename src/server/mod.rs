//! HTTP API over [`ComplianceService`] (feature `server`).
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET  | `/health` | liveness and version |
//! | GET  | `/api/v1/quality-rules` | rule catalog |
//! | POST | `/api/v1/parse-document` | multipart `file` → text + metadata |
//! | POST | `/api/v1/extract-fields` | JSON text → extracted fields |
//! | POST | `/api/v1/generate-iso-template` | JSON field map → template |
//! | POST | `/api/v1/check-quality` | JSON template → graded report |
//! | POST | `/api/v1/process-complete` | multipart upload → template |
//! | POST | `/api/v1/workflow-complete` | multipart upload → template + report |

pub mod error;
pub mod handlers;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::build_router;

use crate::service::ComplianceService;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Default request body limit: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ComplianceService>,
}

/// Bind `addr` and serve `app` until Ctrl-C.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
}
