//! Error types for the compliance-master library.
//!
//! A single fatal error type, [`ComplianceError`], covers everything that
//! stops an operation: bad caller input, an unreadable document, an
//! unreachable LLM. It is deliberately *not* used for malformed model output.
//! A confused model degrades data quality, not availability: the pipeline
//! steps recover such responses locally into "Not found" fields or an
//! explanatory recommendation, and those results still succeed.
//!
//! Variants fall into three families, which the transport layer maps onto
//! HTTP status classes via [`ComplianceError::is_client_error`]:
//!
//! * **Client input**: rejected before any LLM call (4xx).
//! * **Collaborator**: document parser or LLM failed (5xx, logged).
//! * **Local**: archival I/O, configuration, internal invariants.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the compliance-master library.
#[derive(Debug, Error)]
pub enum ComplianceError {
    // ── Client input errors ───────────────────────────────────────────────
    /// Request payload failed validation (blank text, empty field map, …).
    #[error("{0}")]
    InvalidRequest(String),

    /// The document's extension is not one the parser understands.
    #[error("Unsupported document format '{format}' for '{filename}'")]
    UnsupportedFormat { filename: String, format: String },

    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    // ── Document collaborator errors ──────────────────────────────────────
    /// The parser opened the file but could not extract its text.
    #[error("Failed to parse document '{path}': {detail}")]
    DocumentParse { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library for PDF text extraction.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── LLM collaborator errors ───────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API call itself failed (transport, auth, quota).
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an archived JSON report.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ComplianceError {
    /// `true` when the caller sent something the pipeline refuses to process.
    ///
    /// These are raised before any LLM call and map to a 4xx response.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ComplianceError::InvalidRequest(_)
                | ComplianceError::UnsupportedFormat { .. }
                | ComplianceError::FileNotFound { .. }
                | ComplianceError::PermissionDenied { .. }
                | ComplianceError::InvalidInput { .. }
        )
    }
}
