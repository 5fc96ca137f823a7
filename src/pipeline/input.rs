//! Input resolution: normalise a path, URL or uploaded bytes to a local file.
//!
//! The parser needs a file-system path (pdfium cannot read from a buffer).
//! Downloads and uploads are written into a `TempDir` under their original
//! file name, so the parser sees the right extension and metadata, and the
//! directory is removed when the [`ResolvedInput`] is dropped.

use crate::error::ComplianceError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// A document handed to the pipeline.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    /// Local file path or HTTP(S) URL.
    Location(String),
    /// In-memory upload with its client-side file name.
    Upload { filename: String, bytes: Vec<u8> },
}

impl DocumentInput {
    /// Name reported as the source document.
    pub fn display_name(&self) -> String {
        match self {
            DocumentInput::Location(s) => Path::new(s)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| s.clone()),
            DocumentInput::Upload { filename, .. } => filename.clone(),
        }
    }
}

/// The resolved input: either a local path or a file inside a temp directory.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was downloaded or uploaded. The `TempDir` keeps the file alive
    /// until processing completes.
    Temporary { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path of the document regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Temporary { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve any [`DocumentInput`] to a readable local file.
pub async fn resolve(input: DocumentInput, timeout_secs: u64) -> Result<ResolvedInput, ComplianceError> {
    match input {
        DocumentInput::Location(s) => resolve_input(&s, timeout_secs).await,
        DocumentInput::Upload { filename, bytes } => stage_upload(&filename, &bytes).await,
    }
}

/// Resolve a path or URL to a local file path.
///
/// URLs are downloaded to a temporary directory; local files are checked for
/// existence and read permission.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ComplianceError> {
    if input.trim().is_empty() {
        return Err(ComplianceError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, ComplianceError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ComplianceError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ComplianceError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ComplianceError::FileNotFound { path });
        }
    }

    debug!("Resolved local document: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Write uploaded bytes into a fresh temp directory under `filename`.
pub async fn stage_upload(filename: &str, bytes: &[u8]) -> Result<ResolvedInput, ComplianceError> {
    let name = safe_file_name(filename).ok_or_else(|| {
        ComplianceError::InvalidRequest(format!("Invalid upload file name '{filename}'"))
    })?;

    let temp_dir = TempDir::new().map_err(|e| ComplianceError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(name);
    tokio::fs::write(&file_path, bytes)
        .await
        .map_err(|e| ComplianceError::Internal(format!("Failed to stage upload: {}", e)))?;

    debug!("Staged upload '{}' ({} bytes)", filename, bytes.len());
    Ok(ResolvedInput::Temporary {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path component of a client-supplied name, without directories.
fn safe_file_name(filename: &str) -> Option<String> {
    let last = filename.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        None
    } else {
        Some(last.to_string())
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ComplianceError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ComplianceError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ComplianceError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ComplianceError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ComplianceError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ComplianceError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let resolved = stage_upload(&filename, &bytes).await?;
    info!("Downloaded to: {}", resolved.path().display());
    Ok(resolved)
}

/// Last URL path segment when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.docx"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_path() {
        assert_eq!(filename_from_url("https://example.com/a/sop-001.docx"), "sop-001.docx");
        assert_eq!(filename_from_url("https://example.com/download"), "downloaded.pdf");
    }

    #[test]
    fn upload_names_are_stripped_of_directories() {
        assert_eq!(safe_file_name("../../etc/passwd.txt").as_deref(), Some("passwd.txt"));
        assert_eq!(safe_file_name("C:\\Users\\qa\\record.docx").as_deref(), Some("record.docx"));
        assert_eq!(safe_file_name("dir/"), None);
        assert_eq!(safe_file_name(".."), None);
    }

    #[test]
    fn display_name() {
        assert_eq!(DocumentInput::Location("/data/sop.pdf".into()).display_name(), "sop.pdf");
        let upload = DocumentInput::Upload {
            filename: "record.txt".into(),
            bytes: Vec::new(),
        };
        assert_eq!(upload.display_name(), "record.txt");
    }

    #[tokio::test]
    async fn staged_upload_is_removed_on_drop() {
        let resolved = stage_upload("notes.txt", b"Department: QA").await.unwrap();
        let path = resolved.path().to_path_buf();
        assert_eq!(path.file_name().unwrap(), "notes.txt");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Department: QA");
        drop(resolved);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_local_file() {
        let err = resolve_input("/no/such/file.pdf", 5).await.unwrap_err();
        assert!(matches!(err, ComplianceError::FileNotFound { .. }));
        let err = resolve_input("  ", 5).await.unwrap_err();
        assert!(matches!(err, ComplianceError::InvalidInput { .. }));
    }
}
