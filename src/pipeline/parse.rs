//! Document parsing: a local file → plain text plus metadata.
//!
//! ## Why spawn_blocking?
//!
//! pdfium wraps a C++ library with thread-local state, and DOCX extraction
//! inflates a zip archive. Both are blocking, so [`NativeParser`] moves the
//! work onto Tokio's blocking pool instead of stalling a worker thread.
//!
//! ## Formats
//!
//! | Extension | Strategy |
//! |-----------|----------|
//! | `pdf` | pdfium text layer, page by page |
//! | `docx` | `word/document.xml` paragraphs (`w:p` / `w:t`) |
//! | `txt` `md` `markdown` `csv` `json` `html` `htm` `xml` | read as UTF-8 (lossy) |
//!
//! Anything else is rejected with [`ComplianceError::UnsupportedFormat`]
//! before the file is opened.

use crate::error::ComplianceError;
use crate::output::{DocumentMetadata, ParsedDocument};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extensions read as plain UTF-8 text.
pub const TEXT_EXTENSIONS: [&str; 8] = ["txt", "md", "markdown", "csv", "json", "html", "htm", "xml"];

/// Turns a local file into text.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, path: &Path) -> Result<ParsedDocument, ComplianceError>;
}

/// How a file will be read, decided from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            e if TEXT_EXTENSIONS.contains(&e) => Some(DocumentFormat::Text),
            _ => None,
        }
    }
}

/// Lowercase extension of `filename` without the dot, or `"unknown"`.
pub fn format_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reject a file name the parser cannot handle, before any I/O.
pub fn check_supported(filename: &str) -> Result<DocumentFormat, ComplianceError> {
    let format = format_of(filename);
    DocumentFormat::from_extension(&format).ok_or_else(|| ComplianceError::UnsupportedFormat {
        filename: filename.to_string(),
        format,
    })
}

/// Built-in parser for PDF, DOCX and plain-text documents.
#[derive(Debug, Clone, Default)]
pub struct NativeParser {
    pdfium_library: Option<PathBuf>,
}

impl NativeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind pdfium from `PDFIUM_LIB_PATH` when set, else the system library.
    pub fn from_env() -> Self {
        Self {
            pdfium_library: std::env::var_os("PDFIUM_LIB_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdfium_library = Some(path.into());
        self
    }
}

#[async_trait]
impl DocumentParser for NativeParser {
    async fn parse(&self, path: &Path) -> Result<ParsedDocument, ComplianceError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = check_supported(&filename)?;

        if !path.exists() {
            return Err(ComplianceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let owned = path.to_path_buf();
        let pdfium_library = self.pdfium_library.clone();
        let (text, page_count) = tokio::task::spawn_blocking(move || match format {
            DocumentFormat::Pdf => read_pdf(&owned, pdfium_library.as_deref()),
            DocumentFormat::Docx => read_docx(&owned).map(|t| (t, None)),
            DocumentFormat::Text => read_text(&owned).map(|t| (t, None)),
        })
        .await
        .map_err(|e| ComplianceError::Internal(format!("Parse task panicked: {}", e)))??;

        info!("Parsed '{}': {} chars", filename, text.len());

        Ok(ParsedDocument {
            text,
            metadata: DocumentMetadata {
                format: format_of(&filename),
                filename,
                page_count,
            },
        })
    }
}

fn parse_error(path: &Path, detail: impl std::fmt::Display) -> ComplianceError {
    ComplianceError::DocumentParse {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

fn read_text(path: &Path) -> Result<String, ComplianceError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ComplianceError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => parse_error(path, e),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, ComplianceError> {
    let bindings = match library {
        Some(lib) => Pdfium::bind_to_library(lib),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ComplianceError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn read_pdf(path: &Path, library: Option<&Path>) -> Result<(String, Option<usize>), ComplianceError> {
    let pdfium = bind_pdfium(library)?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| parse_error(path, format!("{:?}", e)))?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    let mut texts = Vec::with_capacity(page_count);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| parse_error(path, format!("page {}: {:?}", idx + 1, e)))?;
        texts.push(text.all());
    }
    debug!("PDF '{}': {} pages", path.display(), page_count);

    Ok((texts.join("\n\n"), Some(page_count)))
}

fn read_docx(path: &Path) -> Result<String, ComplianceError> {
    let file = std::fs::File::open(path).map_err(|e| parse_error(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| parse_error(path, e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| parse_error(path, e))?
        .read_to_string(&mut xml)
        .map_err(|e| parse_error(path, e))?;

    docx_paragraphs(&xml)
        .map(|paragraphs| paragraphs.join("\n"))
        .map_err(|e| parse_error(path, e))
}

/// Text of every `w:p` paragraph in a WordprocessingML body, in order.
fn docx_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
