//! Text extraction with per-format fallback strategies.
//!
//! Every supported [`FileKind`] has an ordered list of strategies in an
//! [`ExtractorRegistry`]. Strategies are tried in priority order and the first
//! one producing non-blank text wins; failures are logged and skipped. Only an
//! unsupported file kind is reported as an error.

mod docx;
mod encoding;
mod pdf;
mod strategy;

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

pub use docx::{DocxRsStrategy, DocxXmlStrategy};
pub use encoding::{PlainTextStrategy, RawBytesStrategy, TextEncoding};
pub use pdf::{LopdfStrategy, PdfExtractStrategy};
pub use strategy::{ExtractionStrategy, ExtractorRegistry, StrategyError};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read a source file. Callers log the error and carry on with no text.
pub fn read_source(path: &Path) -> Result<Vec<u8>, ExtractionError> {
    std::fs::read(path).map_err(|source| ExtractionError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Declared type of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Pdf,
    Docx,
    /// Legacy binary Word document.
    Doc,
    Text,
    Markdown,
}

impl FileKind {
    /// Parse a type label: an extension (`"pdf"`, `".docx"`) or a MIME type.
    pub fn from_label(label: &str) -> Result<Self, ExtractionError> {
        let normalized = label.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "pdf" | "application/pdf" => Ok(FileKind::Pdf),
            "docx"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Ok(FileKind::Docx)
            }
            "doc" | "application/msword" => Ok(FileKind::Doc),
            "txt" | "text" | "text/plain" => Ok(FileKind::Text),
            "md" | "markdown" | "text/markdown" => Ok(FileKind::Markdown),
            _ => Err(ExtractionError::UnsupportedFormat(label.to_string())),
        }
    }

    /// Infer the kind from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_label(ext).map_err(|_| {
            ExtractionError::UnsupportedFormat(if ext.is_empty() {
                path.display().to_string()
            } else {
                ext.to_string()
            })
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Doc => "doc",
            FileKind::Text => "txt",
            FileKind::Markdown => "md",
        }
    }

    /// Binary container formats; these get the raw-bytes last resort.
    pub fn is_binary(&self) -> bool {
        matches!(self, FileKind::Pdf | FileKind::Docx | FileKind::Doc)
    }
}

/// Extracts raw text from files using a registry of strategies.
pub struct TextExtractor {
    registry: ExtractorRegistry,
}

impl TextExtractor {
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Extract text from a file with a declared type label.
    ///
    /// An unreadable file yields `""`; only an unsupported label is an error.
    pub fn extract(&self, path: &Path, declared_type: &str) -> Result<String, ExtractionError> {
        let kind = FileKind::from_label(declared_type)?;
        Ok(self.extract_kind(path, kind))
    }

    pub fn extract_kind(&self, path: &Path, kind: FileKind) -> String {
        match read_source(path) {
            Ok(bytes) => {
                let text = self.extract_bytes(&bytes, kind);
                info!(
                    path = %path.display(),
                    kind = kind.as_str(),
                    chars = text.len(),
                    "text extracted"
                );
                text
            }
            Err(e) => {
                warn!(error = %e, "no text extracted");
                String::new()
            }
        }
    }

    pub fn extract_bytes(&self, bytes: &[u8], kind: FileKind) -> String {
        self.registry.extract(bytes, kind)
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(ExtractorRegistry::with_defaults())
    }
}

/// Extract text from a file, inferring its kind from the extension.
pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let kind = FileKind::from_path(path)?;
    Ok(TextExtractor::default().extract_kind(path, kind))
}

/// Extract text from in-memory bytes of a known kind.
pub fn extract_text_from_bytes(bytes: &[u8], kind: FileKind) -> String {
    TextExtractor::default().extract_bytes(bytes, kind)
}
