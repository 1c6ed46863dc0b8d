//! Structure extraction: title, headings with hierarchy, synthetic pages and
//! aggregate counts.
//!
//! Analysis never fails. Unreadable files, undecodable bytes and blank text
//! all produce [`DocumentStructure::empty`].

pub(crate) mod clean;
mod pages;
mod sections;

use std::path::Path;

use chrono::Utc;
use noa_core::config::ChunkingConfig;
use noa_core::{DocumentStructure, StructureMetadata};
use tracing::{info, warn};

use crate::document::{read_source, FileKind, TextExtractor};

pub const DEFAULT_CHARS_PER_PAGE: usize = 3000;

pub struct StructureExtractor {
    extractor: TextExtractor,
    chars_per_page: usize,
}

impl StructureExtractor {
    pub fn new(extractor: TextExtractor, chars_per_page: usize) -> Self {
        Self {
            extractor,
            chars_per_page: chars_per_page.max(1),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(TextExtractor::default(), config.chars_per_page)
    }

    pub fn chars_per_page(&self) -> usize {
        self.chars_per_page
    }

    /// Analyze a file. The extension picks the extraction path; anything that
    /// is not PDF or Word is read as plain text.
    pub fn analyze(&self, path: &Path) -> DocumentStructure {
        let title = display_name(path);
        let kind = match FileKind::from_path(path) {
            Ok(kind) if kind.is_binary() => kind,
            _ => FileKind::Text,
        };

        match read_source(path) {
            Ok(bytes) => self.analyze_bytes(&bytes, kind, &title),
            Err(e) => {
                warn!(error = %e, "structure analysis skipped");
                DocumentStructure::empty(title)
            }
        }
    }

    pub fn analyze_bytes(&self, bytes: &[u8], kind: FileKind, title: &str) -> DocumentStructure {
        let text = self.extractor.extract_bytes(bytes, kind);
        self.analyze_text(&text, title)
    }

    /// Build the structure of already-extracted text.
    pub fn analyze_text(&self, text: &str, title: &str) -> DocumentStructure {
        if text.trim().is_empty() {
            warn!(title, "empty content, returning empty structure");
            return DocumentStructure::empty(title);
        }

        let stripped = clean::strip_control_chars(text);
        let collapsed = clean::collapse_whitespace(&stripped);
        if collapsed.is_empty() {
            warn!(title, "no printable content, returning empty structure");
            return DocumentStructure::empty(title);
        }

        let character_count = collapsed.chars().count();
        let total_pages = pages::estimate_pages(character_count, self.chars_per_page);
        let lines = clean::clean_lines(&stripped);
        let sections = sections::detect_sections(&lines, total_pages);
        let now = Utc::now();

        info!(
            title,
            sections = sections.len(),
            total_pages,
            characters = character_count,
            "document structure extracted"
        );

        DocumentStructure {
            title: title.to_string(),
            sections,
            pages: pages::paginate(&collapsed, self.chars_per_page),
            total_pages,
            metadata: StructureMetadata {
                word_count: collapsed.split_whitespace().count(),
                character_count,
                created_at: now,
                modified_at: now,
                error: None,
            },
        }
    }
}

impl Default for StructureExtractor {
    fn default() -> Self {
        Self::new(TextExtractor::default(), DEFAULT_CHARS_PER_PAGE)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Analyze a file with the default extractor and page size.
pub fn build_structure(path: &Path) -> DocumentStructure {
    StructureExtractor::default().analyze(path)
}
