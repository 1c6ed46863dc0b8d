use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message attached to the empty structure when analysis could not run.
pub const EMPTY_STRUCTURE_ERROR: &str = "could not extract document structure";

/// Lightweight structural model of one uploaded document.
///
/// Always well-formed: `total_pages >= 1` and `sections` may be empty but is
/// never absent. Failed analyses produce [`DocumentStructure::empty`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentStructure {
    pub title: String,
    pub sections: Vec<Section>,
    pub pages: Vec<PageSlice>,
    pub total_pages: usize,
    pub metadata: StructureMetadata,
}

impl DocumentStructure {
    /// The deterministic sentinel returned for every analysis failure.
    pub fn empty(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            sections: Vec::new(),
            pages: Vec::new(),
            total_pages: 1,
            metadata: StructureMetadata {
                word_count: 0,
                character_count: 0,
                created_at: now,
                modified_at: now,
                error: Some(EMPTY_STRUCTURE_ERROR.to_string()),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.error.is_some()
    }
}

/// A detected heading with its place in the hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub title: String,
    /// Heading depth, 1 = top level.
    pub level: usize,
    /// 1-based line in the cleaned text.
    pub line_number: usize,
    pub estimated_page: usize,
    /// Line-based position, 0..=100 with two decimals.
    pub position_percentage: f64,
    /// Title of the nearest enclosing section, `""` at the top level.
    pub parent_section: String,
}

/// Fixed-size character window of the cleaned text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSlice {
    pub page_number: usize,
    pub start_char: usize,
    pub end_char: usize,
    pub content_preview: String,
    pub paragraphs_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureMetadata {
    pub word_count: usize,
    pub character_count: usize,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
