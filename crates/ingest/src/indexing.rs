//! Hand-off of a chunked document to the vector-store collaborator.
//!
//! The batch carries per-chunk provenance (`file`, `sanitized_file`,
//! `chunk_number`, `processed_at`) and serializes as a JSON array of
//! `{chunk_text, metadata}` records. The target store id is always supplied
//! by the caller.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use noa_core::{Chunk, ChunkMetadata, NoaError};
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid filename regex"));
static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("valid separator regex"));

/// ASCII-safe slug of a display name: accents folded, anything else outside
/// ASCII dropped, punctuation and whitespace runs turned into single dashes.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter_map(|c| if c.is_ascii() { Some(c) } else { fold_accent(c) })
        .collect();
    let dashed = NON_WORD.replace_all(&ascii, "-");
    let collapsed = SEPARATOR_RUN.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

fn fold_accent(c: char) -> Option<char> {
    let base = match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        _ => return None,
    };
    Some(base)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedMetadata {
    #[serde(flatten)]
    pub chunk: ChunkMetadata,
    pub file: String,
    pub sanitized_file: String,
    pub chunk_number: usize,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk_text: String,
    pub metadata: IndexedMetadata,
}

/// Chunks of one file, ready for upload.
#[derive(Debug, Clone)]
pub struct IndexingBatch {
    pub vector_store_id: Option<String>,
    pub file_name: String,
    pub sanitized_file: String,
    pub created_at: DateTime<Utc>,
    pub records: Vec<IndexedChunk>,
}

impl IndexingBatch {
    pub fn new(vector_store_id: Option<String>, file_name: &str, chunks: Vec<Chunk>) -> Self {
        let sanitized_file = sanitize_filename(file_name);
        let created_at = Utc::now();
        let records = chunks
            .into_iter()
            .enumerate()
            .map(|(chunk_number, chunk)| IndexedChunk {
                chunk_text: chunk.content,
                metadata: IndexedMetadata {
                    chunk: chunk.metadata,
                    file: file_name.to_string(),
                    sanitized_file: sanitized_file.clone(),
                    chunk_number,
                    processed_at: created_at,
                },
            })
            .collect();

        Self {
            vector_store_id,
            file_name: file_name.to_string(),
            sanitized_file,
            created_at,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Name of the JSON file handed to the store: `{slug}_{unix seconds}.json`.
    pub fn upload_file_name(&self) -> String {
        let stem = if self.sanitized_file.is_empty() {
            "document"
        } else {
            &self.sanitized_file
        };
        format!("{stem}_{}.json", self.created_at.timestamp())
    }

    pub fn to_json(&self) -> Result<String, NoaError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}
