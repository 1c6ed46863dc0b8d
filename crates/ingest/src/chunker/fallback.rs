//! Deterministic paragraph packing used whenever semantic optimization is
//! unavailable or its output is unusable.

use noa_core::{Chunk, ChunkMetadata, ChunkType};

use super::splitter::{count_words, paragraphs};
use super::terms::key_terms;

pub const GENERAL_CONTENT_TYPE: &str = "general";
pub const FULL_TEXT_TITLE: &str = "Full text";

const TITLE_WORDS: usize = 8;
const TITLE_MAX_CHARS: usize = 50;

/// First eight words, cut to 50 characters with a `...` suffix.
pub fn simple_title(text: &str) -> String {
    let title = text
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    if title.chars().count() > TITLE_MAX_CHARS {
        let mut cut: String = title.chars().take(TITLE_MAX_CHARS - 3).collect();
        cut.push_str("...");
        cut
    } else {
        title
    }
}

fn fallback_chunk(content: String, chunk_type: ChunkType, title: String) -> Chunk {
    let mut metadata = ChunkMetadata::new(chunk_type, count_words(&content), key_terms(&content));
    metadata.chunk_title = Some(title);
    metadata.content_type = Some(GENERAL_CONTENT_TYPE.to_string());
    Chunk { content, metadata }
}

fn packed_chunk(parts: &[&str]) -> Chunk {
    let content = parts.join("\n\n");
    let title = simple_title(&content);
    fallback_chunk(content, ChunkType::Fallback, title)
}

/// The whole trimmed text as one `fallback_single` chunk; `None` when blank.
pub(crate) fn whole_text_chunk(text: &str) -> Option<Chunk> {
    let content = text.trim();
    (!content.is_empty()).then(|| {
        fallback_chunk(
            content.to_string(),
            ChunkType::FallbackSingle,
            FULL_TEXT_TITLE.to_string(),
        )
    })
}

/// Pack paragraphs until `preferred_size` words would be exceeded. A single
/// paragraph larger than the budget stays whole. Always returns at least one
/// chunk for non-blank input.
pub fn fallback_chunks(text: &str, preferred_size: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0;

    for paragraph in paragraphs(text) {
        let words = count_words(paragraph);
        if !current.is_empty() && current_words + words > preferred_size {
            chunks.push(packed_chunk(&current));
            current.clear();
            current_words = 0;
        }
        current.push(paragraph);
        current_words += words;
    }
    if !current.is_empty() {
        chunks.push(packed_chunk(&current));
    }

    // Packing covers every non-blank input; this only fires if paragraph
    // detection ever returns nothing for non-blank text.
    if chunks.is_empty() {
        chunks.extend(whole_text_chunk(text));
    }

    tracing::info!(chunks = chunks.len(), preferred_size, "fallback chunking");
    chunks
}
