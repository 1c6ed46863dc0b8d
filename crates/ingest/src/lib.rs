//! Document ingestion and semantic chunking.
//!
//! Stages, leaves first:
//! - [`document`]: text extraction with per-format fallback strategies
//! - [`structure`]: headings, hierarchy, synthetic pages
//! - [`chunker`]: coarse split, model refinement with deterministic
//!   fallback, positional annotation
//! - [`indexing`]: the batch handed to the vector-store collaborator

pub mod chunker;
pub mod document;
pub mod indexing;
pub mod structure;

use noa_core::{Chunk, ChunkOptions, Config, DocumentStructure};
use tracing::warn;

pub use chunker::ChunkingPipeline;
pub use document::{extract_text, extract_text_from_bytes, ExtractionError, FileKind, TextExtractor};
pub use indexing::{sanitize_filename, IndexingBatch};
pub use structure::{build_structure, StructureExtractor};

/// Chunk `text` with the provider and settings from the environment.
///
/// A provider that cannot be built is logged and skipped; chunking then
/// runs on the deterministic path.
pub async fn chunk_document(
    text: &str,
    structure: Option<&DocumentStructure>,
    options: &ChunkOptions,
) -> Vec<Chunk> {
    let config = Config::from_env();
    let provider = match noa_llm::create_provider(&config.llm, &config.ollama) {
        Ok(provider) => provider,
        Err(e) => {
            warn!(error = %e, "language model unavailable, chunking without it");
            None
        }
    };
    ChunkingPipeline::from_config(&config, provider)
        .chunk_document(text, structure, options)
        .await
}
