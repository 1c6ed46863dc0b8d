use std::sync::Arc;

use futures::stream::{self, StreamExt};
use noa_core::{Chunk, ChunkOptions, ChunkPosition, Config, DocumentStructure};
use noa_llm::LlmProvider;
use tracing::info;

use super::optimizer::{OptimizerSettings, SemanticOptimizer};
use super::position::PositionAnnotator;
use super::prompt::DocumentContext;
use super::splitter;

/// Coarse blocks are this many times the final target size, leaving the
/// optimizer room to subdivide.
const COARSE_FACTOR: usize = 2;

/// Split → optimize → annotate, in document order.
pub struct ChunkingPipeline {
    optimizer: SemanticOptimizer,
    max_concurrent_blocks: usize,
}

impl ChunkingPipeline {
    pub fn new(optimizer: SemanticOptimizer) -> Self {
        Self {
            optimizer,
            max_concurrent_blocks: 1,
        }
    }

    pub fn from_config(config: &Config, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self::new(SemanticOptimizer::new(
            provider,
            OptimizerSettings::from_config(config),
        ))
        .with_concurrency(config.chunking.max_concurrent_blocks)
    }

    /// Number of blocks optimized at once. Output order is unaffected.
    pub fn with_concurrency(mut self, max_concurrent_blocks: usize) -> Self {
        self.max_concurrent_blocks = max_concurrent_blocks.max(1);
        self
    }

    pub fn optimizer(&self) -> &SemanticOptimizer {
        &self.optimizer
    }

    /// Chunk `text`. Blank input yields no chunks; anything else yields at
    /// least one.
    pub async fn chunk_document(
        &self,
        text: &str,
        structure: Option<&DocumentStructure>,
        options: &ChunkOptions,
    ) -> Vec<Chunk> {
        if text.trim().is_empty() {
            info!("blank input, nothing to chunk");
            return Vec::new();
        }

        let blocks = splitter::split(
            text,
            options.target_chunk_size.saturating_mul(COARSE_FACTOR),
            options.overlap,
        );
        let total_blocks = blocks.len();
        info!(blocks = total_blocks, "text split into preliminary blocks");

        let context = structure.map(DocumentContext::from_structure);
        let optimized: Vec<Vec<Chunk>> = stream::iter(blocks.iter().enumerate())
            .map(|(index, block)| {
                let context = context.as_ref();
                async move {
                    tracing::debug!(block = index + 1, total = total_blocks, "optimizing block");
                    let fraction = index as f64 / total_blocks as f64;
                    self.optimizer
                        .optimize(block, options.target_chunk_size, fraction, context)
                        .await
                }
            })
            .buffered(self.max_concurrent_blocks)
            .collect()
            .await;

        let annotator = PositionAnnotator::new(structure, total_blocks);
        let mut chunks = Vec::new();
        for (block_index, block_chunks) in optimized.into_iter().enumerate() {
            let sub_count = block_chunks.len();
            for (sub_index, mut chunk) in block_chunks.into_iter().enumerate() {
                annotator
                    .annotate(ChunkPosition::new(block_index, sub_index, sub_count))
                    .apply(&mut chunk.metadata);
                chunks.push(chunk);
            }
        }

        info!(chunks = chunks.len(), blocks = total_blocks, "chunking complete");
        chunks
    }
}
