//! Model-driven refinement of coarse blocks into semantic chunks.
//!
//! Every failure path ends in [`fallback_chunks`]: no provider, provider
//! error, timeout, a block too long for the prompt, unparsable output, no
//! usable records, or records that leave too much of the block uncovered. Nothing here returns an error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use noa_core::{Chunk, ChunkMetadata, ChunkType, Config};
use noa_llm::{LlmError, LlmProvider};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::fallback::{fallback_chunks, GENERAL_CONTENT_TYPE};
use super::prompt::{
    build_segmentation_prompt, extract_payload, parse_segments, sanitize_for_prompt,
    DocumentContext, RawSegment, SegmentParseError,
};
use super::splitter::count_words;
use super::terms::{key_terms, MAX_KEY_TERMS};
use crate::structure::clean::strip_control_chars;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    /// Blocks with fewer words are emitted as a single small fragment.
    pub min_words_for_optimization: usize,
    pub llm_timeout: Duration,
    pub max_prompt_chars: usize,
    /// Share of block words the model's segments must reproduce.
    pub min_coverage_ratio: f32,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl OptimizerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_words_for_optimization: config.chunking.min_words_for_optimization,
            llm_timeout: config.chunking.llm_timeout(),
            max_prompt_chars: config.chunking.max_prompt_chars,
            min_coverage_ratio: config.chunking.min_coverage_ratio,
            temperature: config.llm.temperature,
            max_output_tokens: config.llm.max_tokens,
        }
    }
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            min_words_for_optimization: 50,
            llm_timeout: Duration::from_secs(45),
            max_prompt_chars: 12_000,
            min_coverage_ratio: 0.9,
            temperature: 0.1,
            max_output_tokens: 2000,
        }
    }
}

/// Why a model proposal was rejected.
#[derive(Debug, Error)]
enum Rejection {
    #[error("provider error: {0}")]
    Provider(#[from] LlmError),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Parse(#[from] SegmentParseError),
    #[error("no usable segments in response")]
    NoSegments,
    #[error("segments cover {covered:.2} of the block, need {required:.2}")]
    LowCoverage { covered: f32, required: f32 },
}

pub struct SemanticOptimizer {
    provider: Option<Arc<dyn LlmProvider>>,
    settings: OptimizerSettings,
}

impl SemanticOptimizer {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, settings: OptimizerSettings) -> Self {
        Self { provider, settings }
    }

    /// Deterministic chunking only.
    pub fn without_provider(settings: OptimizerSettings) -> Self {
        Self::new(None, settings)
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn is_small(&self, block: &str) -> bool {
        count_words(block) < self.settings.min_words_for_optimization
    }

    /// Split one coarse block into chunks. Positional metadata is left at
    /// its defaults for the annotator.
    pub async fn optimize(
        &self,
        block: &str,
        preferred_size: usize,
        position_fraction: f64,
        context: Option<&DocumentContext>,
    ) -> Vec<Chunk> {
        if self.is_small(block) {
            return vec![small_fragment(block)];
        }

        let Some(provider) = self.provider.as_deref() else {
            debug!("no language model configured, using fallback chunking");
            return fallback_chunks(block, preferred_size);
        };

        let prompt_chars = strip_control_chars(block).chars().count();
        if prompt_chars > self.settings.max_prompt_chars {
            // A truncated block can never pass the coverage check.
            info!(
                chars = prompt_chars,
                limit = self.settings.max_prompt_chars,
                "block exceeds prompt limit, using fallback chunking"
            );
            return fallback_chunks(block, preferred_size);
        }

        match self
            .propose(provider, block, preferred_size, position_fraction, context)
            .await
        {
            Ok(chunks) => chunks,
            Err(rejection) => {
                warn!(
                    provider = provider.name(),
                    reason = %rejection,
                    "semantic optimization failed, using fallback chunking"
                );
                fallback_chunks(block, preferred_size)
            }
        }
    }

    async fn propose(
        &self,
        provider: &dyn LlmProvider,
        block: &str,
        preferred_size: usize,
        position_fraction: f64,
        context: Option<&DocumentContext>,
    ) -> Result<Vec<Chunk>, Rejection> {
        let block_text = sanitize_for_prompt(block, self.settings.max_prompt_chars);
        let prompt =
            build_segmentation_prompt(&block_text, preferred_size, position_fraction, context);

        let started = Instant::now();
        let response = tokio::time::timeout(
            self.settings.llm_timeout,
            provider.generate(
                &prompt,
                self.settings.temperature,
                self.settings.max_output_tokens,
            ),
        )
        .await
        .map_err(|_| Rejection::Timeout(self.settings.llm_timeout))??;
        info!(
            provider = provider.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "language model responded"
        );

        let segments = parse_segments(extract_payload(&response))?;
        if segments.is_empty() {
            return Err(Rejection::NoSegments);
        }

        let covered = coverage(block, segments.iter().map(|s| s.content.as_str()));
        if covered < self.settings.min_coverage_ratio {
            return Err(Rejection::LowCoverage {
                covered,
                required: self.settings.min_coverage_ratio,
            });
        }

        Ok(segments.into_iter().map(semantic_chunk).collect())
    }
}

/// A block too short to optimize, kept verbatim.
pub fn small_fragment(block: &str) -> Chunk {
    Chunk {
        content: block.to_string(),
        metadata: ChunkMetadata::new(ChunkType::SmallFragment, count_words(block), key_terms(block)),
    }
}

fn semantic_chunk(segment: RawSegment) -> Chunk {
    let RawSegment {
        index,
        content,
        title,
        key_terms: mut terms,
        entities,
        content_type,
    } = segment;

    if terms.is_empty() {
        terms = key_terms(&content);
    }
    terms.truncate(MAX_KEY_TERMS);

    let mut metadata = ChunkMetadata::new(ChunkType::SemanticUnit, count_words(&content), terms);
    metadata.chunk_title = Some(title.unwrap_or_else(|| format!("Chunk {}", index + 1)));
    metadata.entities = entities;
    metadata.content_type = Some(
        content_type
            .map(|t| t.to_lowercase())
            .unwrap_or_else(|| GENERAL_CONTENT_TYPE.to_string()),
    );
    Chunk { content, metadata }
}

/// Share of the block's words (with multiplicity, case-insensitive) that
/// appear in the segments.
fn coverage<'a>(block: &str, segments: impl Iterator<Item = &'a str>) -> f32 {
    let mut available: HashMap<String, usize> = HashMap::new();
    for word in segments.flat_map(str::split_whitespace) {
        *available.entry(word.to_lowercase()).or_insert(0) += 1;
    }

    let mut total = 0usize;
    let mut covered = 0usize;
    for word in block.split_whitespace() {
        total += 1;
        if let Some(n) = available.get_mut(&word.to_lowercase()) {
            if *n > 0 {
                *n -= 1;
                covered += 1;
            }
        }
    }
    if total == 0 {
        1.0
    } else {
        covered as f32 / total as f32
    }
}
