//! Chunk output types shared by the pipeline and its downstream consumers.

use serde::{Deserialize, Serialize};

use crate::error::NoaError;

// ── Chunk type ──────────────────────────────────────────────────────────────

/// How a chunk was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// Coarse block too short to be worth optimizing, emitted verbatim.
    SmallFragment,
    /// Segment proposed by the language model.
    SemanticUnit,
    /// Deterministic paragraph packing.
    Fallback,
    /// Whole block wrapped as a single chunk when packing produced nothing.
    FallbackSingle,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::SmallFragment => "small_fragment",
            ChunkType::SemanticUnit => "semantic_unit",
            ChunkType::Fallback => "fallback",
            ChunkType::FallbackSingle => "fallback_single",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ChunkType::Fallback | ChunkType::FallbackSingle)
    }
}

// ── Coarse location ─────────────────────────────────────────────────────────

/// Coarse location label. Serialized with the Spanish labels the index
/// consumers filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentLocation {
    #[serde(rename = "inicio")]
    Start,
    #[serde(rename = "medio")]
    Middle,
    #[serde(rename = "final")]
    End,
}

impl DocumentLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentLocation::Start => "inicio",
            DocumentLocation::Middle => "medio",
            DocumentLocation::End => "final",
        }
    }
}

// ── Metadata ────────────────────────────────────────────────────────────────

/// Metadata attached to every chunk. Optional fields are omitted from the
/// serialized form rather than written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_type: ChunkType,
    pub word_count: usize,
    pub key_terms: Vec<String>,
    pub position_in_document: DocumentLocation,
    pub document_percentage: u8,
    pub estimated_page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_section: Option<String>,
}

impl ChunkMetadata {
    /// Metadata with positional fields at their defaults (start of document,
    /// page 1). The position annotator overwrites them.
    pub fn new(chunk_type: ChunkType, word_count: usize, key_terms: Vec<String>) -> Self {
        Self {
            chunk_type,
            word_count,
            key_terms,
            position_in_document: DocumentLocation::Start,
            document_percentage: 0,
            estimated_page: 1,
            chunk_title: None,
            entities: Vec::new(),
            content_type: None,
            section: None,
            parent_section: None,
        }
    }
}

/// A contiguous span of document text plus its descriptive metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

// ── Position ────────────────────────────────────────────────────────────────

/// Position of a chunk among the coarse blocks of a document: sub-chunk
/// `sub_index` of `sub_count` inside block `block_index`.
///
/// All derived values use exact integer arithmetic, so sub-chunks of one
/// block always sort between that block and the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPosition {
    pub block_index: usize,
    pub sub_index: usize,
    pub sub_count: usize,
}

impl ChunkPosition {
    pub fn new(block_index: usize, sub_index: usize, sub_count: usize) -> Self {
        Self {
            block_index,
            sub_index,
            sub_count: sub_count.max(1),
        }
    }

    /// Position of an undivided block.
    pub fn block(block_index: usize) -> Self {
        Self::new(block_index, 0, 1)
    }

    /// `(numerator, denominator)` of the position fraction.
    fn ratio(&self, total_blocks: usize) -> (u128, u128) {
        let sub_count = self.sub_count.max(1) as u128;
        let num = self.block_index as u128 * sub_count + self.sub_index.min(self.sub_count) as u128;
        let den = sub_count * total_blocks.max(1) as u128;
        (num, den)
    }

    /// Position fraction in `[0, 1]` (clamped).
    pub fn fraction(&self, total_blocks: usize) -> f64 {
        let (num, den) = self.ratio(total_blocks);
        (num as f64 / den as f64).min(1.0)
    }

    /// `floor(fraction * 100)`, clamped to 100.
    pub fn percentage(&self, total_blocks: usize) -> u8 {
        let (num, den) = self.ratio(total_blocks);
        (num * 100 / den).min(100) as u8
    }

    /// `< 0.2` start, `> 0.8` end, otherwise middle.
    pub fn location(&self, total_blocks: usize) -> DocumentLocation {
        let (num, den) = self.ratio(total_blocks);
        if num * 5 < den {
            DocumentLocation::Start
        } else if num * 5 > den * 4 {
            DocumentLocation::End
        } else {
            DocumentLocation::Middle
        }
    }

    /// `max(1, floor(fraction * total_pages) + 1)`, never beyond `total_pages`.
    pub fn estimated_page(&self, total_blocks: usize, total_pages: usize) -> usize {
        let total_pages = total_pages.max(1);
        let (num, den) = self.ratio(total_blocks);
        let page = (num * total_pages as u128 / den) as usize + 1;
        page.clamp(1, total_pages)
    }
}

// ── Options ─────────────────────────────────────────────────────────────────

/// Caller-facing chunking options, both sizes in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Preferred words per final chunk (default: 512).
    pub target_chunk_size: usize,
    /// Words repeated across coarse block boundaries (default: 200).
    pub overlap: usize,
}

impl ChunkOptions {
    pub fn new(target_chunk_size: usize, overlap: usize) -> Result<Self, NoaError> {
        if target_chunk_size == 0 {
            return Err(NoaError::InvalidOptions(
                "target_chunk_size must be greater than zero".into(),
            ));
        }
        if overlap >= target_chunk_size {
            return Err(NoaError::InvalidOptions(format!(
                "overlap ({overlap}) must be smaller than target_chunk_size ({target_chunk_size})"
            )));
        }
        Ok(Self {
            target_chunk_size,
            overlap,
        })
    }
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            target_chunk_size: 512,
            overlap: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_type_serializes_snake_case() {
        let v = serde_json::to_value(ChunkType::FallbackSingle).unwrap();
        assert_eq!(v, "fallback_single");
        assert_eq!(ChunkType::SmallFragment.as_str(), "small_fragment");
        assert!(ChunkType::Fallback.is_fallback());
        assert!(!ChunkType::SemanticUnit.is_fallback());
    }

    #[test]
    fn location_uses_spanish_labels() {
        assert_eq!(serde_json::to_value(DocumentLocation::Start).unwrap(), "inicio");
        assert_eq!(serde_json::to_value(DocumentLocation::Middle).unwrap(), "medio");
        assert_eq!(serde_json::to_value(DocumentLocation::End).unwrap(), "final");
    }

    #[test]
    fn metadata_omits_absent_optionals() {
        let meta = ChunkMetadata::new(ChunkType::SmallFragment, 3, vec!["alpha".into()]);
        let v = serde_json::to_value(&meta).unwrap();
        let obj = v.as_object().unwrap();
        assert!(!obj.contains_key("chunk_title"));
        assert!(!obj.contains_key("entities"));
        assert!(!obj.contains_key("section"));
        assert!(!obj.contains_key("parent_section"));
        assert_eq!(obj["position_in_document"], "inicio");
        assert_eq!(obj["estimated_page"], 1);
    }

    #[test]
    fn position_thresholds() {
        // 10 blocks: block 1 = 0.1, block 2 = 0.2, block 8 = 0.8, block 9 = 0.9
        assert_eq!(ChunkPosition::block(1).location(10), DocumentLocation::Start);
        assert_eq!(ChunkPosition::block(2).location(10), DocumentLocation::Middle);
        assert_eq!(ChunkPosition::block(8).location(10), DocumentLocation::Middle);
        assert_eq!(ChunkPosition::block(9).location(10), DocumentLocation::End);
    }

    #[test]
    fn sub_positions_stay_inside_their_block() {
        let total = 4;
        let last_of_block_one = ChunkPosition::new(1, 6, 7);
        let block_two = ChunkPosition::block(2);
        assert!(last_of_block_one.fraction(total) < block_two.fraction(total));
        assert!(last_of_block_one.percentage(total) <= block_two.percentage(total));
        assert_eq!(ChunkPosition::new(1, 0, 3).percentage(total), 25);
        assert_eq!(ChunkPosition::new(1, 1, 3).percentage(total), 33);
    }

    #[test]
    fn estimated_page_is_bounded() {
        assert_eq!(ChunkPosition::block(0).estimated_page(5, 10), 1);
        assert_eq!(ChunkPosition::block(4).estimated_page(5, 10), 9);
        assert_eq!(ChunkPosition::new(4, 9, 10).estimated_page(5, 10), 10);
        assert_eq!(ChunkPosition::block(3).estimated_page(0, 0), 1);
    }

    #[test]
    fn zero_total_blocks_does_not_divide_by_zero() {
        let p = ChunkPosition::block(0);
        assert_eq!(p.percentage(0), 0);
        assert_eq!(p.location(0), DocumentLocation::Start);
    }

    #[test]
    fn options_validation() {
        assert!(ChunkOptions::new(0, 0).is_err());
        assert!(ChunkOptions::new(100, 100).is_err());
        let opts = ChunkOptions::new(100, 20).unwrap();
        assert_eq!(opts.target_chunk_size, 100);
        assert_eq!(ChunkOptions::default().overlap, 200);
    }
}
