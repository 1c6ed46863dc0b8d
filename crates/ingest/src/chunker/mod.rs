//! Semantic chunking: coarse paragraph-aware split, optional model-driven
//! refinement per block, deterministic fallback, positional annotation.

pub mod fallback;
pub mod optimizer;
pub mod pipeline;
pub mod position;
pub mod prompt;
pub mod splitter;
pub mod terms;

pub use fallback::fallback_chunks;
pub use optimizer::{small_fragment, OptimizerSettings, SemanticOptimizer};
pub use pipeline::ChunkingPipeline;
pub use position::{PositionAnnotator, PositionInfo};
pub use prompt::DocumentContext;
pub use splitter::split;
pub use terms::extract_key_terms;
