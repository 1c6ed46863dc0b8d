//! End-to-end chunking behaviour against scripted, failing and slow
//! language-model providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use noa_core::{ChunkOptions, ChunkType, DocumentLocation};
use noa_ingest::chunker::{split, ChunkingPipeline, OptimizerSettings, SemanticOptimizer};
use noa_ingest::StructureExtractor;
use noa_llm::{LlmError, LlmProvider, Message};

// ── Providers ───────────────────────────────────────────────────────

struct Failing {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for Failing {
    async fn complete(&self, _: Vec<Message>, _: f32, _: u32) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::ApiError {
            status: 429,
            body: "rate limited".into(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

struct Slow;

#[async_trait]
impl LlmProvider for Slow {
    async fn complete(&self, _: Vec<Message>, _: f32, _: u32) -> Result<String, LlmError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok("[]".into())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

struct Malformed;

#[async_trait]
impl LlmProvider for Malformed {
    async fn complete(&self, _: Vec<Message>, _: f32, _: u32) -> Result<String, LlmError> {
        Ok("Sure! Chunk one is about foxes, chunk two {is about dogs".into())
    }

    fn name(&self) -> &str {
        "malformed"
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn pipeline(provider: Option<Arc<dyn LlmProvider>>) -> ChunkingPipeline {
    ChunkingPipeline::new(SemanticOptimizer::new(
        provider,
        OptimizerSettings {
            llm_timeout: Duration::from_millis(20),
            ..OptimizerSettings::default()
        },
    ))
}

fn words(prefix: &str, n: usize) -> String {
    (0..n)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn document(paragraphs: usize, words_each: usize) -> String {
    (0..paragraphs)
        .map(|p| words(&format!("p{p}w"), words_each))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ── Coverage and ordering ───────────────────────────────────────────

#[tokio::test]
async fn no_input_word_is_lost() {
    let text = document(9, 70);
    let chunks = pipeline(None)
        .chunk_document(&text, None, &ChunkOptions::new(100, 20).unwrap())
        .await;

    assert!(!chunks.is_empty());
    let total: usize = chunks.iter().map(|c| word_count(&c.content)).sum();
    assert!(total >= word_count(&text));

    let emitted: std::collections::HashSet<&str> = chunks
        .iter()
        .flat_map(|c| c.content.split_whitespace())
        .collect();
    for word in text.split_whitespace() {
        assert!(emitted.contains(word), "missing {word}");
    }
}

#[tokio::test]
async fn whitespace_only_input_gives_no_chunks() {
    let chunks = pipeline(None)
        .chunk_document("\n\n   \t\n", None, &ChunkOptions::default())
        .await;
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn positions_are_monotone_and_labelled() {
    let text = document(40, 30);
    let structure = StructureExtractor::default().analyze_text(&text, "long.txt");
    let chunks = pipeline(None)
        .chunk_document(&text, Some(&structure), &ChunkOptions::new(60, 10).unwrap())
        .await;

    assert!(chunks.len() > 5);
    for pair in chunks.windows(2) {
        assert!(pair[0].metadata.document_percentage <= pair[1].metadata.document_percentage);
    }
    assert_eq!(chunks[0].metadata.position_in_document, DocumentLocation::Start);
    assert_eq!(
        chunks.last().unwrap().metadata.position_in_document,
        DocumentLocation::End
    );
    for chunk in &chunks {
        assert!(chunk.metadata.document_percentage <= 100);
        assert!(chunk.metadata.estimated_page >= 1);
        assert!(chunk.metadata.estimated_page <= structure.total_pages);
        assert!(chunk.metadata.key_terms.len() <= 5);
    }
}

// ── Provider failures ───────────────────────────────────────────────

#[tokio::test]
async fn provider_error_falls_back() {
    let failing = Arc::new(Failing {
        calls: AtomicUsize::new(0),
    });
    let text = document(6, 40);
    let chunks = pipeline(Some(failing.clone()))
        .chunk_document(&text, None, &ChunkOptions::new(100, 10).unwrap())
        .await;

    assert!(!chunks.is_empty());
    assert!(failing.calls.load(Ordering::SeqCst) >= 1);
    assert!(chunks.iter().all(|c| c.metadata.chunk_type.is_fallback()));
}

#[tokio::test]
async fn provider_timeout_falls_back() {
    let text = document(4, 30);
    let started = std::time::Instant::now();
    let chunks = pipeline(Some(Arc::new(Slow)))
        .chunk_document(&text, None, &ChunkOptions::new(100, 10).unwrap())
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!chunks.is_empty());
    assert!(chunks.iter().all(|c| c.metadata.chunk_type.is_fallback()));
}

#[tokio::test]
async fn malformed_response_for_500_words_falls_back_with_full_coverage() {
    let text = document(5, 100);
    let chunks = pipeline(Some(Arc::new(Malformed)))
        .chunk_document(&text, None, &ChunkOptions::default())
        .await;

    assert!(chunks
        .iter()
        .all(|c| c.metadata.chunk_type == ChunkType::Fallback));
    let total: usize = chunks.iter().map(|c| word_count(&c.content)).sum();
    assert_eq!(total, 500);
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn ten_word_paragraph() {
    let text = "The quick brown fox jumps over the lazy sleeping dog";
    let structure = StructureExtractor::default().analyze_text(text, "fox.txt");
    assert!(structure.sections.is_empty());
    assert_eq!(structure.total_pages, 1);

    let chunks = pipeline(Some(Arc::new(Malformed)))
        .chunk_document(text, Some(&structure), &ChunkOptions::default())
        .await;

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, text);
    assert_eq!(chunks[0].metadata.chunk_type, ChunkType::SmallFragment);
    assert_eq!(chunks[0].metadata.word_count, 10);
    assert_eq!(chunks[0].metadata.estimated_page, 1);
}

#[tokio::test]
async fn markdown_with_two_top_level_headings() {
    let lines = [
        "Some preamble text",
        "# Background",
        "alpha",
        "beta",
        "gamma",
        "delta",
        "# Results",
        "epsilon",
        "zeta",
        "eta",
    ];
    let text = lines.join("\n");
    let structure = StructureExtractor::default().analyze_text(&text, "notes.md");

    assert_eq!(structure.sections.len(), 2);
    assert_eq!(structure.sections[0].position_percentage, 10.0);
    assert_eq!(structure.sections[1].position_percentage, 60.0);
    for section in &structure.sections {
        assert_eq!(section.level, 1);
        assert_eq!(section.parent_section, "");
    }

    let chunks = pipeline(None)
        .chunk_document(&text, Some(&structure), &ChunkOptions::default())
        .await;
    assert_eq!(chunks.len(), 1);
    // The only chunk starts at 0%, before either heading.
    assert!(chunks[0].metadata.section.is_none());
}

#[test]
fn nested_parent_sections_name_detected_headings() {
    let text = "# Guide\nintro\n## Setup\nsteps\n### Linux\ncmds\n## Usage\nrun\n# Appendix\n### Notes";
    let structure = StructureExtractor::default().analyze_text(text, "guide.md");
    let titles: Vec<&str> = structure.sections.iter().map(|s| s.title.as_str()).collect();

    for section in &structure.sections {
        assert!(
            section.parent_section.is_empty() || titles.contains(&section.parent_section.as_str()),
            "{} has unknown parent {}",
            section.title,
            section.parent_section
        );
    }
    // Level 2 still remembers "Usage" after "# Appendix" opens.
    let notes = structure.sections.iter().find(|s| s.title == "Notes").unwrap();
    assert_eq!(notes.parent_section, "Usage");
    let linux = structure.sections.iter().find(|s| s.title == "Linux").unwrap();
    assert_eq!(linux.parent_section, "Setup");
}

#[test]
fn ten_thousand_chars_without_blank_lines() {
    // 2000 five-character tokens plus separators: well over 10,000 characters.
    let text = (0..2000).map(|i| format!("w{i:04}")).collect::<Vec<_>>().join(" ");
    assert!(text.len() >= 10_000);

    let (target, overlap) = (300, 50);
    let blocks = split(&text, target, overlap);

    assert!(blocks.len() > 1);
    for block in &blocks {
        assert!(word_count(block) <= target + overlap);
    }
    for pair in blocks.windows(2) {
        let words: Vec<&str> = pair[0].split_whitespace().collect();
        let tail = &words[words.len() - overlap..];
        let head: Vec<&str> = pair[1].split_whitespace().take(overlap).collect();
        assert_eq!(tail, head.as_slice());
    }
}
