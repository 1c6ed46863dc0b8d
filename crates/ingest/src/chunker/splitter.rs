//! Deterministic paragraph-aware splitting into coarse blocks.

use std::sync::LazyLock;

use regex::Regex;

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"));

/// Approximate size via whitespace splitting.
pub(crate) fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Non-blank paragraphs separated by blank lines, trimmed.
pub(crate) fn paragraphs(text: &str) -> Vec<&str> {
    BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// The last `overlap` words of `text`, space-joined.
pub(crate) fn trailing_words(text: &str, overlap: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    words[words.len().saturating_sub(overlap)..].join(" ")
}

/// Sliding windows of `size` words that advance by `size - overlap`
/// (at least one word), so consecutive windows share `overlap` words.
pub(crate) fn windows(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    let mut out = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + size).min(words.len());
        out.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    out
}

/// Accumulates paragraphs into one block.
struct BlockBuilder {
    parts: Vec<String>,
    words: usize,
    /// True once the block holds more than the carried-over overlap.
    fresh: bool,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            parts: Vec::new(),
            words: 0,
            fresh: false,
        }
    }

    fn seeded(seed: String) -> Self {
        let words = count_words(&seed);
        Self {
            parts: if seed.is_empty() { Vec::new() } else { vec![seed] },
            words,
            fresh: false,
        }
    }

    fn push(&mut self, paragraph: &str, words: usize) {
        self.parts.push(paragraph.to_string());
        self.words += words;
        self.fresh = true;
    }

    /// Emit the block when it holds new content. Paragraphs are joined by a
    /// blank line so later stages still see paragraph boundaries.
    fn finish(self) -> Option<String> {
        self.fresh.then(|| self.parts.join("\n\n"))
    }
}

/// Split `text` into coarse blocks of roughly `target_size` words.
///
/// Paragraphs are packed greedily. When the next paragraph would overflow
/// the budget the block is emitted and the next one starts with the trailing
/// `overlap` words of the emitted block. Paragraphs longer than `target_size`
/// are cut into overlapping windows. Every input word lands in some block.
pub fn split(text: &str, target_size: usize, overlap: usize) -> Vec<String> {
    let target_size = target_size.max(1);
    let overlap = overlap.min(target_size - 1);

    let mut blocks = Vec::new();
    let mut current = BlockBuilder::new();

    for paragraph in paragraphs(text) {
        let words = count_words(paragraph);

        if words > target_size {
            if let Some(block) = current.finish() {
                blocks.push(block);
            }
            let parts = windows(paragraph, target_size, overlap);
            let seed = parts
                .last()
                .map(|last| trailing_words(last, overlap))
                .unwrap_or_default();
            blocks.extend(parts);
            current = BlockBuilder::seeded(seed);
            continue;
        }

        if current.fresh && current.words + words > target_size {
            let seed_source = std::mem::replace(&mut current, BlockBuilder::new());
            if let Some(block) = seed_source.finish() {
                let seed = trailing_words(&block, overlap);
                blocks.push(block);
                current = BlockBuilder::seeded(seed);
            }
        }
        current.push(paragraph, words);
    }

    if let Some(block) = current.finish() {
        blocks.push(block);
    }

    if blocks.is_empty() && !text.trim().is_empty() {
        blocks.push(text.trim().to_string());
    }

    tracing::debug!(blocks = blocks.len(), target_size, overlap, "preliminary split");
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(prefix: &str, n: usize) -> String {
        (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn blank_text_has_no_blocks() {
        assert!(split("  \n\n \t", 10, 2).is_empty());
    }

    #[test]
    fn small_text_is_one_block() {
        assert_eq!(split("  hello world  ", 10, 2), vec!["hello world"]);
    }

    #[test]
    fn paragraphs_packed_and_seeded_with_overlap() {
        let text = format!("{}\n\n{}\n\n{}", numbered("a", 4), numbered("b", 4), numbered("c", 4));
        let blocks = split(&text, 8, 2);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], format!("{}\n\n{}", numbered("a", 4), numbered("b", 4)));
        assert_eq!(blocks[1], format!("b2 b3\n\n{}", numbered("c", 4)));
    }

    #[test]
    fn oversized_paragraph_uses_sliding_windows() {
        let text = numbered("w", 25);
        let blocks = split(&text, 10, 3);
        // step 7: windows start at 0, 7, 14, 21
        assert_eq!(blocks.len(), 4);
        assert!(blocks.iter().all(|b| count_words(b) <= 10));
        assert!(blocks[0].ends_with("w7 w8 w9"));
        assert!(blocks[1].starts_with("w7 w8 w9"));
        assert!(blocks[3].ends_with("w24"));
    }

    #[test]
    fn paragraph_after_oversized_one_gets_seed() {
        let text = format!("{}\n\nshort tail", numbered("w", 12));
        let blocks = split(&text, 10, 2);
        assert_eq!(blocks.last().unwrap(), "w10 w11\n\nshort tail");
    }

    #[test]
    fn every_word_is_covered() {
        let text = format!(
            "{}\n\n{}\n\n{}\n\n{}",
            numbered("p", 7),
            numbered("q", 30),
            numbered("r", 3),
            numbered("s", 9)
        );
        let blocks = split(&text, 8, 3);
        let joined = blocks.join(" ");
        for word in text.split_whitespace() {
            assert!(joined.split_whitespace().any(|w| w == word), "lost {word}");
        }
    }

    #[test]
    fn overlap_equal_to_target_still_advances() {
        let blocks = split(&numbered("x", 5), 2, 2);
        assert!(blocks.len() >= 4);
        assert!(blocks.last().unwrap().ends_with("x4"));
    }

    #[test]
    fn trailing_words_shorter_than_overlap() {
        assert_eq!(trailing_words("one two", 5), "one two");
        assert_eq!(trailing_words("one two three", 0), "");
    }
}
