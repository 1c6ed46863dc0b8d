//! Local key-term heuristic used whenever the model supplies none.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

pub const MAX_KEY_TERMS: usize = 5;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("valid token regex"));

/// Spanish and English function words. Entries shorter than three letters
/// can never match a token and are left out.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // es
        "los", "las", "unos", "unas", "pero", "porque", "como", "para", "por", "que", "del",
        "son", "con", "sin", "sobre", "entre", "este", "esta", "estos", "estas", "ese", "esa",
        "esos", "esas", "aquel", "aquella", "mas", "muy", "mucho", "mucha", "muchos", "muchas",
        "poco", "poca", "pocos", "pocas", "una", "uno", "hay", "fue", "ser", "sus", "les",
        "ella", "ellos", "cuando", "donde", "tiene", "tienen", "desde", "hasta", "tambien",
        // en
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her",
        "was", "one", "our", "out", "has", "his", "how", "its", "may", "who", "this", "that",
        "with", "from", "they", "been", "have", "were", "which", "their", "there", "these",
        "those", "than", "then", "them", "what", "when", "where", "will", "would", "into",
        "about", "also", "each", "other", "such", "some", "more", "most", "only", "over",
    ]
    .into_iter()
    .collect()
});

/// Up to `limit` most frequent content words, lower-cased. Ties keep the
/// order of first occurrence.
pub fn extract_key_terms(text: &str, limit: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for token in TOKEN.find_iter(&lowered).map(|m| m.as_str()) {
        if STOP_WORDS.contains(token) {
            continue;
        }
        let count = counts.entry(token).or_insert(0);
        if *count == 0 {
            order.push(token);
        }
        *count += 1;
    }

    // Stable sort keeps first-occurrence order among equal counts.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order
        .into_iter()
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// [`extract_key_terms`] with the default limit.
pub fn key_terms(text: &str) -> Vec<String> {
    extract_key_terms(text, MAX_KEY_TERMS)
}
