//! Segmentation prompt construction and response parsing.

use noa_core::DocumentStructure;
use serde_json::Value;
use thiserror::Error;

use crate::structure::clean::strip_control_chars;

const CONTEXT_TITLE_CHARS: usize = 50;

/// What the model is told about the surrounding document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContext {
    pub title: String,
    pub total_pages: usize,
}

impl DocumentContext {
    pub fn from_structure(structure: &DocumentStructure) -> Self {
        Self {
            title: structure.title.clone(),
            total_pages: structure.total_pages.max(1),
        }
    }
}

/// Strip control characters and cap the text at `max_chars` characters,
/// marking the cut with `...`.
pub fn sanitize_for_prompt(text: &str, max_chars: usize) -> String {
    let clean = strip_control_chars(text);
    if clean.chars().count() > max_chars {
        let mut cut: String = clean.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        clean
    }
}

/// Instruction asking the model to split `block_text` into coherent
/// segments and answer with a JSON array.
pub fn build_segmentation_prompt(
    block_text: &str,
    preferred_size: usize,
    position_fraction: f64,
    context: Option<&DocumentContext>,
) -> String {
    let context_info = context
        .map(|ctx| {
            let title: String = ctx.title.chars().take(CONTEXT_TITLE_CHARS).collect();
            format!(
                "This fragment belongs to the document \"{title}\", which has about {pages} pages.\n\
                 The fragment sits roughly {percent:.0}% of the way through the document.\n",
                pages = ctx.total_pages.max(1),
                percent = (position_fraction.clamp(0.0, 1.0) * 100.0),
            )
        })
        .unwrap_or_default();

    format!(
        "You are an expert in text processing and semantic understanding. Split the text below \
into semantically coherent chunks. Each chunk must be a complete unit of meaning of roughly \
{preferred_size} words, but coherence always takes priority over exact size.

{context_info}
Text to split:
```text
{block_text}
```

For every chunk:
1. Copy its text verbatim into \"chunk_text\". Together the chunks must cover the whole text.
2. Give a short descriptive \"chunk_title\".
3. List 3-5 \"key_terms\" that represent its content.
4. List the main \"entities\" mentioned (people, organizations, concepts).
5. Classify its \"content_type\" (descriptive, narrative, argumentative, ...).

Answer ONLY with a JSON array in this format, with no further explanation:
```json
[
  {{
    \"chunk_text\": \"text of the first chunk...\",
    \"chunk_title\": \"descriptive title\",
    \"key_terms\": [\"term1\", \"term2\", \"term3\"],
    \"entities\": [\"entity1\", \"entity2\"],
    \"content_type\": \"content type\"
  }}
]
```
"
    )
}

/// The payload of a model response: the first fenced block, else a bare
/// `[`..`]` slice, else the trimmed response.
pub fn extract_payload(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```") {
        let after_tick = &trimmed[start + 3..];
        // Skip a language tag such as `json` on the opening line.
        let content_start = match after_tick.find('\n') {
            Some(n) if !after_tick[..n].contains('[') => n + 1,
            _ => 0,
        };
        if let Some(end) = after_tick[content_start..].find("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

#[derive(Debug, Error)]
pub enum SegmentParseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("expected a JSON array, got {0}")]
    NotAnArray(&'static str),
}

/// One usable record from the model, before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    /// Position of the record in the response array.
    pub index: usize,
    pub content: String,
    pub title: Option<String>,
    pub key_terms: Vec<String>,
    pub entities: Vec<String>,
    pub content_type: Option<String>,
}

/// Parse the payload as an array of segment records. Records that are not
/// objects or lack non-blank `chunk_text` (or `content`) are skipped.
pub fn parse_segments(payload: &str) -> Result<Vec<RawSegment>, SegmentParseError> {
    let value: Value = serde_json::from_str(payload)?;
    let records = match value {
        Value::Array(records) => records,
        other => return Err(SegmentParseError::NotAnArray(json_kind(&other))),
    };

    let segments = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let Some(obj) = record.as_object() else {
                tracing::debug!(index, "segment record is not an object");
                return None;
            };
            let content = obj
                .get("chunk_text")
                .or_else(|| obj.get("content"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())?;
            Some(RawSegment {
                index,
                content: content.to_string(),
                title: non_blank_str(obj.get("chunk_title")),
                key_terms: string_list(obj.get("key_terms")),
                entities: string_list(obj.get("entities")),
                content_type: non_blank_str(obj.get("content_type")),
            })
        })
        .collect();
    Ok(segments)
}

fn non_blank_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String entries of a JSON list; anything else is dropped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| non_blank_str(Some(item)))
                .collect()
        })
        .unwrap_or_default()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
