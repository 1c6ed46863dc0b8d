//! Byte-to-text decoding for plain text files and the raw-bytes last resort.

use super::strategy::{ExtractionStrategy, StrategyError};
use super::FileKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Windows1252,
    Latin1,
    Ascii,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Windows1252 => "windows-1252",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Ascii => "ascii",
        }
    }

    /// Strict decode: `None` when the bytes are not valid in this encoding.
    pub fn decode_strict(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(strip_utf8_bom(bytes))
                .ok()
                .map(str::to_string),
            TextEncoding::Windows1252 => bytes.iter().map(|&b| cp1252_char(b)).collect(),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| b as char).collect()),
        }
    }

    /// Lossy decode: invalid sequences are dropped rather than rejected.
    pub fn decode_lossy(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => strip_utf8_bom(bytes)
                .utf8_chunks()
                .map(|chunk| chunk.valid())
                .collect(),
            TextEncoding::Windows1252 => bytes.iter().filter_map(|&b| cp1252_char(b)).collect(),
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Ascii => bytes
                .iter()
                .filter(|b| b.is_ascii())
                .map(|&b| b as char)
                .collect(),
        }
    }
}

fn strip_utf8_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

/// Windows-1252 differs from Latin-1 only in 0x80..=0x9F.
fn cp1252_char(b: u8) -> Option<char> {
    let c = match b {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        0x81 | 0x8D | 0x8F | 0x90 | 0x9D => return None,
        other => other as char,
    };
    Some(c)
}

/// Decode a text file: the first encoding that accepts the bytes wins.
pub fn decode_text(bytes: &[u8]) -> (String, TextEncoding) {
    for encoding in [TextEncoding::Utf8, TextEncoding::Windows1252] {
        if let Some(text) = encoding.decode_strict(bytes) {
            return (text, encoding);
        }
    }
    (TextEncoding::Latin1.decode_lossy(bytes), TextEncoding::Latin1)
}

/// Keep printable characters, replace the rest with spaces, collapse runs.
pub fn printable_only(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        let keep = matches!(c, '\n' | '\r' | '\t' | ' '..='~' | '\u{00A0}'..='\u{00FF}');
        if keep && c != ' ' && c != '\t' {
            if pending_space && !out.is_empty() && !out.ends_with('\n') {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

// ── Strategies ───────────────────────────────────────────────

/// Text and Markdown files.
pub struct PlainTextStrategy;

impl ExtractionStrategy for PlainTextStrategy {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn supports(&self, kind: FileKind) -> bool {
        matches!(kind, FileKind::Text | FileKind::Markdown)
    }

    fn try_extract(&self, bytes: &[u8]) -> Result<String, StrategyError> {
        let (text, encoding) = decode_text(bytes);
        tracing::debug!(encoding = encoding.as_str(), "decoded text file");
        Ok(text)
    }
}

/// Last resort for binary containers: decode whatever bytes look like text.
pub struct RawBytesStrategy;

impl ExtractionStrategy for RawBytesStrategy {
    fn name(&self) -> &'static str {
        "raw-bytes"
    }

    fn supports(&self, kind: FileKind) -> bool {
        kind.is_binary()
    }

    fn try_extract(&self, bytes: &[u8]) -> Result<String, StrategyError> {
        for encoding in [
            TextEncoding::Utf8,
            TextEncoding::Latin1,
            TextEncoding::Windows1252,
            TextEncoding::Ascii,
        ] {
            let text = printable_only(&encoding.decode_lossy(bytes));
            if !text.trim().is_empty() {
                tracing::debug!(encoding = encoding.as_str(), "raw bytes decoded");
                return Ok(text.trim().to_string());
            }
        }
        Err(StrategyError::Parse("no printable text in raw bytes".into()))
    }
}
