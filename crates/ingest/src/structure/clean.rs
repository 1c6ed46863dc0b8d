use std::sync::LazyLock;

use regex::Regex;

static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("valid control-char regex")
});

/// Remove control characters, keeping tab, newline and carriage return.
pub(crate) fn strip_control_chars(text: &str) -> String {
    CONTROL_CHARS.replace_all(text, "").into_owned()
}

/// Every whitespace run becomes one space. Used for pagination and counts.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One entry per source line, horizontal whitespace collapsed and trimmed.
/// Blank lines are kept so line numbers stay aligned with the source.
pub(crate) fn clean_lines(text: &str) -> Vec<String> {
    text.lines().map(collapse_whitespace).collect()
}
