use noa_core::PageSlice;

const PREVIEW_CHARS: usize = 100;

/// `max(1, ceil(chars / chars_per_page))`.
pub(crate) fn estimate_pages(char_count: usize, chars_per_page: usize) -> usize {
    char_count.div_ceil(chars_per_page.max(1)).max(1)
}

/// Slice text into contiguous fixed-size character windows. Offsets are in
/// characters, not bytes.
pub(crate) fn paginate(text: &str, chars_per_page: usize) -> Vec<PageSlice> {
    let chars: Vec<char> = text.chars().collect();
    let per_page = chars_per_page.max(1);

    chars
        .chunks(per_page)
        .enumerate()
        .map(|(i, window)| {
            let start_char = i * per_page;
            let page: String = window.iter().collect();
            PageSlice {
                page_number: i + 1,
                start_char,
                end_char: start_char + window.len(),
                content_preview: preview(window),
                paragraphs_count: count_paragraphs(&page),
            }
        })
        .collect()
}

fn preview(window: &[char]) -> String {
    if window.len() > PREVIEW_CHARS {
        let mut head: String = window[..PREVIEW_CHARS].iter().collect();
        head.push_str("...");
        head
    } else {
        window.iter().collect()
    }
}

/// Non-blank blocks separated by blank lines.
fn count_paragraphs(text: &str) -> usize {
    let mut count = 0;
    let mut in_paragraph = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            in_paragraph = false;
        } else if !in_paragraph {
            in_paragraph = true;
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_estimate() {
        assert_eq!(estimate_pages(0, 3000), 1);
        assert_eq!(estimate_pages(3000, 3000), 1);
        assert_eq!(estimate_pages(3001, 3000), 2);
        assert_eq!(estimate_pages(10, 0), 10);
    }

    #[test]
    fn pages_partition_the_text() {
        let text = "é".repeat(7005);
        let pages = paginate(&text, 3000);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].start_char, 0);
        for pair in pages.windows(2) {
            assert_eq!(pair[0].end_char, pair[1].start_char);
        }
        assert_eq!(pages[2].end_char, 7005);
        assert_eq!(pages[2].page_number, 3);
        assert_eq!(pages[0].content_preview.chars().count(), 103);
    }

    #[test]
    fn short_page_preview_is_verbatim() {
        let pages = paginate("short page", 3000);
        assert_eq!(pages[0].content_preview, "short page");
        assert_eq!(pages[0].paragraphs_count, 1);
    }

    #[test]
    fn paragraphs_counted_by_blank_lines() {
        assert_eq!(count_paragraphs("a\nb\n\n\nc\n  \nd"), 3);
        assert_eq!(count_paragraphs("   "), 0);
    }
}
