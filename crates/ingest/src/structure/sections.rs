//! Heading detection and hierarchy resolution.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use noa_core::Section;
use regex::Regex;

static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid markdown heading regex"));

static DECIMAL_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*\.|\d+\.\d+(?:\.\d+)+)\s+(.+)$").expect("valid decimal heading regex")
});

static LABELED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Chapter|Capítulo|Sección|Section)\s+\d+:?\s+(.+)$")
        .expect("valid labeled heading regex")
});

/// Heading shapes, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeadingPattern {
    /// `#` to `######`; level is the number of hashes.
    Markdown,
    /// `1.`, `1.2.`, `1.2.3`; level is the numbering depth. Without a
    /// trailing dot at least three components are required, so `3.5 million`
    /// is prose.
    Decimal,
    /// `Chapter 3: ...`, `Capítulo 3 ...`, `Sección 2: ...`; always level 1.
    Labeled,
}

impl HeadingPattern {
    pub(crate) const ALL: [HeadingPattern; 3] = [
        HeadingPattern::Markdown,
        HeadingPattern::Decimal,
        HeadingPattern::Labeled,
    ];

    /// `(level, title)` when `line` is a heading of this shape.
    pub(crate) fn match_line(&self, line: &str) -> Option<(usize, String)> {
        match self {
            HeadingPattern::Markdown => {
                let caps = MARKDOWN_HEADING.captures(line)?;
                let level = caps[1].len();
                let title = strip_closing_hashes(caps[2].trim());
                (!title.is_empty()).then(|| (level, title.to_string()))
            }
            HeadingPattern::Decimal => {
                let caps = DECIMAL_HEADING.captures(line)?;
                let level = caps[1].split('.').filter(|part| !part.is_empty()).count();
                Some((level.max(1), caps[2].trim().to_string()))
            }
            HeadingPattern::Labeled => {
                let caps = LABELED_HEADING.captures(line)?;
                Some((1, caps[1].trim().to_string()))
            }
        }
    }
}

/// `## Title ##` → `Title`; `C#` stays `C#`.
fn strip_closing_hashes(title: &str) -> &str {
    let stripped = title.trim_end_matches('#');
    if stripped.is_empty() {
        ""
    } else if stripped.ends_with(char::is_whitespace) {
        stripped.trim_end()
    } else {
        title
    }
}

/// First matching pattern wins.
pub(crate) fn match_heading(line: &str) -> Option<(usize, String)> {
    HeadingPattern::ALL.iter().find_map(|p| p.match_line(line))
}

/// Scan cleaned lines for headings. `total_pages` drives page estimates.
pub(crate) fn detect_sections(lines: &[String], total_pages: usize) -> Vec<Section> {
    let line_count = lines.len().max(1);
    let total_pages = total_pages.max(1);

    let mut sections: Vec<Section> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .filter_map(|(i, line)| {
            let (level, title) = match_heading(line)?;
            let position = i as f64 / line_count as f64;
            let estimated_page = ((position * total_pages as f64) as usize + 1).min(total_pages);
            Some(Section {
                title,
                level,
                line_number: i + 1,
                estimated_page,
                position_percentage: (position * 100.0 * 100.0).round() / 100.0,
                parent_section: String::new(),
            })
        })
        .collect();

    resolve_hierarchy(&mut sections);
    sections
}

/// Sort by position, then give each section the title of the most recent
/// section seen at the nearest shallower level. Every level keeps its latest
/// title for the rest of the document. Top-level sections get `""`.
pub(crate) fn resolve_hierarchy(sections: &mut [Section]) {
    sections.sort_by(|a, b| a.position_percentage.total_cmp(&b.position_percentage));

    let mut recent: BTreeMap<usize, String> = BTreeMap::new();
    for section in sections.iter_mut() {
        let level = section.level;
        section.parent_section = recent
            .range(1..level)
            .next_back()
            .map(|(_, title)| title.clone())
            .unwrap_or_default();
        recent.insert(level, section.title.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn markdown_levels() {
        assert_eq!(match_heading("# Intro"), Some((1, "Intro".into())));
        assert_eq!(match_heading("### Deep ###"), Some((3, "Deep".into())));
        assert_eq!(match_heading("## Using C#"), Some((2, "Using C#".into())));
        assert_eq!(match_heading("####### too deep"), None);
        assert_eq!(match_heading("#hashtag"), None);
        assert_eq!(match_heading("## ##"), None);
    }

    #[test]
    fn decimal_levels() {
        assert_eq!(match_heading("1. Scope"), Some((1, "Scope".into())));
        assert_eq!(match_heading("2.3. Details"), Some((2, "Details".into())));
        assert_eq!(match_heading("4.1.2 Edge cases"), Some((3, "Edge cases".into())));
        assert_eq!(match_heading("42 is the answer"), None);
    }

    #[test]
    fn decimal_prose_is_not_a_heading() {
        assert_eq!(match_heading("3.5 million people attended the event"), None);
        assert_eq!(match_heading("2.0 release notes follow"), None);
        assert_eq!(match_heading("3.5. Attendance"), Some((2, "Attendance".into())));
    }

    #[test]
    fn labeled_headings() {
        assert_eq!(match_heading("Capítulo 2: Historia"), Some((1, "Historia".into())));
        assert_eq!(match_heading("Chapter 10 The End"), Some((1, "The End".into())));
        assert_eq!(match_heading("Sección 3 Métodos"), Some((1, "Métodos".into())));
        assert_eq!(match_heading("chapter 1: lower"), None);
    }

    #[test]
    fn first_pattern_wins() {
        // Markdown takes priority over the labeled form inside it.
        assert_eq!(match_heading("## Chapter 1: Start"), Some((2, "Chapter 1: Start".into())));
    }

    #[test]
    fn hierarchy_walks_up_to_nearest_ancestor() {
        let text = "# A\ntext\n## B\n#### D\n### C\n# E\n### F";
        let sections = detect_sections(&lines(text), 1);
        let parents: Vec<(&str, &str)> = sections
            .iter()
            .map(|s| (s.title.as_str(), s.parent_section.as_str()))
            .collect();
        assert_eq!(
            parents,
            vec![("A", ""), ("B", "A"), ("D", "B"), ("C", "B"), ("E", ""), ("F", "B")]
        );
    }

    #[test]
    fn shallower_heading_keeps_earlier_deeper_titles() {
        let sections = detect_sections(&lines("# A
## B
# E
### F"), 1);
        assert_eq!(sections[3].title, "F");
        assert_eq!(sections[3].parent_section, "B");
        assert_eq!(sections[2].parent_section, "");
    }

    #[test]
    fn positions_and_pages() {
        let mut text = vec!["# First".to_string()];
        text.extend((0..8).map(|i| format!("line {i}")));
        text.push("# Second".to_string());
        let sections = detect_sections(&text, 4);
        assert_eq!(sections[0].position_percentage, 0.0);
        assert_eq!(sections[0].estimated_page, 1);
        assert_eq!(sections[1].line_number, 10);
        assert_eq!(sections[1].position_percentage, 90.0);
        assert_eq!(sections[1].estimated_page, 4);
    }

    #[test]
    fn two_decimal_rounding() {
        let mut text: Vec<String> = (0..3).map(|i| format!("p{i}")).collect();
        text[1] = "1. One".into();
        let sections = detect_sections(&text, 1);
        assert_eq!(sections[0].position_percentage, 33.33);
    }
}
