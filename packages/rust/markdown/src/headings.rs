//! ATX heading recognition, level shifting, and extraction.
//!
//! A heading is 1-6 `#` characters in column 0, then whitespace, then
//! non-empty text. Lines inside fenced code are never headings.

use mdmerge_shared::Header;

use crate::fence::{FenceTracker, LineKind};

/// A heading recognized on a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtxHeading<'a> {
    pub level: u8,
    /// Text after the markers, surrounding whitespace removed.
    pub text: &'a str,
}

/// Recognize an ATX heading. Does not consider fence state.
pub fn parse_atx(line: &str) -> Option<AtxHeading<'_>> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some(AtxHeading {
        level: hashes as u8,
        text,
    })
}

/// Apply `delta` to a heading level, clamped to 1..=6.
pub fn shift_level(level: u8, delta: i32) -> u8 {
    (i32::from(level) + delta).clamp(1, 6) as u8
}

/// Shift every heading outside fenced code by `delta` levels.
pub fn shift_header_levels(text: &str, delta: i32) -> String {
    if delta == 0 {
        return text.to_string();
    }

    let mut tracker = FenceTracker::new();
    text.split('\n')
        .map(|line| {
            if tracker.classify(line) != LineKind::Text {
                return line.to_string();
            }
            match parse_atx(line) {
                Some(heading) => {
                    let level = shift_level(heading.level, delta);
                    format!("{}{}", "#".repeat(level as usize), &line[heading.level as usize..])
                }
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Record every heading outside fenced code, in document order.
pub fn extract_headers(text: &str) -> Vec<Header> {
    let mut tracker = FenceTracker::new();
    text.split('\n')
        .filter(|line| tracker.classify(line) == LineKind::Text)
        .filter_map(parse_atx)
        .enumerate()
        .map(|(source_order, heading)| Header {
            level: heading.level,
            text: heading.text.to_string(),
            source_order,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_atx_requires_space_and_text() {
        assert_eq!(
            parse_atx("## Setup  "),
            Some(AtxHeading {
                level: 2,
                text: "Setup"
            })
        );
        assert_eq!(parse_atx("#hashtag"), None);
        assert_eq!(parse_atx("####### seven"), None);
        assert_eq!(parse_atx("#   "), None);
        assert_eq!(parse_atx(" # indented"), None);
        assert_eq!(parse_atx("#\tTabbed").map(|h| h.text), Some("Tabbed"));
    }

    #[test]
    fn shift_is_clamped() {
        assert_eq!(shift_header_levels("###### Deep", 2), "###### Deep");
        assert_eq!(shift_header_levels("# Top", -3), "# Top");
        assert_eq!(shift_header_levels("# H1\n## H2", 1), "## H1\n### H2");
    }

    #[test]
    fn shift_skips_fenced_code() {
        let text = "# Real\n```\n# not a header\n```\n~~~\n## also not\n~~~";
        let shifted = shift_header_levels(text, 1);
        assert_eq!(
            shifted,
            "## Real\n```\n# not a header\n```\n~~~\n## also not\n~~~"
        );
    }

    #[test]
    fn extract_headers_in_order_outside_fences() {
        let text = "# Title\ntext\n```\n# not a header\n```\n## Usage\n### Flags #";
        let headers = extract_headers(text);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0].text, "Title");
        assert_eq!(headers[1].level, 2);
        assert_eq!(headers[2].text, "Flags #");
        assert_eq!(headers[2].source_order, 2);
    }
}
