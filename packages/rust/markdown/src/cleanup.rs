//! Whitespace cleanup passes for document bodies.
//!
//! Every pass is fence-aware: lines inside fenced code blocks are copied
//! verbatim and never count toward blank-line runs.

use crate::fence::{LineKind, classify_lines};

/// Normalize whitespace in a document body.
///
/// - trailing whitespace is stripped from every line outside fences
/// - runs of blank lines longer than `max_blank_lines` are cut to that length
/// - leading and trailing blank lines are dropped
/// - a non-empty result ends with exactly one `\n`
pub fn normalize_whitespace(text: &str, max_blank_lines: usize) -> String {
    // The final terminator does not start another line.
    let text = text.strip_suffix('\n').unwrap_or(text);
    let (lines, _) = classify_lines(text);

    // (line, protected) pairs; protected lines are fenced content.
    let mut kept: Vec<(&str, bool)> = Vec::with_capacity(lines.len());
    let mut blank_run = 0usize;

    for (line, kind) in lines {
        if kind == LineKind::Code {
            kept.push((line, true));
            blank_run = 0;
            continue;
        }

        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run > max_blank_lines {
                continue;
            }
        } else {
            blank_run = 0;
        }
        kept.push((trimmed, false));
    }

    let is_droppable = |entry: &(&str, bool)| !entry.1 && entry.0.is_empty();
    let start = kept.iter().position(|e| !is_droppable(e)).unwrap_or(kept.len());
    let end = kept.iter().rposition(|e| !is_droppable(e)).map_or(start, |i| i + 1);

    if start == end {
        return String::new();
    }

    let mut body = kept[start..end]
        .iter()
        .map(|(line, _)| *line)
        .collect::<Vec<_>>()
        .join("\n");
    body.push('\n');
    body
}

/// Drop blank lines at the start of `text`.
pub fn trim_leading_blank_lines(text: &str) -> &str {
    let mut rest = text;
    while let Some(newline) = rest.find('\n') {
        if rest[..newline].trim().is_empty() {
            rest = &rest[newline + 1..];
        } else {
            break;
        }
    }
    if rest.trim().is_empty() { "" } else { rest }
}

/// Ensure non-empty text ends with exactly one newline.
pub fn ensure_trailing_newline(text: &str) -> String {
    let trimmed = text.trim_end_matches('\n');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Convert `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_blank_runs_to_limit() {
        let input = "Line 1\n\n\n\n\n\nLine 2\n";
        assert_eq!(normalize_whitespace(input, 2), "Line 1\n\n\nLine 2\n");
        assert_eq!(normalize_whitespace(input, 0), "Line 1\nLine 2\n");
    }

    #[test]
    fn fenced_content_is_untouched() {
        let input = "```\ncode   \n\n\n\n\n  indented\n```\n\n\n\n\nafter";
        let result = normalize_whitespace(input, 1);
        assert_eq!(
            result,
            "```\ncode   \n\n\n\n\n  indented\n```\n\nafter\n"
        );
    }

    #[test]
    fn trims_trailing_whitespace_and_edges() {
        let input = "\n\n  \nText   \nMore\t\n\n\n";
        assert_eq!(normalize_whitespace(input, 2), "Text\nMore\n");
    }

    #[test]
    fn unterminated_fence_keeps_its_lines() {
        let input = "```\ncode\n\n";
        assert_eq!(normalize_whitespace(input, 2), "```\ncode\n\n");
    }

    #[test]
    fn unterminated_fence_is_stable_across_passes() {
        let once = normalize_whitespace("```\ncode\n", 2);
        assert_eq!(once, "```\ncode\n");
        assert_eq!(normalize_whitespace(&once, 2), once);
    }

    #[test]
    fn empty_body_normalizes_to_empty() {
        assert_eq!(normalize_whitespace("\n\n   \n", 2), "");
    }

    #[test]
    fn trim_leading_blank_lines_stops_at_content() {
        assert_eq!(trim_leading_blank_lines("\n  \n# Heading\n\nText"), "# Heading\n\nText");
        assert_eq!(trim_leading_blank_lines("\n\n"), "");
        assert_eq!(trim_leading_blank_lines("Text"), "Text");
    }

    #[test]
    fn ensure_trailing_newline_normalizes_multiple() {
        assert_eq!(ensure_trailing_newline("Content\n\n\n"), "Content\n");
        assert_eq!(ensure_trailing_newline("Content"), "Content\n");
    }

    #[test]
    fn line_endings_become_lf() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }
}
