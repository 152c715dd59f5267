//! Output assembler.
//!
//! Joins the TOC block and formatted document blocks with the configured
//! separator, applies the output line ending, and encodes the result.

use tracing::{debug, instrument};

use mdmerge_markdown::ensure_trailing_newline;
use mdmerge_shared::{LineEnding, MergeConfiguration, Result, TextEncoding, TocPosition};

/// The text placed between two consecutive blocks.
///
/// `blank_lines` blank lines on each side of `separator`; an empty separator
/// leaves just the blank lines.
pub fn separator_joint(separator: &str, blank_lines: usize) -> String {
    let gap = "\n".repeat(blank_lines + 1);
    if separator.is_empty() {
        gap
    } else {
        format!("{gap}{separator}{gap}")
    }
}

/// Join blocks into the merged text (LF line endings).
///
/// With no document blocks the output is empty, TOC included. Otherwise the
/// text ends with exactly one newline.
pub fn assemble_text(toc_block: Option<&str>, blocks: &[String], config: &MergeConfiguration) -> String {
    if blocks.is_empty() {
        return String::new();
    }

    let mut parts: Vec<&str> = Vec::with_capacity(blocks.len() + 1);
    if let (Some(toc), TocPosition::Top) = (toc_block, config.toc_position) {
        parts.push(toc);
    }
    parts.extend(blocks.iter().map(String::as_str));
    if let (Some(toc), TocPosition::Bottom) = (toc_block, config.toc_position) {
        parts.push(toc);
    }

    let joint = separator_joint(&config.separator, config.separator_blank_lines);
    ensure_trailing_newline(&parts.join(&joint))
}

/// Rewrite `\n` line endings to the configured terminator.
pub fn apply_line_ending(text: &str, line_ending: LineEnding) -> String {
    match line_ending {
        LineEnding::Lf => text.to_string(),
        LineEnding::Crlf => text.replace('\n', line_ending.as_str()),
    }
}

/// Assemble, apply line endings, and encode in one step.
///
/// Fails with `MergeError::Encode` when the text is not representable in
/// `encoding`.
#[instrument(skip_all, fields(blocks = blocks.len(), encoding = encoding.name()))]
pub fn assemble_output(
    toc_block: Option<&str>,
    blocks: &[String],
    config: &MergeConfiguration,
    encoding: TextEncoding,
) -> Result<Vec<u8>> {
    let text = assemble_text(toc_block, blocks, config);
    let text = apply_line_ending(&text, config.line_ending);
    let bytes = encoding.encode(&text)?;
    debug!(bytes = bytes.len(), "output encoded");
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mdmerge_shared::MergeError;

    fn blocks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn joint_frames_separator_with_blank_lines() {
        assert_eq!(separator_joint("---", 2), "\n\n\n---\n\n\n");
        assert_eq!(separator_joint("---", 0), "\n---\n");
        assert_eq!(separator_joint("", 1), "\n\n");
    }

    #[test]
    fn toc_top_and_bottom() {
        let config = MergeConfiguration {
            separator_blank_lines: 1,
            ..MergeConfiguration::default()
        };
        let top = assemble_text(Some("TOC"), &blocks(&["A", "B"]), &config);
        assert_eq!(top, "TOC\n\n---\n\nA\n\n---\n\nB\n");

        let config = MergeConfiguration {
            toc_position: TocPosition::Bottom,
            ..config
        };
        let bottom = assemble_text(Some("TOC"), &blocks(&["A", "B"]), &config);
        assert_eq!(bottom, "A\n\n---\n\nB\n\n---\n\nTOC\n");
    }

    #[test]
    fn no_blocks_means_empty_output() {
        let config = MergeConfiguration::default();
        assert_eq!(assemble_text(Some("TOC"), &[], &config), "");
    }

    #[test]
    fn single_trailing_newline() {
        let config = MergeConfiguration::default();
        assert_eq!(assemble_text(None, &blocks(&["A\n\n"]), &config), "A\n");
    }

    #[test]
    fn crlf_output() {
        let config = MergeConfiguration {
            separator: String::new(),
            separator_blank_lines: 0,
            line_ending: LineEnding::Crlf,
            ..MergeConfiguration::default()
        };
        let bytes = assemble_output(None, &blocks(&["A", "B"]), &config, TextEncoding::UTF_8).unwrap();
        assert_eq!(bytes, b"A\r\nB\r\n");
    }

    #[test]
    fn unrepresentable_text_is_encode_error() {
        let ascii = TextEncoding::for_label("ascii").unwrap();
        let config = MergeConfiguration::default();
        let err = assemble_output(None, &blocks(&["caf\u{e9}"]), &config, ascii).unwrap_err();
        assert!(matches!(err, MergeError::Encode { .. }));
    }
}
