//! Line-level markdown primitives for the merge engine.
//!
//! This is not a markdown parser. Each module is a single linear pass over
//! `\n`-separated lines with explicit fence tracking:
//! - [`fence`] - fenced code block state
//! - [`headings`] - ATX heading recognition, level shifting, extraction
//! - [`frontmatter`] - leading front-matter split and payload parsing
//! - [`cleanup`] - whitespace and line-ending normalization
//! - [`keywords`] - frequency-based keyword extraction

pub mod cleanup;
pub mod fence;
pub mod frontmatter;
pub mod headings;
pub mod keywords;

pub use cleanup::{
    ensure_trailing_newline, normalize_line_endings, normalize_whitespace,
    trim_leading_blank_lines,
};
pub use fence::{FenceTracker, LineKind, classify_lines};
pub use frontmatter::{FrontMatterError, FrontMatterSplit, parse_front_matter, split_front_matter};
pub use headings::{AtxHeading, extract_headers, parse_atx, shift_header_levels, shift_level};
pub use keywords::extract_keywords;
