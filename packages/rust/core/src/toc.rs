//! TOC (Table of Contents) builder.
//!
//! Collects headers from the processed documents in final order, assigns each
//! a collision-free anchor, and renders the block in one of three styles.

use std::collections::HashSet;

use tracing::{debug, instrument};

use mdmerge_shared::{ProcessedDocument, TocEntry, TocStyle};

/// Slug used when a header's text has no anchor-safe characters at all.
const EMPTY_SLUG: &str = "section";

/// Build TOC entries for every header with `level <= depth`.
///
/// Entries follow document order, then header order within a document.
/// Anchor registration is sequential over that order, so the first
/// occurrence of a repeated header keeps the unsuffixed anchor.
#[instrument(skip_all, fields(documents = docs.len(), depth = depth))]
pub fn build_toc(docs: &[ProcessedDocument<'_>], depth: u8) -> Vec<TocEntry> {
    let mut anchors = AnchorRegistry::default();
    let mut entries = Vec::new();

    for (document_index, doc) in docs.iter().enumerate() {
        for header in doc.headers.iter().filter(|h| h.level <= depth) {
            entries.push(TocEntry {
                level: header.level,
                text: header.text.clone(),
                anchor: anchors.register(&slugify_anchor(&header.text)),
                document_index,
            });
        }
    }

    debug!(entries = entries.len(), "TOC built from document headers");
    entries
}

/// Render the TOC block without a trailing newline.
///
/// Returns `None` when there are no entries; an empty `title` omits the
/// title line.
pub fn render_toc(entries: &[TocEntry], style: TocStyle, title: &str) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(entries.len() + 2);
    if !title.is_empty() {
        lines.push(format!("# {title}"));
        lines.push(String::new());
    }

    for (position, entry) in entries.iter().enumerate() {
        lines.push(match style {
            TocStyle::Links => format!("- [{}](#{})", escape_link_text(&entry.text), entry.anchor),
            TocStyle::Plain => format!("- {}", entry.text),
            TocStyle::Numbered => format!("{}. {}", position + 1, entry.text),
        });
    }

    Some(lines.join("\n"))
}

/// Backslash-escape the characters that would end or nest link text.
fn escape_link_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Derive a URL-fragment slug from header text.
///
/// Lower-cases, turns whitespace runs into single hyphens, drops anything
/// outside `[a-z0-9-]`, then collapses repeated hyphens.
pub fn slugify_anchor(text: &str) -> String {
    let mut hyphenated = String::with_capacity(text.len());
    let mut in_whitespace = false;
    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                hyphenated.push('-');
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                hyphenated.push(c);
            }
        }
    }

    let mut slug = String::with_capacity(hyphenated.len());
    for c in hyphenated.chars() {
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug
}

// ---------------------------------------------------------------------------
// Anchor registry
// ---------------------------------------------------------------------------

/// The growing set of anchors handed out during one merge.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    taken: HashSet<String>,
}

impl AnchorRegistry {
    /// Register `slug`, suffixing `-2`, `-3`, ... with the first unused integer.
    pub fn register(&mut self, slug: &str) -> String {
        let base = if slug.is_empty() { EMPTY_SLUG } else { slug };

        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }

        let mut n = 2usize;
        loop {
            let candidate = format!("{base}-{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
