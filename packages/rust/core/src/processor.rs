//! Content processor: one [`SourceDocument`] in, one [`ProcessedDocument`] out.

use tracing::{debug, instrument, warn};

use mdmerge_markdown::{
    classify_lines, extract_headers, extract_keywords, normalize_whitespace, parse_front_matter,
    shift_header_levels, trim_leading_blank_lines,
};
use mdmerge_shared::{
    FrontMatterFields, FrontMatterPolicy, MergeConfiguration, MergeWarning, ProcessedDocument,
    SourceDocument, WarningKind,
};

use crate::duplicates::content_fingerprint;

/// Apply the front-matter policy, header shift and whitespace rules.
///
/// Non-fatal problems are appended to `warnings`; processing itself never fails.
#[instrument(skip_all, fields(path = %doc.path))]
pub fn process_document<'a>(
    doc: &'a SourceDocument,
    config: &MergeConfiguration,
    warnings: &mut Vec<MergeWarning>,
) -> ProcessedDocument<'a> {
    let policy = config.front_matter_policy;

    // Removed front matter must not leave a blank-line gap behind.
    let body = match (&doc.front_matter, policy) {
        (Some(_), FrontMatterPolicy::Strip | FrontMatterPolicy::ConvertToMetadata) => {
            trim_leading_blank_lines(&doc.body)
        }
        _ => doc.body.as_str(),
    };

    let (_, fence_open) = classify_lines(body);
    if fence_open {
        warn!(path = %doc.path, "code fence never closed");
        warnings.push(MergeWarning::new(
            &doc.path,
            WarningKind::UnbalancedFence,
            "code fence is never closed; the rest of the document is treated as code",
        ));
    }

    let shifted = shift_header_levels(body, config.header_level_shift);
    let processed_body = if config.normalize_whitespace {
        normalize_whitespace(&shifted, config.max_consecutive_blank_lines)
    } else {
        shifted
    };

    let headers = extract_headers(&processed_body);
    let keywords = config
        .extract_keywords
        .then(|| extract_keywords(&processed_body, config.max_keywords));

    let front_matter_fields = match (&doc.front_matter, policy) {
        (Some(fm), FrontMatterPolicy::ConvertToMetadata) => Some(match parse_front_matter(fm) {
            Ok(fields) => FrontMatterFields::Parsed(fields),
            Err(e) => {
                warn!(path = %doc.path, error = %e, "front matter kept as opaque text");
                warnings.push(MergeWarning::new(
                    &doc.path,
                    WarningKind::FrontMatterParse,
                    format!("front matter could not be parsed ({e}); carried as text"),
                ));
                FrontMatterFields::Opaque(fm.payload.clone())
            }
        }),
        _ => None,
    };

    let transformed_body = match (&doc.front_matter, policy) {
        (Some(fm), FrontMatterPolicy::Preserve) => {
            let mut text = fm.raw.clone();
            if !text.ends_with('\n') && !processed_body.is_empty() {
                text.push('\n');
            }
            text.push_str(&processed_body);
            text
        }
        _ => processed_body,
    };

    debug!(
        headers = headers.len(),
        bytes = transformed_body.len(),
        "document processed"
    );

    ProcessedDocument {
        document: doc,
        transformed_body,
        headers,
        content_hash: content_fingerprint(body),
        keywords,
        front_matter_fields,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    use crate::loader::document_from_text;

    fn load(text: &str) -> SourceDocument {
        document_from_text("docs/page.md", text, text.len() as u64, DateTime::<Utc>::UNIX_EPOCH)
            .document
    }

    fn config() -> MergeConfiguration {
        MergeConfiguration::default()
    }

    #[test]
    fn shift_is_clamped() {
        let doc = load("###### Six\n# One\n");
        let mut warnings = Vec::new();

        let up = process_document(&doc, &MergeConfiguration { header_level_shift: 2, ..config() }, &mut warnings);
        assert_eq!(up.transformed_body, "###### Six\n### One\n");

        let down = process_document(&doc, &MergeConfiguration { header_level_shift: -3, ..config() }, &mut warnings);
        assert_eq!(down.transformed_body, "### Six\n# One\n");
        assert_eq!(down.headers[1].level, 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn fenced_lines_are_not_headers() {
        let doc = load("# Real\n```\n# not a header\n```\n");
        let mut warnings = Vec::new();
        let processed =
            process_document(&doc, &MergeConfiguration { header_level_shift: 1, ..config() }, &mut warnings);

        assert_eq!(processed.headers.len(), 1);
        assert_eq!(processed.headers[0].text, "Real");
        assert!(processed.transformed_body.contains("\n# not a header\n"));
    }

    #[test]
    fn whitespace_normalized_outside_fences() {
        let doc = load("Intro\n\n\n\n\n\nNext\n```\na\n\n\n\n\nb\n```\n");
        let mut warnings = Vec::new();
        let processed = process_document(&doc, &config(), &mut warnings);
        assert_eq!(
            processed.transformed_body,
            "Intro\n\n\nNext\n```\na\n\n\n\n\nb\n```\n"
        );
    }

    #[test]
    fn strip_leaves_no_blank_line_artifact() {
        let doc = load("---\ntitle: T\n---\n\n\n# Body\n");
        let mut warnings = Vec::new();
        let processed = process_document(
            &doc,
            &MergeConfiguration { normalize_whitespace: false, ..config() },
            &mut warnings,
        );
        assert_eq!(processed.transformed_body, "# Body\n");
        assert!(processed.front_matter_fields.is_none());
    }

    #[test]
    fn preserve_keeps_block_byte_identical() {
        let doc = load("---\ntitle:   Spaced  \n---\n# Body\n");
        let mut warnings = Vec::new();
        let processed = process_document(
            &doc,
            &MergeConfiguration { front_matter_policy: FrontMatterPolicy::Preserve, ..config() },
            &mut warnings,
        );
        assert!(processed.transformed_body.starts_with("---\ntitle:   Spaced  \n---\n"));
        assert_eq!(processed.transformed_body, "---\ntitle:   Spaced  \n---\n# Body\n");
        assert_eq!(processed.headers.len(), 1);
    }

    #[test]
    fn convert_parses_fields() {
        let doc = load("---\ntitle: Guide\ntags: [a, b]\n---\nBody\n");
        let mut warnings = Vec::new();
        let processed = process_document(
            &doc,
            &MergeConfiguration { front_matter_policy: FrontMatterPolicy::ConvertToMetadata, ..config() },
            &mut warnings,
        );
        assert_eq!(processed.transformed_body, "Body\n");
        match processed.front_matter_fields {
            Some(FrontMatterFields::Parsed(fields)) => assert_eq!(fields["title"], "Guide"),
            other => panic!("expected parsed fields, got {other:?}"),
        }
        assert!(warnings.is_empty());
    }

    #[test]
    fn convert_parse_failure_degrades_to_opaque() {
        let doc = load("---\nnot a mapping\n---\nBody\n");
        let mut warnings = Vec::new();
        let processed = process_document(
            &doc,
            &MergeConfiguration { front_matter_policy: FrontMatterPolicy::ConvertToMetadata, ..config() },
            &mut warnings,
        );
        assert_eq!(
            processed.front_matter_fields,
            Some(FrontMatterFields::Opaque("not a mapping".into()))
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::FrontMatterParse);
    }

    #[test]
    fn unbalanced_fence_warns() {
        let doc = load("# Top\n```rust\nfn main() {}\n");
        let mut warnings = Vec::new();
        process_document(&doc, &config(), &mut warnings);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::UnbalancedFence);
    }

    #[test]
    fn keywords_only_when_enabled() {
        let doc = load("# Parser\nThe parser parses tokens.\n");
        let mut warnings = Vec::new();
        assert!(process_document(&doc, &config(), &mut warnings).keywords.is_none());

        let processed = process_document(
            &doc,
            &MergeConfiguration { extract_keywords: true, max_keywords: 2, ..config() },
            &mut warnings,
        );
        assert_eq!(processed.keywords.unwrap(), vec!["parser", "parses"]);
    }

    #[test]
    fn hash_ignores_front_matter() {
        let with = load("---\ntitle: A\n---\nSame\n");
        let without = load("Same\n");
        let mut warnings = Vec::new();
        let a = process_document(&with, &config(), &mut warnings);
        let b = process_document(&without, &config(), &mut warnings);
        assert_eq!(a.content_hash, b.content_hash);
    }
}
