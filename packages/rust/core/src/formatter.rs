//! Document formatter: renders one processed document as its output block.
//!
//! A block is, in order: metadata comment, opening `<document>` tag, chunk
//! boundary marker, header line, annotation lines, body, closing tag. Each
//! piece is optional except the header line. The block depends only on the
//! document, its position and the total count.

use serde::Serialize;
use serde_json::Value;

use mdmerge_shared::{FrontMatterFields, MergeConfiguration, ProcessedDocument};

/// Placeholder substituted with the display name in the header template.
const NAME_PLACEHOLDER: &str = "{name}";

/// Stable per-document identifier, e.g. `doc_0003` for index 3.
pub fn document_id(index: usize) -> String {
    format!("doc_{index:04}")
}

/// Render the block for `doc`, which sits at 1-based `index` of `total`.
///
/// The result has no trailing newline.
pub fn format_document(
    doc: &ProcessedDocument<'_>,
    index: usize,
    total: usize,
    config: &MergeConfiguration,
) -> String {
    let source = doc.document;
    let id = document_id(index);
    let mut lines: Vec<String> = Vec::new();

    if config.include_metadata {
        lines.push(metadata_comment(doc, index, config));
    }
    if config.semantic_markers {
        lines.push(format!(
            "<document id=\"{id}\" source=\"{}\">",
            escape_attribute(&source.path)
        ));
    }
    if config.chunk_hints {
        lines.push(format!("<!-- CHUNK_BOUNDARY: {id} -->"));
    }

    lines.push(
        config
            .header_template
            .replace(NAME_PLACEHOLDER, &source.display_name()),
    );
    if config.include_source_path {
        lines.push(format!("*Source: `{}`*", source.path));
    }
    if config.include_document_index {
        lines.push(format!("*Document {index} of {total}*"));
    }

    let body = doc.transformed_body.trim_end_matches('\n');
    if !body.is_empty() {
        lines.push(String::new());
        lines.push(body.to_string());
    }

    if config.semantic_markers {
        lines.push("</document>".to_string());
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Metadata comment
// ---------------------------------------------------------------------------

/// Fields of the `DOC_META` comment, serialized in declaration order.
#[derive(Serialize)]
struct DocumentMeta<'a> {
    source: &'a str,
    index: usize,
    size: u64,
    modified: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    keywords: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    front_matter: Option<Value>,
}

fn metadata_comment(doc: &ProcessedDocument<'_>, index: usize, config: &MergeConfiguration) -> String {
    let meta = DocumentMeta {
        source: &doc.document.path,
        index,
        size: doc.document.size_bytes,
        modified: doc.document.modified.format("%Y-%m-%d").to_string(),
        keywords: if config.extract_keywords {
            doc.keywords.as_deref()
        } else {
            None
        },
        front_matter: doc.front_matter_fields.as_ref().map(|fields| match fields {
            FrontMatterFields::Parsed(map) => Value::Object(map.clone()),
            FrontMatterFields::Opaque(text) => Value::String(text.clone()),
        }),
    };

    // Serializing plain strings, numbers and maps cannot fail.
    let json = serde_json::to_string(&meta).unwrap_or_default();
    format!("<!-- DOC_META: {} -->", json.replace("--", "-\\u002d"))
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mdmerge_shared::SourceDocument;

    fn source(path: &str) -> SourceDocument {
        SourceDocument {
            path: path.into(),
            raw_content: String::new(),
            front_matter: None,
            body: String::new(),
            size_bytes: 120,
            modified: Utc.with_ymd_and_hms(2024, 5, 17, 22, 30, 0).unwrap(),
        }
    }

    fn processed<'a>(doc: &'a SourceDocument, body: &str) -> ProcessedDocument<'a> {
        ProcessedDocument {
            document: doc,
            transformed_body: body.into(),
            headers: vec![],
            content_hash: String::new(),
            keywords: Some(vec!["rust".into(), "merge".into()]),
            front_matter_fields: None,
        }
    }

    fn bare() -> MergeConfiguration {
        MergeConfiguration {
            include_metadata: false,
            semantic_markers: false,
            include_document_index: false,
            ..MergeConfiguration::default()
        }
    }

    #[test]
    fn default_block_layout() {
        let doc = source("notes/intro.md");
        let block = format_document(&processed(&doc, "Hello\n"), 3, 12, &MergeConfiguration::default());
        assert_eq!(
            block,
            "<!-- DOC_META: {\"source\":\"notes/intro.md\",\"index\":3,\"size\":120,\"modified\":\"2024-05-17\"} -->\n\
             <document id=\"doc_0003\" source=\"notes/intro.md\">\n\
             ## intro\n\
             *Document 3 of 12*\n\
             \n\
             Hello\n\
             </document>"
        );
    }

    #[test]
    fn all_annotations_in_order() {
        let doc = source("a.md");
        let config = MergeConfiguration {
            include_metadata: false,
            chunk_hints: true,
            include_source_path: true,
            header_template: "# Doc: {name}".into(),
            ..MergeConfiguration::default()
        };
        let block = format_document(&processed(&doc, "Body"), 1, 2, &config);
        assert_eq!(
            block,
            "<document id=\"doc_0001\" source=\"a.md\">\n\
             <!-- CHUNK_BOUNDARY: doc_0001 -->\n\
             # Doc: a\n\
             *Source: `a.md`*\n\
             *Document 1 of 2*\n\
             \n\
             Body\n\
             </document>"
        );
    }

    #[test]
    fn empty_body_has_no_blank_line() {
        let doc = source("empty.md");
        assert_eq!(format_document(&processed(&doc, ""), 1, 1, &bare()), "## empty");
    }

    #[test]
    fn metadata_includes_keywords_and_front_matter() {
        let doc = source("a.md");
        let mut p = processed(&doc, "x");
        let mut fields = serde_json::Map::new();
        fields.insert("title".into(), Value::String("A -- B".into()));
        p.front_matter_fields = Some(FrontMatterFields::Parsed(fields));

        let config = MergeConfiguration {
            extract_keywords: true,
            ..MergeConfiguration::default()
        };
        let block = format_document(&p, 1, 1, &config);
        let first = block.lines().next().unwrap();
        assert_eq!(
            first,
            "<!-- DOC_META: {\"source\":\"a.md\",\"index\":1,\"size\":120,\"modified\":\"2024-05-17\",\
             \"keywords\":[\"rust\",\"merge\"],\"front_matter\":{\"title\":\"A -\\u002d B\"}} -->"
        );
        assert_eq!(first.matches("--").count(), 2);
    }

    #[test]
    fn source_attribute_is_escaped() {
        let doc = source("we \"quote\" & <tag>.md");
        let config = MergeConfiguration {
            include_metadata: false,
            ..MergeConfiguration::default()
        };
        let block = format_document(&processed(&doc, "x"), 1, 1, &config);
        assert!(block.starts_with(
            "<document id=\"doc_0001\" source=\"we &quot;quote&quot; &amp; &lt;tag&gt;.md\">"
        ));
    }

    #[test]
    fn document_id_is_zero_padded() {
        assert_eq!(document_id(7), "doc_0007");
        assert_eq!(document_id(12345), "doc_12345");
    }
}
