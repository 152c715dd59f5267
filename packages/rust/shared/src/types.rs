//! Core domain types for a merge run.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SourceDocument
// ---------------------------------------------------------------------------

/// Which delimiter opened a front-matter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrontMatterDelimiter {
    /// `---`, YAML-like payload.
    Dashes,
    /// `+++`, TOML payload.
    Pluses,
}

/// A front-matter block found at the very start of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub delimiter: FrontMatterDelimiter,
    /// The block exactly as it appeared, delimiters and trailing newline included.
    pub raw: String,
    /// The lines between the delimiters.
    pub payload: String,
}

/// One loaded input document. Never mutated after load.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Identifier of the source, normally the path it was read from.
    pub path: String,
    /// Decoded text with line endings normalized to `\n`.
    pub raw_content: String,
    pub front_matter: Option<FrontMatter>,
    /// Text after the front-matter block (or all of it when there is none).
    pub body: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

impl SourceDocument {
    /// Name shown in headers and used for sorting (the file stem).
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }
}

/// File name without extension, falling back to the whole path.
pub fn display_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| path.to_string())
}

// ---------------------------------------------------------------------------
// ProcessedDocument
// ---------------------------------------------------------------------------

/// A header line recorded after level shifting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub level: u8,
    pub text: String,
    /// Position among the document's headers, starting at 0.
    pub source_order: usize,
}

/// Front-matter fields destined for the metadata comment.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontMatterFields {
    Parsed(serde_json::Map<String, serde_json::Value>),
    /// The payload could not be parsed and is carried as-is.
    Opaque(String),
}

/// A document after header shifting, normalization and analysis.
#[derive(Debug, Clone)]
pub struct ProcessedDocument<'a> {
    pub document: &'a SourceDocument,
    pub transformed_body: String,
    pub headers: Vec<Header>,
    /// Hex SHA-256 over the normalized body, front matter excluded.
    pub content_hash: String,
    /// Present when keyword extraction is enabled.
    pub keywords: Option<Vec<String>>,
    /// Present under `convert-to-metadata` when the document had front matter.
    pub front_matter_fields: Option<FrontMatterFields>,
}

// ---------------------------------------------------------------------------
// TocEntry
// ---------------------------------------------------------------------------

/// One line of the merged table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    /// Unique across the whole merge.
    pub anchor: String,
    /// 0-based position of the owning document in final order.
    pub document_index: usize,
}

// ---------------------------------------------------------------------------
// Warnings and results
// ---------------------------------------------------------------------------

/// Category of a non-fatal problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The file did not decode and was left out of the output.
    DecodeError,
    DuplicateContent,
    UnterminatedFrontMatter,
    FrontMatterParse,
    UnbalancedFence,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::DecodeError => "decode error",
            Self::DuplicateContent => "duplicate content",
            Self::UnterminatedFrontMatter => "unterminated front matter",
            Self::FrontMatterParse => "front matter parse",
            Self::UnbalancedFence => "unbalanced code fence",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeWarning {
    pub document_path: String,
    pub kind: WarningKind,
    pub message: String,
}

impl MergeWarning {
    pub fn new(document_path: impl Into<String>, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            document_path: document_path.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Output of a successful run. Owned by the caller.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// The merged document, encoded and with line endings applied.
    pub output: Vec<u8>,
    /// Documents present in the output.
    pub document_count: usize,
    pub warnings: Vec<MergeWarning>,
    pub duration_ms: u64,
    /// Size and age figures over the merged sources.
    pub input: InputStats,
    pub toc: Vec<TocEntry>,
}

/// Aggregate figures over the source documents of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStats {
    pub total_bytes: u64,
    /// Integer mean of the source sizes; 0 when there are no sources.
    pub average_bytes: u64,
    pub oldest_modified: Option<DateTime<Utc>>,
    pub newest_modified: Option<DateTime<Utc>>,
}

impl InputStats {
    pub fn from_documents(docs: &[SourceDocument]) -> Self {
        let total_bytes: u64 = docs.iter().map(|d| d.size_bytes).sum();
        let average_bytes = match u64::try_from(docs.len()) {
            Ok(n) if n > 0 => total_bytes / n,
            _ => 0,
        };
        Self {
            total_bytes,
            average_bytes,
            oldest_modified: docs.iter().map(|d| d.modified).min(),
            newest_modified: docs.iter().map(|d| d.modified).max(),
        }
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone)]
pub enum MergeOutcome {
    Completed(MergeResult),
    /// Cancellation was observed; no output is produced.
    Cancelled,
}

impl MergeOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The result, if the run completed.
    pub fn completed(self) -> Option<MergeResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_strips_directory_and_extension() {
        assert_eq!(display_name("notes/intro.md"), "intro");
        assert_eq!(display_name("archive.tar.md"), "archive.tar");
        assert_eq!(display_name("README"), "README");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn warning_serializes_with_snake_case_kind() {
        let warning = MergeWarning::new("b.md", WarningKind::DuplicateContent, "duplicate of a.md");
        let json = serde_json::to_string(&warning).expect("serialize");
        assert!(json.contains("\"duplicate_content\""));
        assert_eq!(WarningKind::UnbalancedFence.to_string(), "unbalanced code fence");
    }

    #[test]
    fn input_stats_over_documents() {
        use chrono::TimeZone;

        let doc = |size: u64, day: u32| SourceDocument {
            path: format!("d{day}.md"),
            raw_content: String::new(),
            front_matter: None,
            body: String::new(),
            size_bytes: size,
            modified: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        };
        let stats = InputStats::from_documents(&[doc(10, 5), doc(25, 2), doc(1, 9)]);
        assert_eq!(stats.total_bytes, 36);
        assert_eq!(stats.average_bytes, 12);
        assert_eq!(stats.oldest_modified, Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()));
        assert_eq!(stats.newest_modified, Some(Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap()));

        assert_eq!(InputStats::from_documents(&[]), InputStats::default());
    }

    #[test]
    fn outcome_accessors() {
        assert!(MergeOutcome::Cancelled.is_cancelled());
        assert!(MergeOutcome::Cancelled.completed().is_none());
    }
}
