//! Document loader: bytes on disk to [`SourceDocument`].
//!
//! Reads one file, decodes it strictly in the configured encoding, normalizes
//! line endings, and splits off a leading front-matter block. Each file
//! handle lives only for the duration of its own read.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use mdmerge_markdown::{normalize_line_endings, split_front_matter};
use mdmerge_shared::{MergeError, MergeWarning, Result, SourceDocument, TextEncoding, WarningKind};

/// A loaded document plus the warnings raised while loading it.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: SourceDocument,
    pub warnings: Vec<MergeWarning>,
}

/// Read and decode one file.
///
/// Fails with [`MergeError::Io`] if the file cannot be read and with
/// [`MergeError::Decode`] if its bytes are invalid for `encoding`.
#[instrument(skip_all, fields(path = %path.display(), encoding = encoding.name()))]
pub async fn load_document(path: &Path, encoding: TextEncoding) -> Result<LoadedDocument> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| MergeError::io(path, e))?;
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| MergeError::io(path, e))?;
    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    debug!(size = bytes.len(), "read source file");

    decode_document(&path.to_string_lossy(), &bytes, modified, encoding)
}

/// Decode raw bytes already in memory.
pub fn decode_document(
    path: &str,
    bytes: &[u8],
    modified: DateTime<Utc>,
    encoding: TextEncoding,
) -> Result<LoadedDocument> {
    let text = encoding
        .decode(bytes)
        .ok_or_else(|| MergeError::decode(path, encoding.name()))?;
    Ok(document_from_text(path, &text, bytes.len() as u64, modified))
}

/// Build a document from already-decoded text.
pub fn document_from_text(
    path: &str,
    text: &str,
    size_bytes: u64,
    modified: DateTime<Utc>,
) -> LoadedDocument {
    let raw_content = normalize_line_endings(text);
    let (front_matter, body, unterminated) = {
        let split = split_front_matter(&raw_content);
        (split.front_matter, split.body.to_string(), split.unterminated)
    };

    let mut warnings = Vec::new();
    if unterminated {
        warn!(path, "front matter opened but never closed; treating it as body text");
        warnings.push(MergeWarning::new(
            path,
            WarningKind::UnterminatedFrontMatter,
            "front-matter delimiter on the first line has no closing delimiter; kept as body text",
        ));
    }

    LoadedDocument {
        document: SourceDocument {
            path: path.to_string(),
            raw_content,
            front_matter,
            body,
            size_bytes,
            modified,
        },
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
