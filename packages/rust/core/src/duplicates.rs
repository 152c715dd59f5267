//! Content fingerprinting and duplicate detection across one merge batch.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::{instrument, warn};

use mdmerge_markdown::normalize_whitespace;
use mdmerge_shared::{MergeWarning, ProcessedDocument, WarningKind};

/// Fingerprint a document body (front matter already removed).
///
/// The body is normalized with at most one consecutive blank line before
/// hashing, so spacing differences alone never make two bodies distinct.
/// An empty body has an empty fingerprint.
pub fn content_fingerprint(body: &str) -> String {
    let normalized = normalize_whitespace(body, 1);
    if normalized.is_empty() {
        return String::new();
    }
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Documents sharing one fingerprint, in final order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub content_hash: String,
    /// Indices into the processed collection; the first is the original.
    pub members: Vec<usize>,
}

/// Group documents whose fingerprints match. Singletons are omitted.
pub fn find_duplicate_groups(docs: &[ProcessedDocument<'_>]) -> Vec<DuplicateGroup> {
    let mut by_hash: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for (index, doc) in docs.iter().enumerate() {
        if doc.content_hash.is_empty() {
            continue;
        }
        match by_hash.get(doc.content_hash.as_str()) {
            Some(&group) => groups[group].members.push(index),
            None => {
                by_hash.insert(&doc.content_hash, groups.len());
                groups.push(DuplicateGroup {
                    content_hash: doc.content_hash.clone(),
                    members: vec![index],
                });
            }
        }
    }

    groups.retain(|group| group.members.len() > 1);
    groups
}

/// One `DuplicateContent` warning per document after the first in its group.
///
/// Documents are annotated only; nothing is removed from the batch.
#[instrument(skip_all, fields(documents = docs.len()))]
pub fn detect_duplicates(docs: &[ProcessedDocument<'_>]) -> Vec<MergeWarning> {
    let mut flagged: Vec<(usize, MergeWarning)> = Vec::new();

    for group in find_duplicate_groups(docs) {
        let first = &docs[group.members[0]].document.path;
        for &member in &group.members[1..] {
            let path = &docs[member].document.path;
            warn!(path = %path, original = %first, "duplicate content");
            flagged.push((
                member,
                MergeWarning::new(
                    path.clone(),
                    WarningKind::DuplicateContent,
                    format!("duplicate of {first}"),
                ),
            ));
        }
    }

    flagged.sort_by_key(|(member, _)| *member);
    flagged.into_iter().map(|(_, warning)| warning).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
