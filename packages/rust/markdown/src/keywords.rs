//! Frequency-based keyword extraction.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::fence::{FenceTracker, LineKind};

/// Words shorter than this are ignored.
const MIN_WORD_LEN: usize = 3;

/// Common English function words plus tokens that only carry markdown/link syntax.
const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are", "because",
    "been", "before", "being", "below", "between", "both", "but", "can", "could", "did", "does",
    "doing", "down", "during", "each", "few", "for", "from", "further", "had", "has", "have",
    "having", "her", "here", "hers", "him", "his", "how", "into", "its", "itself", "just", "more",
    "most", "not", "now", "off", "once", "only", "other", "our", "ours", "out", "over", "own",
    "same", "she", "should", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "too", "under", "until", "use", "used",
    "using", "very", "was", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "would", "you", "your", "yours",
    // markdown / link syntax
    "http", "https", "www", "com", "org", "html", "img", "src", "href", "nbsp", "png", "jpg",
];

/// Return up to `limit` most frequent distinct words outside fenced code.
///
/// Words are lower-cased; ties keep first-occurrence order.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    static WORD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9_'-]*").expect("valid regex"));

    // word -> (count, first occurrence)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut position = 0usize;
    let mut tracker = FenceTracker::new();

    for line in text.split('\n') {
        if tracker.classify(line) != LineKind::Text {
            continue;
        }
        for found in WORD_RE.find_iter(line) {
            let word = found
                .as_str()
                .trim_end_matches(['\'', '-', '_'])
                .to_lowercase();
            if word.len() < MIN_WORD_LEN || STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            let entry = counts.entry(word).or_insert((0, position));
            entry.0 += 1;
            position += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(word, _, _)| word).collect()
}
