//! Document ordering.
//!
//! Every order is a stable sort, so documents that compare equal keep their
//! input order.

use std::cmp::Ordering;

use mdmerge_shared::{SortDirection, SortOrder, SourceDocument};

/// Sort loaded documents per `order` and `direction`.
///
/// `InputOrder` descending reverses the input list; every other order
/// reverses its comparator, so ties stay in input order either way.
pub fn sort_documents(docs: &mut [SourceDocument], order: SortOrder, direction: SortDirection) {
    let compare: fn(&SourceDocument, &SourceDocument) -> Ordering = match order {
        SortOrder::InputOrder => {
            if direction == SortDirection::Descending {
                docs.reverse();
            }
            return;
        }
        SortOrder::Alphabetical => |a, b| a.display_name().cmp(&b.display_name()),
        SortOrder::Natural => |a, b| natural_cmp(&a.display_name(), &b.display_name()),
        SortOrder::Size => |a, b| a.size_bytes.cmp(&b.size_bytes),
        SortOrder::Modified => |a, b| a.modified.cmp(&b.modified),
    };

    match direction {
        SortDirection::Ascending => docs.sort_by(compare),
        SortDirection::Descending => docs.sort_by(|a, b| compare(b, a)),
    }
}

/// Compare strings as alternating non-digit and digit runs.
///
/// Digit runs compare by numeric value (leading zeros ignored, so any
/// length works); non-digit runs compare lexicographically.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Runs::new(a);
    let mut right = Runs::new(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (is_digits(x), is_digits(y)) {
                    (true, true) => compare_numeric(x, y),
                    _ => x.cmp(y),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn is_digits(run: &str) -> bool {
    run.starts_with(|c: char| c.is_ascii_digit())
}

fn compare_numeric(x: &str, y: &str) -> Ordering {
    let x_trimmed = x.trim_start_matches('0');
    let y_trimmed = y.trim_start_matches('0');
    x_trimmed
        .len()
        .cmp(&y_trimmed.len())
        .then_with(|| x_trimmed.cmp(y_trimmed))
        // "01" after "1" keeps the comparison total
        .then_with(|| x.len().cmp(&y.len()))
}

/// Iterator over maximal digit / non-digit runs.
struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Runs<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(run)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
