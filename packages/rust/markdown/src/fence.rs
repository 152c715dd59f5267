//! Linear fenced-code-block tracking.
//!
//! Every pass that must leave code untouched feeds its lines through a
//! [`FenceTracker`] in document order and consults the returned [`LineKind`].

/// Classification of one line relative to fenced code blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Ordinary markdown outside any fence.
    Text,
    /// An opening or closing fence line.
    Fence,
    /// A line inside a fenced block.
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenFence {
    marker: char,
    len: usize,
}

/// Tracks fence state across consecutive lines.
#[derive(Debug, Default, Clone)]
pub struct FenceTracker {
    open: Option<OpenFence>,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `line` and advance the fence state.
    pub fn classify(&mut self, line: &str) -> LineKind {
        let trimmed = line.trim_start();

        match self.open {
            Some(open) => {
                if closes(trimmed, open) {
                    self.open = None;
                    LineKind::Fence
                } else {
                    LineKind::Code
                }
            }
            None => match opens(trimmed) {
                Some(fence) => {
                    self.open = Some(fence);
                    LineKind::Fence
                }
                None => LineKind::Text,
            },
        }
    }

    /// Whether a fence is still open (unbalanced if this is the end of input).
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

/// Classify every line of `text` (split on `\n`).
pub fn classify_lines(text: &str) -> (Vec<(&str, LineKind)>, bool) {
    let mut tracker = FenceTracker::new();
    let lines = text
        .split('\n')
        .map(|line| (line, tracker.classify(line)))
        .collect();
    (lines, tracker.is_open())
}

fn marker_run(trimmed: &str) -> Option<(char, usize)> {
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}

fn opens(trimmed: &str) -> Option<OpenFence> {
    let (marker, len) = marker_run(trimmed)?;
    // Backtick info strings may not contain backticks (inline code, not a fence).
    if marker == '`' && trimmed[len..].contains('`') {
        return None;
    }
    Some(OpenFence { marker, len })
}

fn closes(trimmed: &str, open: OpenFence) -> bool {
    match marker_run(trimmed) {
        Some((marker, len)) => {
            marker == open.marker
                && len >= open.len
                && trimmed[len * marker.len_utf8()..].trim().is_empty()
        }
        None => false,
    }
}
