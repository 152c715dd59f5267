//! Input discovery: turns command-line paths into the concrete file list the
//! merge engine expects.
//!
//! Files named on the command line are taken as-is. Directories are scanned
//! for files matching the include patterns (default `*.md`, `*.markdown`)
//! and none of the exclude patterns; hidden files and directories are skipped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, eyre};
use regex::Regex;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Include patterns used when none are given.
pub(crate) const DEFAULT_INCLUDE: &[&str] = &["*.md", "*.markdown"];

/// How directories are scanned.
#[derive(Debug, Clone, Default)]
pub(crate) struct DiscoverOptions {
    pub recursive: bool,
    /// Deepest level below a scanned directory (1 = its direct children).
    pub max_depth: Option<usize>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Expand `inputs` into an ordered, de-duplicated file list.
pub(crate) fn discover_inputs(inputs: &[PathBuf], opts: &DiscoverOptions) -> Result<Vec<PathBuf>> {
    let include = compile_patterns(if opts.include.is_empty() {
        DEFAULT_INCLUDE.iter().map(|p| (*p).to_string()).collect()
    } else {
        opts.include.clone()
    })?;
    let exclude = compile_patterns(opts.exclude.clone())?;

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            if seen.insert(input.clone()) {
                files.push(input.clone());
            }
            continue;
        }
        if !input.is_dir() {
            return Err(eyre!("input '{}' does not exist", input.display()));
        }

        let depth = if opts.recursive {
            opts.max_depth.unwrap_or(usize::MAX)
        } else {
            1
        };

        let walker = WalkDir::new(input)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(|e| eyre!("cannot scan '{}': {e}", input.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = relative_path(input, entry.path());
            if !matches_any(&include, &relative) || matches_any(&exclude, &relative) {
                continue;
            }
            if seen.insert(entry.path().to_path_buf()) {
                files.push(entry.into_path());
            }
        }
    }

    debug!(count = files.len(), "discovered input files");
    Ok(files)
}

// ---------------------------------------------------------------------------
// Pattern matching
// ---------------------------------------------------------------------------

/// A compiled pattern and whether it applies to the full relative path.
struct Pattern {
    regex: Regex,
    full_path: bool,
}

fn compile_patterns(patterns: Vec<String>) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            glob_to_regex(p)
                .map(|regex| Pattern {
                    regex,
                    full_path: p.contains('/'),
                })
                .ok_or_else(|| eyre!("invalid pattern '{p}'"))
        })
        .collect()
}

/// Patterns without `/` match the file name; others match the path relative
/// to the scanned directory.
fn matches_any(patterns: &[Pattern], relative: &str) -> bool {
    let file_name = relative.rsplit('/').next().unwrap_or(relative);
    patterns.iter().any(|p| {
        let subject = if p.full_path { relative } else { file_name };
        p.regex.is_match(subject)
    })
}

/// Convert a glob-like pattern to a regex.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*\*", ".*")
        .replace(r"\*", "[^/]*")
        .replace(r"\?", "[^/]");
    Regex::new(&format!("^{escaped}$")).ok()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
