//! End-to-end merge pipeline: paths → load → sort → process → detect → TOC → format → assemble.
//!
//! [`merge_files`] is the async entry point that loads files on a bounded
//! set of tokio tasks. [`merge_sources`] runs the remaining stages over
//! documents already in memory and needs no runtime.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use mdmerge_shared::{
    InputStats, MergeConfiguration, MergeError, MergeOutcome, MergeResult, MergeWarning, Result,
    SourceDocument, TextEncoding, WarningKind,
};

use crate::assembler::{assemble_output, assemble_text};
use crate::duplicates::detect_duplicates;
use crate::formatter::format_document;
use crate::loader::{LoadedDocument, load_document};
use crate::ordering::sort_documents;
use crate::processor::process_document;
use crate::toc::{build_toc, render_toc};

/// Documents rendered by [`preview_sources`].
pub const PREVIEW_DOCUMENTS: usize = 3;

/// Marker line appended when a preview is cut short.
pub const PREVIEW_TRUNCATED: &str = "... (preview truncated) ...";

// ---------------------------------------------------------------------------
// Progress and cancellation
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each load finishes, in input order.
    fn document_loaded(&self, path: &str, current: usize, total: usize);
    /// Called after each document block is formatted; `current` only grows.
    fn document_formatted(&self, path: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &MergeResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_loaded(&self, _path: &str, _current: usize, _total: usize) {}
    fn document_formatted(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &MergeResult) {}
}

/// Cooperative cancellation signal shared between a caller and a run.
///
/// Checked at document granularity: work already started on a document
/// finishes before the run stops.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Load `paths` and merge them.
///
/// The configuration is validated before any file is touched. A file that
/// fails to decode is skipped with a `DecodeError` warning; any other read
/// failure aborts the run.
#[instrument(skip_all, fields(files = paths.len(), concurrency = config.concurrency))]
pub async fn merge_files(
    paths: &[PathBuf],
    config: &MergeConfiguration,
    progress: &dyn ProgressReporter,
    cancel: &CancellationFlag,
) -> Result<MergeOutcome> {
    let start = Instant::now();
    config.validate()?;
    let input_encoding = TextEncoding::for_label(&config.input_encoding)?;
    let output_encoding = TextEncoding::for_output_label(&config.output_encoding)?;

    info!(files = paths.len(), "starting merge");

    // --- Load ---
    progress.phase("Loading documents");
    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let mut handles = Vec::with_capacity(paths.len());

    for path in paths {
        if cancel.is_cancelled() {
            break;
        }
        // The semaphore is never closed.
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let path = path.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permit;
            let loaded = load_document(&path, input_encoding).await;
            (path, loaded)
        }));
    }

    // Await in dispatch order so reassembly never depends on completion order.
    let total = paths.len();
    let mut results = Vec::with_capacity(handles.len());
    for (i, handle) in handles.into_iter().enumerate() {
        let (path, loaded) = handle.await.map_err(|e| {
            MergeError::io(&paths[i], std::io::Error::other(format!("load task failed: {e}")))
        })?;
        progress.document_loaded(&path.to_string_lossy(), i + 1, total);
        results.push(loaded);
    }

    if cancel.is_cancelled() {
        info!("merge cancelled during loading");
        return Ok(MergeOutcome::Cancelled);
    }

    let mut documents = Vec::with_capacity(results.len());
    let mut warnings = Vec::new();
    for loaded in results {
        match loaded {
            Ok(LoadedDocument {
                document,
                warnings: load_warnings,
            }) => {
                warnings.extend(load_warnings);
                documents.push(document);
            }
            Err(MergeError::Decode { path, encoding }) => {
                warn!(path = %path.display(), %encoding, "skipping file that does not decode");
                warnings.push(MergeWarning::new(
                    path.to_string_lossy(),
                    WarningKind::DecodeError,
                    format!("not valid {encoding}; file left out of the output"),
                ));
            }
            Err(e) => return Err(e),
        }
    }

    debug!(loaded = documents.len(), skipped = total - documents.len(), "load barrier reached");

    run_stages(documents, warnings, config, output_encoding, progress, cancel, start)
}

/// Merge documents that are already loaded.
///
/// Same stages and guarantees as [`merge_files`] from sorting onward.
#[instrument(skip_all, fields(documents = sources.len()))]
pub fn merge_sources(
    sources: Vec<SourceDocument>,
    config: &MergeConfiguration,
    progress: &dyn ProgressReporter,
    cancel: &CancellationFlag,
) -> Result<MergeOutcome> {
    let start = Instant::now();
    config.validate()?;
    let output_encoding = TextEncoding::for_output_label(&config.output_encoding)?;

    if cancel.is_cancelled() {
        return Ok(MergeOutcome::Cancelled);
    }

    run_stages(sources, Vec::new(), config, output_encoding, progress, cancel, start)
}

/// Render the merged text of the first few documents, cut to `max_lines`.
///
/// Sorting applies as in a full merge and `Document X of Y` still counts every
/// source. Returns an empty string when there are no sources.
pub fn preview_sources(
    mut sources: Vec<SourceDocument>,
    config: &MergeConfiguration,
    max_lines: usize,
) -> Result<String> {
    config.validate()?;
    let total = sources.len();
    sort_documents(&mut sources, config.sort_order, config.sort_direction);
    sources.truncate(PREVIEW_DOCUMENTS);

    let mut scratch = Vec::new();
    let processed: Vec<_> = sources
        .iter()
        .map(|doc| process_document(doc, config, &mut scratch))
        .collect();
    let toc_block = if config.toc_enabled {
        render_toc(&build_toc(&processed, config.toc_depth), config.toc_style, &config.toc_title)
    } else {
        None
    };
    let blocks: Vec<String> = processed
        .iter()
        .enumerate()
        .map(|(i, doc)| format_document(doc, i + 1, total, config))
        .collect();

    let text = assemble_text(toc_block.as_deref(), &blocks, config);
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        lines.push("");
        lines.push(PREVIEW_TRUNCATED);
    }
    Ok(lines.join("\n"))
}

// ---------------------------------------------------------------------------
// Stages after the load barrier
// ---------------------------------------------------------------------------

fn run_stages(
    mut documents: Vec<SourceDocument>,
    mut warnings: Vec<MergeWarning>,
    config: &MergeConfiguration,
    output_encoding: TextEncoding,
    progress: &dyn ProgressReporter,
    cancel: &CancellationFlag,
    start: Instant,
) -> Result<MergeOutcome> {
    // --- Sort ---
    sort_documents(&mut documents, config.sort_order, config.sort_direction);

    // --- Process ---
    progress.phase("Processing documents");
    let processed: Vec<_> = documents
        .iter()
        .map(|doc| process_document(doc, config, &mut warnings))
        .collect();

    // --- Duplicates ---
    if config.detect_duplicates {
        warnings.extend(detect_duplicates(&processed));
    }

    // --- TOC ---
    let (toc, toc_block) = if config.toc_enabled {
        progress.phase("Building table of contents");
        let entries = build_toc(&processed, config.toc_depth);
        let block = render_toc(&entries, config.toc_style, &config.toc_title);
        (entries, block)
    } else {
        (Vec::new(), None)
    };

    // --- Format ---
    progress.phase("Formatting documents");
    let total = processed.len();
    let mut blocks = Vec::with_capacity(total);
    for (i, doc) in processed.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(formatted = i, total, "merge cancelled");
            return Ok(MergeOutcome::Cancelled);
        }
        blocks.push(format_document(doc, i + 1, total, config));
        debug!(path = %doc.document.path, index = i + 1, "document formatted");
        progress.document_formatted(&doc.document.path, i + 1, total);
    }

    if cancel.is_cancelled() {
        info!("merge cancelled before assembly");
        return Ok(MergeOutcome::Cancelled);
    }

    // --- Assemble ---
    progress.phase("Assembling output");
    let output = assemble_output(toc_block.as_deref(), &blocks, config, output_encoding)?;

    let result = MergeResult {
        output,
        document_count: total,
        input: InputStats::from_documents(&documents),
        warnings,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        toc,
    };

    info!(
        documents = result.document_count,
        warnings = result.warnings.len(),
        bytes = result.output.len(),
        duration_ms = result.duration_ms,
        "merge complete"
    );
    progress.done(&result);

    Ok(MergeOutcome::Completed(result))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
