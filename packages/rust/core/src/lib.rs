//! Merge engine for mdmerge.
//!
//! Turns an ordered set of markdown documents plus a [`MergeConfiguration`]
//! into one merged document and a report. Stages, leaf first:
//! [`loader`] → [`processor`] → [`duplicates`] / [`toc`] → [`formatter`] →
//! [`assembler`], driven by [`pipeline`] with ordering from [`ordering`].
//!
//! The engine never writes files and never discovers paths; both belong to
//! the calling shell.
//!
//! [`MergeConfiguration`]: mdmerge_shared::MergeConfiguration

pub mod assembler;
pub mod duplicates;
pub mod formatter;
pub mod loader;
pub mod ordering;
pub mod pipeline;
pub mod processor;
pub mod toc;

pub use pipeline::{
    CancellationFlag, PREVIEW_DOCUMENTS, PREVIEW_TRUNCATED, ProgressReporter, SilentProgress,
    merge_files, merge_sources, preview_sources,
};
