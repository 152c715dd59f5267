//! Shared types, error model, and configuration for mdmerge.
//!
//! This crate is the foundation depended on by all other mdmerge crates.
//! It provides:
//! - [`MergeError`] - the unified error type
//! - Domain types ([`SourceDocument`], [`ProcessedDocument`], [`TocEntry`], [`MergeResult`])
//! - Configuration ([`MergeConfiguration`], presets, JSON load/save)
//! - Text encodings ([`TextEncoding`])

pub mod config;
pub mod encoding;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    FrontMatterPolicy, LineEnding, MergeConfiguration, PRESET_NAMES, SortDirection, SortOrder,
    TocPosition, TocStyle, config_dir, config_file_path, init_config, load_config,
    load_config_from, save_config_to,
};
pub use encoding::TextEncoding;
pub use error::{MergeError, Result};
pub use types::{
    FrontMatter, FrontMatterDelimiter, FrontMatterFields, Header, InputStats, MergeOutcome, MergeResult,
    MergeWarning, ProcessedDocument, SourceDocument, TocEntry, WarningKind, display_name,
};
