//! Merge configuration for mdmerge.
//!
//! Saved configurations live at `~/.mdmerge/config.json` (or any path the
//! shell chooses). Missing fields take their defaults and unknown fields are
//! ignored when deserializing; after that, [`MergeConfiguration::validate`]
//! is the single gate the pipeline relies on.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::encoding::TextEncoding;
use crate::error::{MergeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.json";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".mdmerge";

/// Largest accepted header-level shift in either direction.
const MAX_HEADER_SHIFT: i32 = 5;

/// Upper bound for parallel loads.
const MAX_CONCURRENCY: usize = 256;

/// Upper bound for `separator_blank_lines` and `max_consecutive_blank_lines`.
const MAX_BLANK_LINES: usize = 16;

/// Names accepted by [`MergeConfiguration::preset`].
pub const PRESET_NAMES: &[&str] = &["basic", "ai_knowledge_base", "documentation", "archive"];

// ---------------------------------------------------------------------------
// Option enums
// ---------------------------------------------------------------------------

/// How TOC entries are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TocStyle {
    /// `- [text](#anchor)`
    #[default]
    Links,
    /// `- text`
    Plain,
    /// `1. text`
    Numbered,
}

/// Where the TOC block is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TocPosition {
    #[default]
    Top,
    Bottom,
}

/// What happens to a document's front-matter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrontMatterPolicy {
    /// Remove it from the output.
    #[default]
    Strip,
    /// Keep it verbatim at the start of the document body.
    Preserve,
    /// Remove it and fold its parsed fields into the metadata comment.
    ConvertToMetadata,
}

/// Document ordering applied before processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Keep the order the paths were supplied in.
    #[default]
    InputOrder,
    /// Lexicographic on display name.
    Alphabetical,
    /// Digit runs compared numerically (`file2` < `file10`).
    Natural,
    /// By source size in bytes.
    Size,
    /// By modification timestamp.
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Line terminator written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    /// The terminator as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }
}

// ---------------------------------------------------------------------------
// MergeConfiguration
// ---------------------------------------------------------------------------

/// Every option of a merge run. Read-only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfiguration {
    /// Per-document header line; `{name}` is replaced by the display name.
    pub header_template: String,
    /// Emit a `*Source: `path`*` line under the header.
    pub include_source_path: bool,
    /// Emit a `*Document X of Y*` line under the header.
    pub include_document_index: bool,
    /// Separator placed between documents.
    pub separator: String,
    /// Blank lines on each side of the separator.
    pub separator_blank_lines: usize,

    pub toc_enabled: bool,
    /// Deepest header level listed in the TOC (1-6).
    pub toc_depth: u8,
    pub toc_style: TocStyle,
    pub toc_position: TocPosition,
    /// Title line above the TOC; empty for none.
    pub toc_title: String,

    /// Signed delta applied to every ATX header level, clamped to 1..=6.
    pub header_level_shift: i32,
    pub front_matter_policy: FrontMatterPolicy,
    pub normalize_whitespace: bool,
    pub max_consecutive_blank_lines: usize,
    /// Warn about documents whose normalized bodies are identical.
    pub detect_duplicates: bool,

    /// Emit a `<!-- DOC_META: {...} -->` comment per document.
    pub include_metadata: bool,
    /// Wrap each document in `<document>` tags.
    pub semantic_markers: bool,
    /// Emit a `<!-- CHUNK_BOUNDARY: ... -->` marker per document.
    pub chunk_hints: bool,
    pub extract_keywords: bool,
    pub max_keywords: usize,

    pub sort_order: SortOrder,
    pub sort_direction: SortDirection,

    /// Encoding label used to decode every source file.
    pub input_encoding: String,
    /// Encoding label used for the merged output.
    pub output_encoding: String,
    pub line_ending: LineEnding,

    /// Maximum number of files loaded concurrently.
    pub concurrency: usize,
}

impl Default for MergeConfiguration {
    fn default() -> Self {
        Self {
            header_template: "## {name}".into(),
            include_source_path: false,
            include_document_index: true,
            separator: "---".into(),
            separator_blank_lines: 2,
            toc_enabled: true,
            toc_depth: 2,
            toc_style: TocStyle::Links,
            toc_position: TocPosition::Top,
            toc_title: "Table of Contents".into(),
            header_level_shift: 0,
            front_matter_policy: FrontMatterPolicy::Strip,
            normalize_whitespace: true,
            max_consecutive_blank_lines: 2,
            detect_duplicates: true,
            include_metadata: true,
            semantic_markers: true,
            chunk_hints: false,
            extract_keywords: false,
            max_keywords: 10,
            sort_order: SortOrder::InputOrder,
            sort_direction: SortDirection::Ascending,
            input_encoding: "utf-8".into(),
            output_encoding: "utf-8".into(),
            line_ending: LineEnding::Lf,
            concurrency: 4,
        }
    }
}

impl MergeConfiguration {
    /// Check internal consistency. Called once, before any file is touched.
    pub fn validate(&self) -> Result<()> {
        if !(1..=6).contains(&self.toc_depth) {
            return Err(MergeError::config(format!(
                "toc_depth must be between 1 and 6, got {}",
                self.toc_depth
            )));
        }
        if self.header_template.trim().is_empty() {
            return Err(MergeError::config("header_template must not be empty"));
        }
        if !(-MAX_HEADER_SHIFT..=MAX_HEADER_SHIFT).contains(&self.header_level_shift) {
            return Err(MergeError::config(format!(
                "header_level_shift must be between -{MAX_HEADER_SHIFT} and {MAX_HEADER_SHIFT}, got {}",
                self.header_level_shift
            )));
        }
        if self.extract_keywords && self.max_keywords == 0 {
            return Err(MergeError::config(
                "max_keywords must be at least 1 when keyword extraction is enabled",
            ));
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(MergeError::config(format!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.concurrency
            )));
        }
        if self.separator_blank_lines > MAX_BLANK_LINES {
            return Err(MergeError::config(format!(
                "separator_blank_lines must be at most {MAX_BLANK_LINES}, got {}",
                self.separator_blank_lines
            )));
        }
        if self.max_consecutive_blank_lines > MAX_BLANK_LINES {
            return Err(MergeError::config(format!(
                "max_consecutive_blank_lines must be at most {MAX_BLANK_LINES}, got {}",
                self.max_consecutive_blank_lines
            )));
        }
        if self.front_matter_policy == FrontMatterPolicy::ConvertToMetadata
            && !self.include_metadata
        {
            return Err(MergeError::config(
                "front_matter_policy 'convert-to-metadata' requires include_metadata",
            ));
        }
        TextEncoding::for_label(&self.input_encoding)?;
        TextEncoding::for_output_label(&self.output_encoding)?;
        Ok(())
    }

    /// A named preset. Returns a fresh value each call.
    pub fn preset(name: &str) -> Result<Self> {
        let base = Self::default();
        let config = match name {
            "basic" => Self {
                toc_enabled: false,
                include_metadata: false,
                semantic_markers: false,
                ..base
            },
            "ai_knowledge_base" => Self {
                include_source_path: true,
                chunk_hints: true,
                extract_keywords: true,
                ..base
            },
            "documentation" => Self {
                header_template: "# {name}".into(),
                toc_depth: 3,
                include_metadata: false,
                semantic_markers: false,
                front_matter_policy: FrontMatterPolicy::Preserve,
                ..base
            },
            "archive" => Self {
                header_template: "# {name}".into(),
                toc_enabled: false,
                include_metadata: false,
                semantic_markers: false,
                front_matter_policy: FrontMatterPolicy::Preserve,
                normalize_whitespace: false,
                ..base
            },
            other => {
                return Err(MergeError::config(format!(
                    "unknown preset '{other}', expected one of: {}",
                    PRESET_NAMES.join(", ")
                )));
            }
        };
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.mdmerge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| MergeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the default config file (`~/.mdmerge/config.json`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the default config file. Returns defaults if the file does not exist.
pub fn load_config() -> Result<MergeConfiguration> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(MergeConfiguration::default());
    }

    load_config_from(&path)
}

/// Load a configuration from a specific JSON file.
pub fn load_config_from(path: &Path) -> Result<MergeConfiguration> {
    let content = std::fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;

    serde_json::from_str(&content)
        .map_err(|e| MergeError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a configuration as pretty JSON to `path`, creating parent directories.
pub fn save_config_to(path: &Path, config: &MergeConfiguration) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MergeError::io(parent, e))?;
    }
    let content =
        serde_json::to_string_pretty(config).map_err(|e| MergeError::config(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| MergeError::io(path, e))?;
    tracing::info!(?path, "saved merge configuration");
    Ok(())
}

/// Create the config directory and write `config` as the default file.
/// Returns the path to the created file.
pub fn init_config(config: &MergeConfiguration) -> Result<PathBuf> {
    let path = config_file_path()?;
    save_config_to(&path, config)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MergeConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sort_order, SortOrder::InputOrder);
        assert_eq!(config.header_template, "## {name}");
    }

    #[test]
    fn config_roundtrip_uses_kebab_case_enums() {
        let config = MergeConfiguration {
            front_matter_policy: FrontMatterPolicy::ConvertToMetadata,
            sort_order: SortOrder::Natural,
            ..MergeConfiguration::default()
        };
        let json = serde_json::to_string_pretty(&config).expect("serialize");
        assert!(json.contains("\"convert-to-metadata\""));
        assert!(json.contains("\"natural\""));
        let parsed: MergeConfiguration = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_config_with_unknown_fields() {
        let json = r#"{
            "toc_style": "numbered",
            "theme": "dark",
            "create_backup": true
        }"#;
        let config: MergeConfiguration = serde_json::from_str(json).expect("parse");
        assert_eq!(config.toc_style, TocStyle::Numbered);
        assert_eq!(config.toc_depth, 2);
    }

    #[test]
    fn validation_rejects_inconsistent_values() {
        let bad_depth = MergeConfiguration {
            toc_depth: 0,
            ..MergeConfiguration::default()
        };
        assert!(bad_depth.validate().unwrap_err().to_string().contains("toc_depth"));

        let bad_shift = MergeConfiguration {
            header_level_shift: -9,
            ..MergeConfiguration::default()
        };
        assert!(bad_shift.validate().is_err());

        let orphan_fields = MergeConfiguration {
            front_matter_policy: FrontMatterPolicy::ConvertToMetadata,
            include_metadata: false,
            ..MergeConfiguration::default()
        };
        assert!(orphan_fields.validate().is_err());

        let bad_encoding = MergeConfiguration {
            output_encoding: "utf-16be".into(),
            ..MergeConfiguration::default()
        };
        assert!(bad_encoding.validate().is_err());

        let no_workers = MergeConfiguration {
            concurrency: 0,
            ..MergeConfiguration::default()
        };
        assert!(no_workers.validate().is_err());
    }

    #[test]
    fn extreme_json_values_are_config_errors() {
        let cases = [
            r#"{ "concurrency": 18446744073709551615 }"#,
            r#"{ "concurrency": 257 }"#,
            r#"{ "header_level_shift": -2147483648 }"#,
            r#"{ "header_level_shift": 2147483647 }"#,
            r#"{ "separator_blank_lines": 18446744073709551615 }"#,
            r#"{ "max_consecutive_blank_lines": 18446744073709551615 }"#,
        ];
        for json in cases {
            let config: MergeConfiguration = serde_json::from_str(json).expect("parse");
            let err = config.validate().unwrap_err();
            assert!(matches!(err, MergeError::Config { .. }), "{json}: {err}");
        }

        let edge = MergeConfiguration {
            concurrency: MAX_CONCURRENCY,
            header_level_shift: -MAX_HEADER_SHIFT,
            separator_blank_lines: MAX_BLANK_LINES,
            max_consecutive_blank_lines: MAX_BLANK_LINES,
            ..MergeConfiguration::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn negative_depth_in_json_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "toc_depth": -1 }"#).unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, MergeError::Config { .. }));
    }

    #[test]
    fn presets_are_valid_and_distinct() {
        for name in PRESET_NAMES {
            let config = MergeConfiguration::preset(name).expect("preset");
            assert!(config.validate().is_ok(), "preset {name} invalid");
        }
        let basic = MergeConfiguration::preset("basic").unwrap();
        assert!(!basic.toc_enabled);
        let ai = MergeConfiguration::preset("ai_knowledge_base").unwrap();
        assert!(ai.chunk_hints && ai.extract_keywords);
        assert!(MergeConfiguration::preset("nope").is_err());
    }

    #[test]
    fn save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("merge.json");
        let config = MergeConfiguration::preset("documentation").unwrap();
        save_config_to(&path, &config).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
