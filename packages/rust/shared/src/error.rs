//! Error types for mdmerge.
//!
//! Library crates use [`MergeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Cancellation is not an error variant: a cancelled run is reported as
//! [`crate::MergeOutcome::Cancelled`], not as an error.

use std::path::PathBuf;

/// Top-level error type for all merge operations.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The configuration is internally inconsistent; raised before any file is read.
    #[error("config error: {message}")]
    Config { message: String },

    /// A source file could not be read. Aborts the whole run.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A source file's bytes are not valid in the declared input encoding.
    /// The orchestrator downgrades this to a warning and skips the file.
    #[error("decode error at {path:?}: content is not valid {encoding}")]
    Decode { path: PathBuf, encoding: String },

    /// The assembled output cannot be represented in the output encoding.
    #[error("encode error: output is not representable in {encoding}: {message}")]
    Encode { encoding: String, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MergeError>;

impl MergeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a decode error for `path` under the named encoding.
    pub fn decode(path: impl Into<PathBuf>, encoding: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            encoding: encoding.into(),
        }
    }

    /// Create an encode error for the named output encoding.
    pub fn encode(encoding: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Encode {
            encoding: encoding.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = MergeError::config("toc_depth must be between 1 and 6");
        assert_eq!(err.to_string(), "config error: toc_depth must be between 1 and 6");

        let err = MergeError::decode("notes/a.md", "utf-8");
        assert!(err.to_string().contains("not valid utf-8"));

        let err = MergeError::encode("ascii", "'é' at byte 4");
        assert!(err.to_string().contains("representable in ascii"));
    }
}
