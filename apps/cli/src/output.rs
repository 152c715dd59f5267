//! Writing the merged document: backup of an existing file, then an atomic
//! replace so a reader never sees a half-written output.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use color_eyre::eyre::{Result, WrapErr};
use tracing::{debug, info};

/// `<dir>/<stem>.backup_<YYYYmmdd_HHMMSS>.md` for `output`.
pub(crate) fn backup_path(output: &Path, at: DateTime<Local>) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{stem}.backup_{}.md", at.format("%Y%m%d_%H%M%S")))
}

/// Copy an existing output file aside. Returns the backup path, or `None`
/// when there was nothing to back up.
pub(crate) fn backup_existing(output: &Path) -> Result<Option<PathBuf>> {
    if !output.is_file() {
        return Ok(None);
    }
    let backup = backup_path(output, Local::now());
    std::fs::copy(output, &backup)
        .wrap_err_with(|| format!("could not back up '{}'", output.display()))?;
    info!(backup = %backup.display(), "backed up existing output");
    Ok(Some(backup))
}

/// Write `bytes` to a temp file next to `path`, then rename over it.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("could not create '{}'", dir.display()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.md".to_string());
    let temp = dir.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, bytes).wrap_err_with(|| format!("could not write '{}'", temp.display()))?;
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(e).wrap_err_with(|| format!("could not replace '{}'", path.display()));
    }

    debug!(path = %path.display(), size = bytes.len(), "wrote output");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
