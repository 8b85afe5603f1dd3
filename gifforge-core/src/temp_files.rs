//! Scratch space for intermediate encode artifacts.
//!
//! Transcodes land in a per-run scratch directory before compression; the
//! directory is wiped after every batch pass so aborted runs never leak
//! multi-megabyte intermediates into later ones.

use crate::config::Config;
use crate::error::CoreResult;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

/// Directory name used under the system temp dir when `TEMP_FOLDER` is unset.
pub const SCRATCH_DIR_NAME: &str = "gifforge";

/// Resolves the scratch directory for this run without touching the filesystem.
#[must_use]
pub fn scratch_dir(config: &Config) -> PathBuf {
    config
        .temp_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join(SCRATCH_DIR_NAME))
}

/// Creates the scratch directory if needed and returns its path.
pub fn ensure_scratch_dir(config: &Config) -> CoreResult<PathBuf> {
    let dir = scratch_dir(config);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Empties the scratch directory by deleting and recreating it.
///
/// Runs after each batch pass whether or not any file failed.
pub fn clear_scratch_dir(config: &Config) -> CoreResult<()> {
    let dir = scratch_dir(config);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    std::fs::create_dir_all(&dir)?;
    Ok(())
}

/// Creates a uniquely named scratch file inside `dir`.
///
/// The file is removed when the returned handle drops, so workers that bail
/// out mid-encode clean up after themselves.
pub fn create_scratch_file(
    dir: &Path,
    prefix: &str,
    extension: &str,
) -> CoreResult<NamedTempFile> {
    let file = TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;
    Ok(file)
}
