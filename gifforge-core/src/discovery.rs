//! Source file discovery.
//!
//! Every regular file under the input directory is a conversion candidate,
//! whatever its extension. Media that turns out not to be decodable is
//! rejected later by the probe stage, which keeps discovery free of any
//! container allowlist.

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively collects all regular files under `input_dir`, sorted by path.
///
/// Returns [`CoreError::NoFilesFound`] when the directory tree contains no
/// regular files at all. Symbolic links are not followed.
pub fn find_source_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for entry_result in WalkDir::new(input_dir).follow_links(false) {
        let entry = entry_result?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(CoreError::NoFilesFound);
    }

    // Deterministic ordering keeps batch logs and reports stable across runs.
    files.sort();
    Ok(files)
}
