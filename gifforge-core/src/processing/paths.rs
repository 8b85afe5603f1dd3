//! Output path derivation.
//!
//! The output tree mirrors the input tree: a source at
//! `<input>/sub/clip.mp4` produces `<output>/sub/clip.gif`, and when
//! relocation is enabled the source itself moves to
//! `<output>/_processed/sub/clip.mp4`.

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Subdirectory of the output root that receives relocated source files.
pub const PROCESSED_DIR_NAME: &str = "_processed";

/// Computes the artifact path for `input`, mirroring its position under
/// `input_root` into `output_root` with a `.gif` extension.
///
/// A compression step greater than zero is recorded in the filename as a
/// `[c<step>]` suffix, so two different steps can never produce the same
/// name for one source.
pub fn output_path_for(
    input: &Path,
    input_root: &Path,
    output_root: &Path,
    step: i32,
) -> CoreResult<PathBuf> {
    let relative = relative_to_root(input, input_root)?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            CoreError::PathError(format!("File '{}' has no usable name", input.display()))
        })?;

    let filename = if step > 0 {
        format!("{stem}[c{step}].gif")
    } else {
        format!("{stem}.gif")
    };

    let mut path = output_root.to_path_buf();
    if let Some(parent) = relative.parent() {
        path.push(parent);
    }
    path.push(filename);
    Ok(path)
}

/// Computes the relocation destination for a converted source:
/// `<output_root>/_processed/<path relative to input_root>`.
pub fn processed_path_for(
    input: &Path,
    input_root: &Path,
    output_root: &Path,
) -> CoreResult<PathBuf> {
    let relative = relative_to_root(input, input_root)?;
    Ok(output_root.join(PROCESSED_DIR_NAME).join(relative))
}

fn relative_to_root<'a>(input: &'a Path, input_root: &Path) -> CoreResult<&'a Path> {
    input.strip_prefix(input_root).map_err(|_| {
        CoreError::PathError(format!(
            "File '{}' is not under input root '{}'",
            input.display(),
            input_root.display()
        ))
    })
}
