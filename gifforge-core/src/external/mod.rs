//! Integrations with external media tools.
//!
//! All media work is delegated to ffmpeg, ffprobe, and gifsicle. Each tool
//! sits behind a small trait ([`MediaProber`], [`GifTranscoder`],
//! [`GifCompressor`]) so the pipeline can be driven by in-process fakes in
//! tests without any of the binaries installed.

use crate::error::{CoreError, CoreResult};
use std::io;
use std::process::{Command, Stdio};

pub mod ffmpeg;
pub mod ffprobe;
pub mod gifsicle;

pub use ffmpeg::{FfmpegTranscoder, GifTranscoder, build_gif_filter};
pub use ffprobe::{FfprobeProber, MediaProber, MediaProfile};
pub use gifsicle::{DitherMode, GifCompressor, GifsicleCompressor};

/// Checks that a required external command is available and executable.
///
/// Runs `<cmd_name> -version` and discards the output; only the ability to
/// start the process matters. Returns [`CoreError::DependencyNotFound`] when
/// the binary is missing from `PATH` and [`CoreError::CommandStart`] when it
/// exists but cannot be started.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {cmd_name}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{cmd_name}' not found.");
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => Err(CoreError::CommandStart(cmd_name.to_string(), e)),
    }
}
