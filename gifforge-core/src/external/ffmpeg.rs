//! GIF transcoding via ffmpeg.
//!
//! One ffmpeg invocation turns a source video into a first-pass GIF in
//! scratch space. The filter graph splits the decoded stream in two:
//! one branch generates a palette, the other is capped to the target frame
//! rate, scaled to the target height (width follows the aspect ratio), and
//! stripped of duplicate consecutive frames before the palette is applied
//! with Bayer dithering.

use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};
use crate::processing::EncodeTarget;
use crate::temp_files::create_scratch_file;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::path::Path;
use std::process::ExitStatus;

/// Produces first-pass GIF bytes for one source file.
pub trait GifTranscoder {
    /// Transcodes `input` into a GIF honoring `target`, using `scratch_dir`
    /// for the intermediate output file.
    fn transcode(
        &self,
        input: &Path,
        target: EncodeTarget,
        scratch_dir: &Path,
    ) -> CoreResult<Vec<u8>>;
}

/// Builds the palette filter graph for one encode target.
#[must_use]
pub fn build_gif_filter(target: EncodeTarget) -> String {
    format!(
        "split[a][b];[a]palettegen[pal];[b]fps={fps},scale=-1:{height},mpdecimate[vid];[vid][pal]paletteuse=dither=bayer",
        fps = target.fps,
        height = target.height,
    )
}

/// [`GifTranscoder`] backed by an ffmpeg process via ffmpeg-sidecar.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder;

impl GifTranscoder for FfmpegTranscoder {
    fn transcode(
        &self,
        input: &Path,
        target: EncodeTarget,
        scratch_dir: &Path,
    ) -> CoreResult<Vec<u8>> {
        // The scratch file is removed when this handle drops, including on
        // every early error return below.
        let scratch = create_scratch_file(scratch_dir, "transcode", "gif")?;
        let filter = build_gif_filter(target);

        let mut cmd = FfmpegCommand::new();
        cmd.arg("-hide_banner");
        cmd.arg("-y"); // The scratch file already exists; always overwrite it
        cmd.input(input.to_string_lossy().as_ref());
        cmd.arg("-filter_complex");
        cmd.arg(&filter);
        cmd.arg("-loop");
        cmd.arg("0");
        cmd.arg("-f");
        cmd.arg("gif");
        cmd.output(scratch.path().to_string_lossy().as_ref());

        log::debug!("Running GIF transcode command: {cmd:?}");

        let mut child = cmd.spawn().map_err(|e| command_start_error("ffmpeg", e))?;

        // Drain the event stream, keeping ffmpeg's own messages for the
        // failure report.
        let mut stderr_buffer = String::new();
        let iterator = child.iter().map_err(|e| {
            command_failed_error(
                "ffmpeg",
                ExitStatus::default(),
                format!("Failed to get event iterator: {e}"),
            )
        })?;
        for event in iterator {
            match event {
                FfmpegEvent::Log(_, message) | FfmpegEvent::Error(message) => {
                    stderr_buffer.push_str(&message);
                    stderr_buffer.push('\n');
                }
                _ => {}
            }
        }

        let status = child.wait().map_err(|e| command_wait_error("ffmpeg", e))?;
        if !status.success() {
            return Err(command_failed_error("ffmpeg", status, stderr_buffer.trim()));
        }

        Ok(std::fs::read(scratch.path())?)
    }
}
