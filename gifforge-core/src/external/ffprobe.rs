//! Media probing via ffprobe.
//!
//! Extracts the two stream properties the encode target derivation needs:
//! the average frame rate (as a rational) and the frame height. Anything
//! ffprobe cannot read as media surfaces as a probe failure for that file.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Frame rate and height of a source file's first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaProfile {
    /// Frame rate numerator
    pub fps_num: u32,
    /// Frame rate denominator (never zero)
    pub fps_den: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl MediaProfile {
    /// Source frame rate rounded up to a whole number of frames per second.
    #[must_use]
    pub fn fps_ceil(&self) -> u32 {
        self.fps_num.div_ceil(self.fps_den)
    }
}

/// Extracts a [`MediaProfile`] from a source file.
pub trait MediaProber {
    fn probe(&self, input: &Path) -> CoreResult<MediaProfile>;
}

/// [`MediaProber`] backed by the `ffprobe` crate (spawns the ffprobe binary).
#[derive(Debug, Clone, Default)]
pub struct FfprobeProber;

impl MediaProber for FfprobeProber {
    fn probe(&self, input: &Path) -> CoreResult<MediaProfile> {
        log::debug!("Running ffprobe on: {}", input.display());
        match ffprobe(input) {
            Ok(metadata) => {
                let video_stream = metadata
                    .streams
                    .iter()
                    .find(|s| s.codec_type.as_deref() == Some("video"))
                    .ok_or_else(|| {
                        CoreError::VideoInfoError(format!(
                            "No video stream found in {}",
                            input.display()
                        ))
                    })?;

                let height = video_stream.height.ok_or_else(|| {
                    CoreError::VideoInfoError(format!(
                        "Video stream missing height in {}",
                        input.display()
                    ))
                })?;
                if height <= 0 {
                    return Err(CoreError::VideoInfoError(format!(
                        "Invalid height ({height}) found in {}",
                        input.display()
                    )));
                }

                // avg_frame_rate reflects the playback rate for variable
                // frame rate content; r_frame_rate fills in when the
                // average is unknown ("0/0").
                let (fps_num, fps_den) = parse_frame_rate(&video_stream.avg_frame_rate)
                    .or_else(|| parse_frame_rate(&video_stream.r_frame_rate))
                    .ok_or_else(|| {
                        CoreError::FfprobeParse(format!(
                            "Failed to parse frame rate '{}' for {}",
                            video_stream.avg_frame_rate,
                            input.display()
                        ))
                    })?;

                Ok(MediaProfile {
                    fps_num,
                    fps_den,
                    height: height as u32,
                })
            }
            Err(err) => {
                log::error!("ffprobe failed for {}: {err:?}", input.display());
                Err(map_ffprobe_error(err, "media profile"))
            }
        }
    }
}

/// Parses an ffprobe frame-rate string such as `"30000/1001"` or `"25"`.
///
/// Returns `None` for unparsable input and for the `"0/0"` placeholder
/// ffprobe reports when the rate is unknown.
fn parse_frame_rate(raw: &str) -> Option<(u32, u32)> {
    let raw = raw.trim();
    let (num, den) = match raw.split_once('/') {
        Some((n, d)) => (n.parse::<u32>().ok()?, d.parse::<u32>().ok()?),
        None => (raw.parse::<u32>().ok()?, 1),
    };
    if num == 0 || den == 0 {
        return None;
    }
    Some((num, den))
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error(format!("ffprobe ({context})"), output.status, stderr)
        }
        FfProbeError::Deserialize(err) => CoreError::JsonParseError(format!(
            "ffprobe {context} output deserialization: {err}"
        )),
        _ => CoreError::FfprobeParse(format!(
            "Unhandled ffprobe failure during {context}: {err:?}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate_forms() {
        assert_eq!(parse_frame_rate("30000/1001"), Some((30000, 1001)));
        assert_eq!(parse_frame_rate("247/10"), Some((247, 10)));
        assert_eq!(parse_frame_rate("25"), Some((25, 1)));
        assert_eq!(parse_frame_rate(" 24/1 "), Some((24, 1)));
    }

    #[test]
    fn test_parse_frame_rate_rejects_invalid() {
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("24/0"), None);
        assert_eq!(parse_frame_rate("0"), None);
        assert_eq!(parse_frame_rate(""), None);
        assert_eq!(parse_frame_rate("abc"), None);
        assert_eq!(parse_frame_rate("-24/1"), None);
    }

    #[test]
    fn test_fps_ceil_rounds_up() {
        let profile = |fps_num, fps_den| MediaProfile {
            fps_num,
            fps_den,
            height: 720,
        };
        assert_eq!(profile(247, 10).fps_ceil(), 25);
        assert_eq!(profile(24000, 1001).fps_ceil(), 24);
        assert_eq!(profile(30, 1).fps_ceil(), 30);
        assert_eq!(profile(1, 2).fps_ceil(), 1);
    }
}
