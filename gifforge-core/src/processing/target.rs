//! Encode target derivation.

use crate::config::Config;
use crate::external::ffprobe::MediaProfile;

/// Frame rate and height for one transcode, derived from the source profile
/// and the configured maxima.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeTarget {
    /// Frames per second of the output GIF
    pub fps: u32,
    /// Frame height of the output GIF in pixels
    pub height: u32,
}

impl EncodeTarget {
    /// Derives the target deterministically: the source frame rate rounded
    /// up to a whole number and the source height, each clamped to its
    /// configured maximum.
    #[must_use]
    pub fn derive(profile: &MediaProfile, config: &Config) -> Self {
        Self {
            fps: profile.fps_ceil().min(config.max_gif_fps),
            height: profile.height.min(config.max_gif_height_px),
        }
    }
}
