//! Bounded palette compression loop.
//!
//! A first-pass GIF that misses the byte budget is re-encoded with a
//! progressively smaller palette until it fits or the schedule runs out.
//! Every attempt starts from the same first-pass bytes; feeding one lossy
//! re-encode into the next would compound quality loss without improving
//! the size much.

use crate::error::CoreResult;
use crate::external::gifsicle::{DitherMode, GifCompressor};

/// Last step of the palette schedule.
pub const MAX_COMPRESSION_STEPS: i32 = 7;

/// Palette size for a compression step: 128 colors at step 0, shrinking by
/// 16 per step down to 16 at step [`MAX_COMPRESSION_STEPS`].
#[must_use]
pub fn palette_size(step: i32) -> u32 {
    (128 - step * 16) as u32
}

/// Result of the compression loop.
#[derive(Debug, Clone)]
pub struct CompressedGif {
    /// Final GIF bytes
    pub data: Vec<u8>,
    /// Last compression step taken; -1 when the first pass already fit
    pub step: i32,
}

impl CompressedGif {
    /// Size in whole kilobytes, rounding down.
    #[must_use]
    pub fn size_kb(&self) -> u64 {
        (self.data.len() / 1024) as u64
    }
}

/// Re-encodes `original` until it fits `budget_kb`, or returns the last
/// attempt once the palette schedule is exhausted.
///
/// A buffer under 1 KB is never accepted, budget or not; it would mean an
/// empty or degenerate encode, so compression continues.
pub fn shrink_to_budget<C: GifCompressor + ?Sized>(
    compressor: &C,
    original: &[u8],
    budget_kb: u64,
) -> CoreResult<CompressedGif> {
    let mut step: i32 = -1;
    let mut current = original.to_vec();

    loop {
        let size_kb = (current.len() / 1024) as u64;
        if step == MAX_COMPRESSION_STEPS || (size_kb != 0 && size_kb <= budget_kb) {
            return Ok(CompressedGif {
                data: current,
                step,
            });
        }
        step += 1;
        let palette = palette_size(step);
        log::debug!(
            "Compression step {step}: {size_kb} KB over {budget_kb} KB budget, \
             retrying with {palette} colors"
        );
        current = compressor.compress(original, palette, DitherMode::Auto)?;
    }
}
