//! GIF re-encoding via gifsicle.
//!
//! The compressor shrinks an existing GIF by reducing its palette. Bytes
//! stream through the child process on stdin/stdout so no intermediate
//! files are needed between compression attempts.

use crate::error::{
    CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error,
};
use std::io::Write;
use std::process::{Command, Stdio};

/// Dithering selection passed to the compressor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DitherMode {
    /// The tool's default error-diffusion pattern
    #[default]
    Auto,
    /// Ordered (Bayer-style) dithering
    Ordered,
    /// No dithering
    None,
}

impl DitherMode {
    fn flag(self) -> &'static str {
        match self {
            DitherMode::Auto => "--dither",
            DitherMode::Ordered => "--dither=ordered",
            DitherMode::None => "--no-dither",
        }
    }
}

/// Re-encodes GIF bytes with a reduced palette.
pub trait GifCompressor {
    /// Re-encodes `gif` with at most `palette_size` colors.
    fn compress(&self, gif: &[u8], palette_size: u32, dither: DitherMode) -> CoreResult<Vec<u8>>;
}

/// Argument list for one compression attempt.
///
/// Optimization level, gamma handling, and resize interpolation are fixed;
/// only the palette size and dither mode vary between attempts.
#[must_use]
pub fn compression_args(palette_size: u32, dither: DitherMode) -> Vec<String> {
    vec![
        "-O2".to_string(),
        "--gamma=srgb".to_string(),
        "--resize-method=lanczos3".to_string(),
        dither.flag().to_string(),
        "--colors".to_string(),
        palette_size.to_string(),
    ]
}

/// [`GifCompressor`] backed by a gifsicle process.
#[derive(Debug, Clone, Default)]
pub struct GifsicleCompressor;

impl GifCompressor for GifsicleCompressor {
    fn compress(&self, gif: &[u8], palette_size: u32, dither: DitherMode) -> CoreResult<Vec<u8>> {
        let args = compression_args(palette_size, dither);
        log::debug!("Running gifsicle {}", args.join(" "));

        let mut child = Command::new("gifsicle")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_start_error("gifsicle", e))?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            CoreError::OperationFailed("gifsicle stdin was not captured".to_string())
        })?;

        // Feed stdin from a second thread while this one drains stdout, so
        // a GIF larger than the pipe buffer cannot deadlock the exchange.
        let (output, write_result) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(gif));
            let output = child.wait_with_output();
            let write_result = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer thread panicked")));
            (output, write_result)
        });

        let output = output.map_err(|e| command_wait_error("gifsicle", e))?;
        if !output.status.success() {
            return Err(command_failed_error(
                "gifsicle",
                output.status,
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        // A broken pipe usually comes with a failure status handled above;
        // surface it anyway if the process somehow exited cleanly.
        write_result?;

        if output.stdout.is_empty() {
            return Err(CoreError::OperationFailed(format!(
                "gifsicle produced empty output for palette size {palette_size}"
            )));
        }
        Ok(output.stdout)
    }
}
