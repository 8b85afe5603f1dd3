//! Core library for batch video to GIF conversion using ffmpeg, ffprobe, and gifsicle.
//!
//! This crate provides source file discovery, media probing, palette-based
//! GIF transcoding, a bounded palette compression loop, and a concurrent
//! batch pipeline with serialized filesystem access and per-file failure
//! isolation.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use gifforge_core::{
//!     Config, FfmpegTranscoder, FfprobeProber, FsGateway, GifsicleCompressor, run_batch,
//! };
//! use std::path::Path;
//!
//! let config = Config::from_file(Path::new("gifforge.conf")).unwrap();
//! let files = gifforge_core::find_source_files(&config.input_dir).unwrap();
//! let gateway = FsGateway::open(&config.log_path()).unwrap();
//!
//! let report = run_batch(
//!     &FfprobeProber,
//!     &FfmpegTranscoder,
//!     &GifsicleCompressor,
//!     &config,
//!     &gateway,
//!     &files,
//!     None,
//! )
//! .unwrap();
//! println!("{} converted, {} failed", report.succeeded(), report.failed());
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod gateway;
pub mod processing;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use config::Config;
pub use discovery::find_source_files;
pub use error::{CoreError, CoreResult};
pub use external::{
    DitherMode, FfmpegTranscoder, FfprobeProber, GifCompressor, GifTranscoder,
    GifsicleCompressor, MediaProber, MediaProfile, check_dependency,
};
pub use gateway::{FsGateway, TraceId};
pub use processing::{
    BatchReport, EncodeTarget, FailureStage, FileArtifact, FileFailure, FileOutcome, run_batch,
};
pub use utils::{format_bytes, format_duration};
