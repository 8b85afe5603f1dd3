//! Core conversion logic.
//!
//! Everything that is not an external tool call lives here: encode target
//! derivation, the bounded palette compression loop, output path rules,
//! and the concurrent batch pipeline that ties them together.

pub mod compress;
pub mod paths;
pub mod pipeline;
pub mod target;

pub use compress::{CompressedGif, MAX_COMPRESSION_STEPS, palette_size, shrink_to_budget};
pub use paths::{PROCESSED_DIR_NAME, output_path_for, processed_path_for};
pub use pipeline::{BatchReport, FailureStage, FileArtifact, FileFailure, FileOutcome, run_batch};
pub use target::EncodeTarget;
