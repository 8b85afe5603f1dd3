//! Concurrent batch pipeline.
//!
//! Fans per-file work across a bounded rayon pool. Probing, transcoding,
//! and compression run fully parallel; every output-tree write and every
//! batch log line is serialized through the [`FsGateway`]. Each file ends
//! in a [`FileOutcome`], and a failed file never aborts the batch: errors
//! stop at the per-file boundary as exactly one failure log entry.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::external::{GifCompressor, GifTranscoder, MediaProber};
use crate::gateway::{FsGateway, TraceId};
use crate::processing::compress::shrink_to_budget;
use crate::processing::paths::{output_path_for, processed_path_for};
use crate::processing::target::EncodeTarget;
use crate::temp_files;
use crate::utils::{format_bytes, format_duration, get_filename_safe};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Stage at which a file's conversion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Probe,
    Transcode,
    Compress,
    Filesystem,
}

impl FailureStage {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FailureStage::Probe => "probe",
            FailureStage::Transcode => "transcode",
            FailureStage::Compress => "compress",
            FailureStage::Filesystem => "filesystem",
        }
    }
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why one file produced no artifact.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub stage: FailureStage,
    /// Full error detail as recorded in the batch log
    pub detail: String,
}

impl FileFailure {
    fn new(stage: FailureStage, error: &CoreError) -> Self {
        Self {
            stage,
            detail: error.to_string(),
        }
    }
}

/// A successfully written output artifact.
#[derive(Debug, Clone, Serialize)]
pub struct FileArtifact {
    /// Path of the written GIF
    pub output_path: PathBuf,
    /// Compression step taken; -1 when the first pass fit the budget
    pub compression_step: i32,
    /// Source file size in bytes
    pub input_size: u64,
    /// Written GIF size in bytes
    pub output_size: u64,
    /// Wall-clock time spent on this file
    pub elapsed: Duration,
}

/// Terminal state of one source file after a batch pass.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub input_path: PathBuf,
    /// Trace id correlating this file's batch log lines
    pub trace_id: String,
    pub result: Result<FileArtifact, FileFailure>,
}

/// Aggregate of every file outcome in one batch pass.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Per-file outcomes, sorted by input path
    pub outcomes: Vec<FileOutcome>,
    /// Wall-clock time for the whole pass
    pub elapsed: Duration,
}

impl BatchReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Total source bytes of the files that converted successfully.
    #[must_use]
    pub fn total_input_bytes(&self) -> u64 {
        self.artifacts().map(|a| a.input_size).sum()
    }

    /// Total bytes written across all output artifacts.
    #[must_use]
    pub fn total_output_bytes(&self) -> u64 {
        self.artifacts().map(|a| a.output_size).sum()
    }

    /// Iterates over the failed files and their failure details.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &FileFailure)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(_) => None,
            Err(failure) => Some((o.input_path.as_path(), failure)),
        })
    }

    fn artifacts(&self) -> impl Iterator<Item = &FileArtifact> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

struct BatchContext<'a, P, T, C> {
    prober: &'a P,
    transcoder: &'a T,
    compressor: &'a C,
    config: &'a Config,
    gateway: &'a FsGateway,
    scratch_dir: PathBuf,
}

impl<P, T, C> BatchContext<'_, P, T, C>
where
    P: MediaProber,
    T: GifTranscoder,
    C: GifCompressor,
{
    /// Drives one file from probe to written artifact, bracketing the work
    /// with trace-correlated log lines. Never panics, never aborts the
    /// batch; whatever goes wrong lands in the outcome.
    fn process_file(&self, input: &Path) -> FileOutcome {
        let trace = TraceId::generate();
        let started = Instant::now();
        self.gateway
            .log(&trace, &format!("Processing '{}'", input.display()));

        let result = self.convert_file(input, &trace, started);

        match &result {
            Ok(artifact) => self.gateway.log(
                &trace,
                &format!(
                    "Finished '{}' -> '{}' ({}, step {})",
                    input.display(),
                    artifact.output_path.display(),
                    format_bytes(artifact.output_size),
                    artifact.compression_step
                ),
            ),
            Err(failure) => self.gateway.log(
                &trace,
                &format!(
                    "Failed to convert '{}': {} error: {}",
                    input.display(),
                    failure.stage,
                    failure.detail
                ),
            ),
        }

        FileOutcome {
            input_path: input.to_path_buf(),
            trace_id: trace.as_str().to_string(),
            result,
        }
    }

    fn convert_file(
        &self,
        input: &Path,
        trace: &TraceId,
        started: Instant,
    ) -> Result<FileArtifact, FileFailure> {
        let filename = get_filename_safe(input).unwrap_or_else(|_| input.display().to_string());

        let profile = self
            .prober
            .probe(input)
            .map_err(|e| FileFailure::new(FailureStage::Probe, &e))?;
        let target = EncodeTarget::derive(&profile, self.config);
        self.gateway.log(
            trace,
            &format!(
                "Encode target for '{filename}': {}fps, {}px tall",
                target.fps, target.height
            ),
        );

        let input_size = std::fs::metadata(input)
            .map_err(|e| FileFailure::new(FailureStage::Filesystem, &CoreError::Io(e)))?
            .len();

        let first_pass = self
            .transcoder
            .transcode(input, target, &self.scratch_dir)
            .map_err(|e| FileFailure::new(FailureStage::Transcode, &e))?;

        let compressed = shrink_to_budget(self.compressor, &first_pass, self.config.max_gif_size_kb)
            .map_err(|e| FileFailure::new(FailureStage::Compress, &e))?;
        if compressed.step >= 0 {
            self.gateway.log(
                trace,
                &format!(
                    "Compressed '{filename}' to {} KB at step {}",
                    compressed.size_kb(),
                    compressed.step
                ),
            );
        }

        let output_path = output_path_for(
            input,
            &self.config.input_dir,
            &self.config.output_dir,
            compressed.step,
        )
        .map_err(|e| FileFailure::new(FailureStage::Filesystem, &e))?;
        self.gateway
            .write_artifact(&output_path, &compressed.data)
            .map_err(|e| FileFailure::new(FailureStage::Filesystem, &e))?;

        if self.config.move_processed_files {
            let processed =
                processed_path_for(input, &self.config.input_dir, &self.config.output_dir)
                    .map_err(|e| FileFailure::new(FailureStage::Filesystem, &e))?;
            self.gateway
                .relocate(input, &processed)
                .map_err(|e| FileFailure::new(FailureStage::Filesystem, &e))?;
            self.gateway.log(
                trace,
                &format!("Relocated '{}' -> '{}'", input.display(), processed.display()),
            );
        }

        Ok(FileArtifact {
            output_path,
            compression_step: compressed.step,
            input_size,
            output_size: compressed.data.len() as u64,
            elapsed: started.elapsed(),
        })
    }
}

/// Converts every file in `files`, fanning work across a bounded pool of
/// `config.max_parallel_jobs` workers.
///
/// `on_file_done` fires as each file finishes, in completion order, from
/// worker threads. The returned report lists outcomes in input-path order.
/// The scratch directory is cleared before this function returns, whether
/// or not any file failed; configurations whose scratch directory overlaps
/// the input or output trees are refused before any work starts.
pub fn run_batch<P, T, C>(
    prober: &P,
    transcoder: &T,
    compressor: &C,
    config: &Config,
    gateway: &FsGateway,
    files: &[PathBuf],
    on_file_done: Option<&(dyn Fn(&FileOutcome) + Sync)>,
) -> CoreResult<BatchReport>
where
    P: MediaProber + Sync,
    T: GifTranscoder + Sync,
    C: GifCompressor + Sync,
{
    config.validate()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_parallel_jobs)
        .build()
        .map_err(|e| CoreError::OperationFailed(format!("Failed to build worker pool: {e}")))?;

    let scratch_dir = temp_files::ensure_scratch_dir(config)?;
    let batch_start = Instant::now();
    log::info!(
        "Starting batch of {} files with {} parallel jobs",
        files.len(),
        config.max_parallel_jobs
    );

    let context = BatchContext {
        prober,
        transcoder,
        compressor,
        config,
        gateway,
        scratch_dir,
    };

    let outcomes = Mutex::new(Vec::with_capacity(files.len()));
    pool.install(|| {
        files.par_iter().for_each(|input| {
            let outcome = context.process_file(input);
            if let Some(callback) = on_file_done {
                callback(&outcome);
            }
            match outcomes.lock() {
                Ok(mut collected) => collected.push(outcome),
                Err(poisoned) => poisoned.into_inner().push(outcome),
            }
        });
    });

    // Intermediates never survive a pass, not even a fully failed one.
    if let Err(e) = temp_files::clear_scratch_dir(config) {
        log::warn!("Failed to clear scratch directory: {e}");
    }

    let mut outcomes = outcomes
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // Completion order is nondeterministic; report in input order.
    outcomes.sort_by(|a, b| a.input_path.cmp(&b.input_path));

    let report = BatchReport {
        outcomes,
        elapsed: batch_start.elapsed(),
    };
    log::info!(
        "Batch finished: {} converted, {} failed in {}",
        report.succeeded(),
        report.failed(),
        format_duration(report.elapsed.as_secs_f64())
    );
    Ok(report)
}
