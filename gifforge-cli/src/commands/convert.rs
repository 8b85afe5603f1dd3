//! Implementation of the 'convert' subcommand.
//!
//! Loads the configuration file, applies command-line overrides, discovers
//! source files, and delegates the batch to gifforge-core, reporting
//! per-file progress and a final summary on the terminal.

use crate::cli::ConvertArgs;
use crate::error::CliResult;

use gifforge_core::utils::{calculate_size_reduction, get_filename_safe};
use gifforge_core::{
    BatchReport, Config, CoreError, FfmpegTranscoder, FfprobeProber, FileOutcome, FsGateway,
    GifsicleCompressor, check_dependency, find_source_files, format_bytes, format_duration,
    run_batch,
};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// External binaries the conversion engines shell out to.
const REQUIRED_TOOLS: [&str; 3] = ["ffmpeg", "ffprobe", "gifsicle"];

/// Loads the configuration file and applies command-line overrides.
pub fn load_config(args: &ConvertArgs) -> CliResult<Config> {
    let mut config = Config::from_file(&args.config_path)?;

    if let Some(input_dir) = &args.input_dir {
        config.input_dir = input_dir.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(jobs) = args.jobs {
        config.max_parallel_jobs = jobs;
    }

    // Overrides bypass the parser, so revalidate
    config.validate()?;
    Ok(config)
}

/// Discovers source files, treating an empty input tree as an empty batch.
fn discover_sources(config: &Config) -> CliResult<Vec<PathBuf>> {
    match find_source_files(&config.input_dir) {
        Ok(files) => Ok(files),
        Err(CoreError::NoFilesFound) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

pub fn run_convert(args: ConvertArgs) -> CliResult<()> {
    let config = load_config(&args)?;

    let files = discover_sources(&config)?;
    if files.is_empty() {
        warn!(
            "No files found under '{}', nothing to do",
            config.input_dir.display()
        );
        return Ok(());
    }
    info!(
        "Found {} file(s) under '{}'",
        files.len(),
        config.input_dir.display()
    );

    for tool in REQUIRED_TOOLS {
        check_dependency(tool)?;
    }
    info!("External dependency check passed");

    let gateway = FsGateway::open(&config.log_path())?;
    info!("Batch log: {}", config.log_path().display());

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} files")
            .map_err(|e| CoreError::OperationFailed(format!("Invalid progress template: {e}")))?,
    );

    let print_outcome = |outcome: &FileOutcome| {
        let name = get_filename_safe(&outcome.input_path)
            .unwrap_or_else(|_| outcome.input_path.display().to_string());
        match &outcome.result {
            Ok(artifact) => progress.println(format!(
                "{} {} -> {}",
                style("[OK]").green(),
                name,
                artifact.output_path.display()
            )),
            Err(failure) => progress.println(format!(
                "{} {} ({} error)",
                style("[FAIL]").red(),
                name,
                failure.stage
            )),
        }
        progress.inc(1);
    };
    let on_file_done: &(dyn Fn(&FileOutcome) + Sync) = &print_outcome;

    let report = run_batch(
        &FfprobeProber,
        &FfmpegTranscoder,
        &GifsicleCompressor,
        &config,
        &gateway,
        &files,
        Some(on_file_done),
    )?;
    progress.finish_and_clear();

    print_summary(&report);

    if let Some(report_path) = &args.report_json {
        write_json_report(&report, report_path)?;
        info!("Report written to {}", report_path.display());
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!();
    println!("{}", style("Conversion complete").bold());
    println!("  Converted: {}", style(report.succeeded()).green());
    if report.failed() > 0 {
        println!("  Failed:    {}", style(report.failed()).red());
    }

    let input_bytes = report.total_input_bytes();
    let output_bytes = report.total_output_bytes();
    if input_bytes > 0 {
        println!(
            "  Size:      {} -> {} (reduced by {}%)",
            format_bytes(input_bytes),
            format_bytes(output_bytes),
            calculate_size_reduction(input_bytes, output_bytes)
        );
    }
    println!(
        "  Time:      {}",
        format_duration(report.elapsed.as_secs_f64())
    );

    for (path, failure) in report.failures() {
        println!(
            "  {} {}: {} error: {}",
            style("failed").red(),
            path.display(),
            failure.stage,
            failure.detail
        );
    }
}

fn write_json_report(report: &BatchReport, path: &Path) -> CliResult<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| {
        CoreError::JsonParseError(format!("Failed to serialize batch report: {e}"))
    })?;
    std::fs::write(path, json)?;
    Ok(())
}
