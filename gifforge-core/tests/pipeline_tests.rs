// gifforge-core/tests/pipeline_tests.rs
//
// Drives the batch pipeline end to end with in-process engine stubs, so
// none of the external binaries are needed. Filesystem effects (artifact
// tree, relocation, batch log, scratch cleanup) are asserted for real.

use gifforge_core::error::{CoreError, CoreResult};
use gifforge_core::{
    BatchReport, Config, DitherMode, EncodeTarget, FailureStage, FileOutcome, FsGateway,
    GifCompressor, GifTranscoder, MediaProber, MediaProfile, run_batch,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

/// Fixed 30fps/720p profile; fails for names containing "badprobe".
struct StubProber;

impl MediaProber for StubProber {
    fn probe(&self, input: &Path) -> CoreResult<MediaProfile> {
        if file_name(input).contains("badprobe") {
            return Err(CoreError::VideoInfoError(format!(
                "No video stream found in {}",
                input.display()
            )));
        }
        Ok(MediaProfile {
            fps_num: 30,
            fps_den: 1,
            height: 720,
        })
    }
}

/// First-pass size keyed off the file name; fails for names containing
/// "badcode".
struct StubTranscoder;

impl GifTranscoder for StubTranscoder {
    fn transcode(
        &self,
        input: &Path,
        _target: EncodeTarget,
        _scratch_dir: &Path,
    ) -> CoreResult<Vec<u8>> {
        let name = file_name(input);
        if name.contains("badcode") {
            return Err(CoreError::OperationFailed(
                "encoder rejected stream".to_string(),
            ));
        }
        let kb = if name.contains("huge") {
            2048
        } else if name.contains("big") {
            900
        } else {
            100
        };
        Ok(vec![b'G'; kb * 1024])
    }
}

/// Deterministic shrink: output length scales with the palette size.
struct RatioCompressor;

impl GifCompressor for RatioCompressor {
    fn compress(&self, gif: &[u8], palette_size: u32, _dither: DitherMode) -> CoreResult<Vec<u8>> {
        Ok(vec![b'g'; gif.len() * palette_size as usize / 256])
    }
}

/// Rejects every buffer, standing in for a gifsicle that always dies.
struct FailingCompressor;

impl GifCompressor for FailingCompressor {
    fn compress(
        &self,
        _gif: &[u8],
        _palette_size: u32,
        _dither: DitherMode,
    ) -> CoreResult<Vec<u8>> {
        Err(CoreError::OperationFailed(
            "palette write failed".to_string(),
        ))
    }
}

fn test_config(root: &Path) -> Config {
    Config {
        input_dir: root.join("in"),
        output_dir: root.join("out"),
        max_gif_size_kb: 500,
        max_gif_fps: 20,
        max_gif_height_px: 480,
        move_processed_files: false,
        max_parallel_jobs: 4,
        temp_dir: Some(root.join("scratch")),
        log_file: None,
    }
}

fn write_sources(input_dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for name in names {
        let path = input_dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"source video bytes").unwrap();
        files.push(path);
    }
    files.sort();
    files
}

fn run(config: &Config, files: &[PathBuf]) -> BatchReport {
    let gateway = FsGateway::open(&config.log_path()).unwrap();
    run_batch(
        &StubProber,
        &StubTranscoder,
        &RatioCompressor,
        config,
        &gateway,
        files,
        None,
    )
    .unwrap()
}

fn read_log(config: &Config) -> String {
    std::fs::read_to_string(config.log_path()).unwrap()
}

#[test]
fn test_failures_are_isolated_per_file() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    let files = write_sources(
        &config.input_dir,
        &[
            "a.mp4",
            "b/nested.mp4",
            "badprobe.bin",
            "badcode.mov",
            "c.txt",
        ],
    );

    let report = run(&config, &files);

    // N files, M failures: N-M artifacts and M failure log entries
    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 2);

    assert!(config.output_dir.join("a.gif").is_file());
    assert!(config.output_dir.join("b/nested.gif").is_file());
    assert!(config.output_dir.join("c.gif").is_file());
    assert!(!config.output_dir.join("badprobe.gif").exists());
    assert!(!config.output_dir.join("badcode.gif").exists());

    let log = read_log(&config);
    let failure_lines = log
        .lines()
        .filter(|l| l.contains("Failed to convert"))
        .count();
    assert_eq!(failure_lines, 2);

    // Failures carry the stage they died at
    for outcome in &report.outcomes {
        let name = file_name(&outcome.input_path);
        match &outcome.result {
            Err(failure) if name.contains("badprobe") => {
                assert_eq!(failure.stage, FailureStage::Probe);
            }
            Err(failure) if name.contains("badcode") => {
                assert_eq!(failure.stage, FailureStage::Transcode);
            }
            Err(failure) => panic!("unexpected failure for {name}: {failure:?}"),
            Ok(_) => assert!(!name.contains("bad")),
        }
    }

    // Outcomes come back in input order regardless of completion order
    let reported: Vec<&PathBuf> = report.outcomes.iter().map(|o| &o.input_path).collect();
    let mut expected: Vec<&PathBuf> = files.iter().collect();
    expected.sort();
    assert_eq!(reported, expected);
}

#[test]
fn test_failed_compression_reports_compress_stage() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    let files = write_sources(&config.input_dir, &["a.mp4", "big.mp4"]);

    let gateway = FsGateway::open(&config.log_path()).unwrap();
    let report = run_batch(
        &StubProber,
        &StubTranscoder,
        &FailingCompressor,
        &config,
        &gateway,
        &files,
        None,
    )
    .unwrap();

    // Only the over-budget file ever reaches the compressor
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(config.output_dir.join("a.gif").is_file());
    assert!(!config.output_dir.join("big.gif").exists());

    let (path, failure) = report.failures().next().unwrap();
    assert_eq!(path, config.input_dir.join("big.mp4").as_path());
    assert_eq!(failure.stage, FailureStage::Compress);
    assert!(failure.detail.contains("palette write failed"));
    assert!(read_log(&config).contains("compress error:"));
}

#[test]
fn test_unwritable_artifact_reports_filesystem_stage() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    let files = write_sources(&config.input_dir, &["clip.mp4", "other.mp4"]);

    // A directory squatting on the artifact path makes the write fail
    std::fs::create_dir_all(config.output_dir.join("clip.gif")).unwrap();

    let report = run(&config, &files);

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(config.output_dir.join("other.gif").is_file());

    let (path, failure) = report.failures().next().unwrap();
    assert_eq!(path, config.input_dir.join("clip.mp4").as_path());
    assert_eq!(failure.stage, FailureStage::Filesystem);
    assert!(read_log(&config).contains("filesystem error:"));
}

#[test]
fn test_relocation_moves_source_under_processed() {
    let root = tempdir().unwrap();
    let mut config = test_config(root.path());
    config.move_processed_files = true;
    let files = write_sources(&config.input_dir, &["sub/a.mp4"]);

    let report = run(&config, &files);
    assert_eq!(report.succeeded(), 1);

    // Artifact mirrors the input tree; the source moves under _processed
    assert!(config.output_dir.join("sub/a.gif").is_file());
    assert!(!config.input_dir.join("sub/a.mp4").exists());
    let relocated = config.output_dir.join("_processed/sub/a.mp4");
    assert_eq!(std::fs::read(&relocated).unwrap(), b"source video bytes");
}

#[test]
fn test_compression_step_suffixes() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    let files = write_sources(&config.input_dir, &["small.mp4", "big.mp4", "huge.mp4"]);

    let report = run(&config, &files);
    assert_eq!(report.succeeded(), 3);

    // 100 KB first pass fits untouched: step -1, bare name
    assert!(config.output_dir.join("small.gif").is_file());
    // 900 KB shrinks to 450 KB on the first attempt: step 0, still bare
    assert!(config.output_dir.join("big.gif").is_file());
    // 2048 KB needs the 48-color attempt: step 5, suffixed name
    assert!(config.output_dir.join("huge[c5].gif").is_file());
    assert!(!config.output_dir.join("huge.gif").exists());

    let step_of = |name: &str| {
        report
            .outcomes
            .iter()
            .find(|o| file_name(&o.input_path) == name)
            .and_then(|o| o.result.as_ref().ok())
            .map(|a| a.compression_step)
            .unwrap()
    };
    assert_eq!(step_of("small.mp4"), -1);
    assert_eq!(step_of("big.mp4"), 0);
    assert_eq!(step_of("huge.mp4"), 5);
}

#[test]
fn test_many_files_share_one_output_directory() {
    let root = tempdir().unwrap();
    let mut config = test_config(root.path());
    config.max_parallel_jobs = 8;

    let names: Vec<String> = (0..40).map(|i| format!("clip{i:02}.mp4")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let files = write_sources(&config.input_dir, &name_refs);

    let report = run(&config, &files);

    // No directory-creation races and no truncated writes
    assert_eq!(report.succeeded(), 40);
    for name in &names {
        let gif = config.output_dir.join(name.replace(".mp4", ".gif"));
        assert_eq!(
            std::fs::metadata(&gif).unwrap().len(),
            100 * 1024,
            "truncated artifact: {}",
            gif.display()
        );
    }
}

#[test]
fn test_trace_ids_correlate_log_lines() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    let files = write_sources(&config.input_dir, &["a.mp4", "b.mp4", "badcode.mov"]);

    let report = run(&config, &files);
    let log = read_log(&config);

    for outcome in &report.outcomes {
        assert_eq!(outcome.trace_id.len(), 5);

        let marker = format!("|{}]", outcome.trace_id);
        let lines: Vec<&str> = log.lines().filter(|l| l.contains(&marker)).collect();
        assert!(
            lines.len() >= 2,
            "expected start and terminal lines for {}",
            outcome.input_path.display()
        );

        let terminal = lines
            .iter()
            .filter(|l| l.contains("Finished") || l.contains("Failed to convert"))
            .count();
        assert_eq!(terminal, 1, "one terminal line per file");
    }
}

#[test]
fn test_stage_log_lines_use_bare_file_names() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    let files = write_sources(&config.input_dir, &["sub/clip.mp4", "sub/big.mp4"]);

    run(&config, &files);
    let log = read_log(&config);

    // Bracketing lines carry the full path; per-stage lines only the name
    let clip = config.input_dir.join("sub/clip.mp4");
    assert!(log.contains(&format!("Processing '{}'", clip.display())));
    assert!(log.contains("Encode target for 'clip.mp4'"));
    assert!(!log.contains(&format!("Encode target for '{}'", clip.display())));
    assert!(log.contains("Compressed 'big.mp4' to"));
}

#[test]
fn test_scratch_directory_cleared_after_run() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    let files = write_sources(&config.input_dir, &["a.mp4", "badcode.mov"]);

    // Pre-seed a stale intermediate from an earlier aborted pass
    let scratch = root.path().join("scratch");
    std::fs::create_dir_all(&scratch).unwrap();
    std::fs::write(scratch.join("stale.gif"), b"GIF89a").unwrap();

    run(&config, &files);

    assert!(scratch.is_dir(), "scratch directory is recreated empty");
    assert_eq!(
        std::fs::read_dir(&scratch).unwrap().count(),
        0,
        "no intermediates survive the pass"
    );
}

#[test]
fn test_scratch_overlapping_output_is_refused() {
    let root = tempdir().unwrap();
    let mut config = test_config(root.path());
    config.temp_dir = Some(config.output_dir.clone());

    // Artifacts from an earlier run sit where the scratch wipe would land
    std::fs::create_dir_all(&config.output_dir).unwrap();
    std::fs::write(config.output_dir.join("earlier.gif"), b"GIF89a").unwrap();
    let files = write_sources(&config.input_dir, &["clip.mp4"]);

    let gateway = FsGateway::open(&config.log_path()).unwrap();
    let err = run_batch(
        &StubProber,
        &StubTranscoder,
        &RatioCompressor,
        &config,
        &gateway,
        &files,
        None,
    )
    .unwrap_err();

    assert!(
        err.to_string().contains("TEMP_FOLDER"),
        "unexpected error: {err}"
    );
    assert!(
        config.output_dir.join("earlier.gif").is_file(),
        "a refused batch must leave the output tree untouched"
    );
    assert!(config.input_dir.join("clip.mp4").is_file());
}

#[test]
fn test_completion_callback_fires_per_file() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    let files = write_sources(&config.input_dir, &["a.mp4", "b.mp4", "badprobe.bin"]);

    let seen: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());
    let callback = |outcome: &FileOutcome| {
        seen.lock().unwrap().push(outcome.input_path.clone());
    };
    let on_done: &(dyn Fn(&FileOutcome) + Sync) = &callback;

    let gateway = FsGateway::open(&config.log_path()).unwrap();
    run_batch(
        &StubProber,
        &StubTranscoder,
        &RatioCompressor,
        &config,
        &gateway,
        &files,
        Some(on_done),
    )
    .unwrap();

    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    assert_eq!(seen, files);
}

#[test]
fn test_empty_batch_is_ok() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    std::fs::create_dir_all(&config.input_dir).unwrap();

    let report = run(&config, &[]);

    assert!(report.outcomes.is_empty());
    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.failed(), 0);
}
