//! Configuration for the gifforge-core library.
//!
//! The configuration comes from a flat key/value text file: lines whose
//! first non-blank character is `#` are comments, lines containing `:` are
//! parsed as `key: value` with both sides trimmed, everything else is
//! ignored. The parsed [`Config`] is immutable and passed by reference into
//! the pipeline; there is no ambient global state.

use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of the batch log when `LOG_FILE` is not set, placed under the
/// output directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "gifforge.log";

/// Immutable settings for one conversion run.
///
/// Required keys: `INPUT_FOLDER`, `OUTPUT_FOLDER`, `MAX_GIF_SIZE_KB`,
/// `MAX_GIF_FPS`, `MAX_GIF_HEIGHT_PX`,
/// `MOVE_PROCESSED_FILES_TO_OUTPUT_FOLDER`.
/// Optional keys: `MAX_PARALLEL_JOBS`, `TEMP_FOLDER`, `LOG_FILE`.
///
/// # Examples
///
/// ```rust
/// use gifforge_core::Config;
///
/// let config = Config::parse(
///     "# caps\n\
///      INPUT_FOLDER: ./videos\n\
///      OUTPUT_FOLDER: ./gifs\n\
///      MAX_GIF_SIZE_KB: 500\n\
///      MAX_GIF_FPS: 20\n\
///      MAX_GIF_HEIGHT_PX: 480\n\
///      MOVE_PROCESSED_FILES_TO_OUTPUT_FOLDER: false\n",
/// )
/// .unwrap();
/// assert_eq!(config.max_gif_fps, 20);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory scanned recursively for source files
    pub input_dir: PathBuf,

    /// Root directory receiving the mirrored GIF tree
    pub output_dir: PathBuf,

    /// Byte budget for finished GIFs, in kilobytes
    pub max_gif_size_kb: u64,

    /// Upper bound on the encoded frame rate
    pub max_gif_fps: u32,

    /// Upper bound on the encoded frame height in pixels
    pub max_gif_height_px: u32,

    /// Whether successfully converted sources move under `<output>/_processed`
    pub move_processed_files: bool,

    /// Worker pool size for parallel conversion (defaults to the logical CPU count)
    pub max_parallel_jobs: usize,

    /// Optional scratch directory override (defaults to `<system temp>/gifforge`).
    /// Wiped after every pass, so it must not overlap the input or output trees.
    pub temp_dir: Option<PathBuf>,

    /// Optional batch log file override (defaults to `<output>/gifforge.log`)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            max_gif_size_kb: 500,
            max_gif_fps: 20,
            max_gif_height_px: 480,
            move_processed_files: false,
            max_parallel_jobs: num_cpus::get(),
            temp_dir: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Reads and parses the configuration file at `path`.
    pub fn from_file(path: &std::path::Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&text)
    }

    /// Parses configuration text into a validated [`Config`].
    pub fn parse(text: &str) -> CoreResult<Self> {
        let mut map: HashMap<String, String> = HashMap::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            // Only the first colon separates key from value, so path values
            // containing colons stay intact.
            if let Some((key, value)) = trimmed.split_once(':') {
                map.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        let max_parallel_jobs = match map.get("MAX_PARALLEL_JOBS") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                CoreError::Config(format!("Invalid value '{raw}' for MAX_PARALLEL_JOBS: {e}"))
            })?,
            None => num_cpus::get(),
        };

        let config = Self {
            input_dir: PathBuf::from(require(&map, "INPUT_FOLDER")?),
            output_dir: PathBuf::from(require(&map, "OUTPUT_FOLDER")?),
            max_gif_size_kb: parse_value(&map, "MAX_GIF_SIZE_KB")?,
            max_gif_fps: parse_value(&map, "MAX_GIF_FPS")?,
            max_gif_height_px: parse_value(&map, "MAX_GIF_HEIGHT_PX")?,
            move_processed_files: parse_bool(&map, "MOVE_PROCESSED_FILES_TO_OUTPUT_FOLDER")?,
            max_parallel_jobs,
            temp_dir: map.get("TEMP_FOLDER").map(PathBuf::from),
            log_file: map.get("LOG_FILE").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks numeric invariants and the scratch directory layout. Called
    /// by [`Config::parse`] and again by consumers that override fields
    /// afterwards.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_gif_size_kb == 0 {
            return Err(CoreError::Config(
                "MAX_GIF_SIZE_KB must be at least 1".to_string(),
            ));
        }
        if self.max_gif_fps == 0 {
            return Err(CoreError::Config(
                "MAX_GIF_FPS must be at least 1".to_string(),
            ));
        }
        if self.max_gif_height_px == 0 {
            return Err(CoreError::Config(
                "MAX_GIF_HEIGHT_PX must be at least 1".to_string(),
            ));
        }
        if self.max_parallel_jobs == 0 {
            return Err(CoreError::Config(
                "MAX_PARALLEL_JOBS must be at least 1".to_string(),
            ));
        }

        // The scratch directory is wiped after every pass, so it must not
        // contain or sit inside the source or output trees.
        let scratch = crate::temp_files::scratch_dir(self);
        for (key, root) in [
            ("INPUT_FOLDER", &self.input_dir),
            ("OUTPUT_FOLDER", &self.output_dir),
        ] {
            if overlaps(&scratch, root) {
                return Err(CoreError::Config(format!(
                    "TEMP_FOLDER '{}' must not overlap {key} '{}'",
                    scratch.display(),
                    root.display()
                )));
            }
        }
        Ok(())
    }

    /// Path of the batch log file, defaulting to
    /// [`DEFAULT_LOG_FILE_NAME`] under the output directory.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_LOG_FILE_NAME))
    }
}

fn require<'a>(map: &'a HashMap<String, String>, key: &str) -> CoreResult<&'a str> {
    map.get(key)
        .map(String::as_str)
        .ok_or_else(|| CoreError::Config(format!("Missing required key {key}")))
}

fn parse_value<T>(map: &HashMap<String, String>, key: &str) -> CoreResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = require(map, key)?;
    raw.parse::<T>()
        .map_err(|e| CoreError::Config(format!("Invalid value '{raw}' for {key}: {e}")))
}

/// Component-wise test that one path equals, contains, or sits inside the
/// other. Paths are compared as written, without touching the filesystem.
fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

fn parse_bool(map: &HashMap<String, String>, key: &str) -> CoreResult<bool> {
    let raw = require(map, key)?;
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(CoreError::Config(format!(
            "Invalid value '{raw}' for {key}: expected true or false"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const COMPLETE: &str = "\
# GifForge settings
INPUT_FOLDER: /data/videos
OUTPUT_FOLDER: /data/gifs

MAX_GIF_SIZE_KB: 500
MAX_GIF_FPS: 20
MAX_GIF_HEIGHT_PX: 480
MOVE_PROCESSED_FILES_TO_OUTPUT_FOLDER: true
";

    #[test]
    fn test_parse_complete_config() {
        let config = Config::parse(COMPLETE).unwrap();
        assert_eq!(config.input_dir, Path::new("/data/videos"));
        assert_eq!(config.output_dir, Path::new("/data/gifs"));
        assert_eq!(config.max_gif_size_kb, 500);
        assert_eq!(config.max_gif_fps, 20);
        assert_eq!(config.max_gif_height_px, 480);
        assert!(config.move_processed_files);

        // Optional keys fall back to defaults
        assert_eq!(config.max_parallel_jobs, num_cpus::get());
        assert!(config.temp_dir.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_parse_optional_keys() {
        let text = format!(
            "{COMPLETE}MAX_PARALLEL_JOBS: 3\nTEMP_FOLDER: /tmp/forge\nLOG_FILE: /var/log/forge.log\n"
        );
        let config = Config::parse(&text).unwrap();
        assert_eq!(config.max_parallel_jobs, 3);
        assert_eq!(config.temp_dir.as_deref(), Some(Path::new("/tmp/forge")));
        assert_eq!(
            config.log_file.as_deref(),
            Some(Path::new("/var/log/forge.log"))
        );
    }

    #[test]
    fn test_parse_ignores_comments_and_noise() {
        let text = format!("{COMPLETE}# MAX_GIF_FPS: 99\nnot a key value line\n");
        let config = Config::parse(&text).unwrap();
        assert_eq!(config.max_gif_fps, 20, "commented-out key must not apply");
    }

    #[test]
    fn test_parse_splits_on_first_colon_only() {
        let text = COMPLETE.replace("/data/videos", "C:/videos");
        let config = Config::parse(&text).unwrap();
        assert_eq!(config.input_dir, Path::new("C:/videos"));
    }

    #[test]
    fn test_parse_missing_key_names_it() {
        let text = COMPLETE.replace("MAX_GIF_HEIGHT_PX: 480\n", "");
        let err = Config::parse(&text).unwrap_err();
        assert!(
            err.to_string().contains("MAX_GIF_HEIGHT_PX"),
            "error should name the missing key: {err}"
        );
    }

    #[test]
    fn test_parse_invalid_integer() {
        let text = COMPLETE.replace("MAX_GIF_SIZE_KB: 500", "MAX_GIF_SIZE_KB: lots");
        let err = Config::parse(&text).unwrap_err();
        assert!(err.to_string().contains("MAX_GIF_SIZE_KB"));
        assert!(err.to_string().contains("lots"));
    }

    #[test]
    fn test_parse_bool_case_insensitive() {
        for raw in ["true", "TRUE", "True"] {
            let text = COMPLETE.replace(
                "MOVE_PROCESSED_FILES_TO_OUTPUT_FOLDER: true",
                &format!("MOVE_PROCESSED_FILES_TO_OUTPUT_FOLDER: {raw}"),
            );
            assert!(Config::parse(&text).unwrap().move_processed_files);
        }
        let text = COMPLETE.replace(
            "MOVE_PROCESSED_FILES_TO_OUTPUT_FOLDER: true",
            "MOVE_PROCESSED_FILES_TO_OUTPUT_FOLDER: False",
        );
        assert!(!Config::parse(&text).unwrap().move_processed_files);
    }

    #[test]
    fn test_parse_bool_rejects_other_values() {
        let text = COMPLETE.replace(
            "MOVE_PROCESSED_FILES_TO_OUTPUT_FOLDER: true",
            "MOVE_PROCESSED_FILES_TO_OUTPUT_FOLDER: yes",
        );
        let err = Config::parse(&text).unwrap_err();
        assert!(err.to_string().contains("expected true or false"));
    }

    #[test]
    fn test_validate_rejects_zero_caps() {
        for (key, value) in [
            ("MAX_GIF_SIZE_KB", "500"),
            ("MAX_GIF_FPS", "20"),
            ("MAX_GIF_HEIGHT_PX", "480"),
        ] {
            let text = COMPLETE.replace(&format!("{key}: {value}"), &format!("{key}: 0"));
            let err = Config::parse(&text).unwrap_err();
            assert!(err.to_string().contains(key), "zero {key} must be rejected");
        }

        let text = format!("{COMPLETE}MAX_PARALLEL_JOBS: 0\n");
        assert!(Config::parse(&text).is_err());
    }

    #[test]
    fn test_validate_rejects_overlapping_temp_folder() {
        // Equal to the output tree, ancestor of both trees, inside the
        // input tree: each layout would put user data under the wipe.
        for temp in ["/data/gifs", "/data", "/data/videos/cache"] {
            let text = format!("{COMPLETE}TEMP_FOLDER: {temp}\n");
            let err = Config::parse(&text).unwrap_err();
            assert!(
                err.to_string().contains("TEMP_FOLDER"),
                "temp folder '{temp}' must be rejected: {err}"
            );
        }

        let text = format!("{COMPLETE}TEMP_FOLDER: /data/scratch\n");
        assert!(Config::parse(&text).is_ok(), "disjoint sibling is fine");
    }

    #[test]
    fn test_log_path_default_and_override() {
        let config = Config::parse(COMPLETE).unwrap();
        assert_eq!(config.log_path(), Path::new("/data/gifs/gifforge.log"));

        let text = format!("{COMPLETE}LOG_FILE: /var/log/forge.log\n");
        let config = Config::parse(&text).unwrap();
        assert_eq!(config.log_path(), Path::new("/var/log/forge.log"));
    }

    #[test]
    fn test_from_file_missing_file() {
        let err = Config::from_file(Path::new("no/such/config.conf")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
