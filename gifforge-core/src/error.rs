//! Error types for the gifforge-core library.
//!
//! All fallible operations in this crate return [`CoreResult`], and external
//! tool failures are wrapped with enough context (tool name, exit status,
//! captured stderr) to produce a useful log entry at the per-file boundary.

use thiserror::Error;

/// Error type covering every failure the core library can produce.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No files found in the input directory")]
    NoFilesFound,

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Failed to parse ffprobe output: {0}")]
    FfprobeParse(String),

    #[error("Video info error: {0}")]
    VideoInfoError(String),

    #[error("JSON parsing error: {0}")]
    JsonParseError(String),

    #[error("Command '{0}' failed with status {1}. Stderr: {2}")]
    CommandFailed(String, std::process::ExitStatus, String),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, std::io::Error),

    #[error("Error waiting for command '{0}': {1}")]
    CommandWait(String, std::io::Error),

    #[error("Required external dependency '{0}' not found in PATH")]
    DependencyNotFound(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for gifforge-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds a [`CoreError::CommandFailed`] from a finished child process.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: std::process::ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(cmd.into(), status, stderr.into())
}

/// Builds a [`CoreError::CommandStart`] for a child process that never ran.
pub fn command_start_error(cmd: impl Into<String>, e: std::io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), e)
}

/// Builds a [`CoreError::CommandWait`] for a child process that could not be
/// waited on.
pub fn command_wait_error(cmd: impl Into<String>, e: std::io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), e)
}
