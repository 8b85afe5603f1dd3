//! Serialized filesystem and batch-log access.
//!
//! Workers run in parallel but every output-tree mutation and every batch
//! log line goes through one [`FsGateway`] guarded by a mutex, so two
//! workers can never race a directory creation or interleave log entries.
//! Read-only work (probing, transcoding, compressing in scratch space)
//! happens outside the gateway.

use crate::error::{CoreError, CoreResult};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Length of the per-file trace identifier in log lines.
pub const TRACE_ID_LEN: usize = 5;

/// Random alphanumeric identifier correlating all log lines of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(String);

impl TraceId {
    /// Generates a fresh 5-character alphanumeric identifier.
    #[must_use]
    pub fn generate() -> Self {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TRACE_ID_LEN)
            .map(char::from)
            .collect();
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

struct GatewayInner {
    log: File,
}

/// Mutex-protected gateway for output writes, relocations, and the batch log.
pub struct FsGateway {
    inner: Mutex<GatewayInner>,
}

impl FsGateway {
    /// Opens (or creates) the batch log at `log_path` in append mode,
    /// creating parent directories as needed.
    pub fn open(log_path: &Path) -> CoreResult<Self> {
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        Ok(Self {
            inner: Mutex::new(GatewayInner { log }),
        })
    }

    /// Appends one timestamped line to the batch log.
    ///
    /// Line format: `[<UTC timestamp>|<trace id>] <message>`. Logging never
    /// fails the caller; a log that cannot be written degrades to a process
    /// log warning.
    pub fn log(&self, trace: &TraceId, message: &str) {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let line = format!("[{timestamp}|{trace}] {message}");
        log::debug!("{line}");

        match self.inner.lock() {
            Ok(mut inner) => {
                if let Err(e) = writeln!(inner.log, "{line}") {
                    log::warn!("Failed to append to batch log: {e}");
                }
            }
            Err(_) => log::warn!("Batch log lock poisoned, dropping entry"),
        }
    }

    /// Writes `data` to `path`, creating missing parent directories first.
    pub fn write_artifact(&self, path: &Path, data: &[u8]) -> CoreResult<()> {
        let _inner = self.lock()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, data)?;
        Ok(())
    }

    /// Moves `src` to `dst`, creating missing parent directories first.
    ///
    /// Falls back to copy-plus-remove when a plain rename fails, which
    /// covers moves across filesystem boundaries.
    pub fn relocate(&self, src: &Path, dst: &Path) -> CoreResult<()> {
        let _inner = self.lock()?;
        if let Some(parent) = dst.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if fs::rename(src, dst).is_err() {
            fs::copy(src, dst)?;
            if let Err(e) = fs::remove_file(src) {
                log::warn!(
                    "Relocated '{}' but could not remove the original: {e}",
                    src.display()
                );
            }
        }
        Ok(())
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, GatewayInner>> {
        self.inner
            .lock()
            .map_err(|_| CoreError::OperationFailed("Filesystem gateway lock poisoned".to_string()))
    }
}
