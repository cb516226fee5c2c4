//! Retrying file access for the domain files.
//!
//! Desktop file systems routinely have short-lived external lockers (virus
//! scanners, indexers, sync clients). Reads retry once; writes retry with
//! exponential backoff. Non-transient errors are never retried.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::thread;

use crate::config::{RetryConfig, RetryPolicy};
use crate::error::{PersistenceError, Result, is_transient};

/// Text file access used by the coordinator and manager.
///
/// Implementations must be safe to call from blocking worker threads.
pub trait TextStore: Send + Sync + 'static {
    /// Read the whole file as UTF-8 text.
    fn read_text(&self, path: &Path) -> Result<String>;

    /// Replace the file's contents with `text`.
    fn write_text(&self, path: &Path, text: &str) -> Result<()>;

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Outcome of a retried operation, with the number of attempts made.
#[derive(Debug)]
pub(crate) struct Attempted<T> {
    pub result: io::Result<T>,
    pub attempts: u32,
}

/// Run `op` until it succeeds, fails non-transiently, or the policy is
/// exhausted. `op` receives the 0-based attempt number.
pub(crate) fn with_retries<T>(
    policy: RetryPolicy,
    what: &'static str,
    path: &Path,
    mut op: impl FnMut(u32) -> io::Result<T>,
) -> Attempted<T> {
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(path = %path.display(), attempt = attempt + 1, "{what} succeeded after retry");
                }
                return Attempted {
                    result: Ok(value),
                    attempts: attempt + 1,
                };
            }
            Err(e) if is_transient(&e) && attempt < policy.max_retries => {
                let backoff = policy.backoff_for_retry(attempt);
                tracing::warn!(
                    path = %path.display(),
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "{what} failed transiently, will retry"
                );
                thread::sleep(backoff);
                attempt += 1;
            }
            Err(e) => {
                return Attempted {
                    result: Err(e),
                    attempts: attempt + 1,
                };
            }
        }
    }
}

/// The production [`TextStore`].
#[derive(Debug, Clone, Default)]
pub struct DurableFileStore {
    retry: RetryConfig,
}

impl DurableFileStore {
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry }
    }

    fn write_once(path: &Path, text: &str) -> io::Result<()> {
        // The folder may have been removed by the user or a cleanup tool.
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = open_shared_write(path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()
    }
}

impl TextStore for DurableFileStore {
    fn read_text(&self, path: &Path) -> Result<String> {
        read_with_retry(self.retry.read_policy(), path, |_| fs::read_to_string(path))
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        let policy = self.retry.write_policy();
        let attempted = with_retries(policy, "Write", path, |_| Self::write_once(path, text));
        match attempted.result {
            Ok(()) => {
                tracing::debug!(path = %path.display(), bytes = text.len(), "Wrote file");
                Ok(())
            }
            Err(e) if is_transient(&e) => {
                tracing::error!(
                    path = %path.display(),
                    attempts = attempted.attempts,
                    error = %e,
                    "Write retries exhausted"
                );
                Err(PersistenceError::WriteFailed {
                    path: path.to_path_buf(),
                    attempts: attempted.attempts,
                    source: e,
                })
            }
            Err(e) => Err(PersistenceError::Io {
                operation: "write",
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

/// Read through `read`, retrying transient failures per `policy`.
fn read_with_retry(
    policy: RetryPolicy,
    path: &Path,
    read: impl FnMut(u32) -> io::Result<String>,
) -> Result<String> {
    let attempted = with_retries(policy, "Read", path, read);
    attempted.result.map_err(|e| {
        let err = PersistenceError::from_io("read", path, e);
        if err.is_transient() {
            tracing::error!(path = %path.display(), attempts = attempted.attempts, "Read retry exhausted");
        }
        err
    })
}

/// Create/truncate `path` for writing while still letting other processes
/// open it for reading.
fn open_shared_write(path: &Path) -> io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        // FILE_SHARE_READ
        options.share_mode(0x0000_0001);
    }

    options.open(path)
}
