//! Persistence error types.
//!
//! All persistence operations return structured errors that provide
//! user-friendly messages and optional remediation hints. Public entry
//! points never panic on I/O; they hand one of these back instead.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::layout::Domain;

/// Windows `ERROR_SHARING_VIOLATION`.
const WIN_SHARING_VIOLATION: i32 = 32;
/// Windows `ERROR_LOCK_VIOLATION`.
const WIN_LOCK_VIOLATION: i32 = 33;

/// Persistence operation error.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The file does not exist. Benign: callers fall back to defaults.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// Another process briefly held the file (scanner, indexer, editor).
    #[error("File is temporarily unavailable ({operation}): {path}")]
    TransientIo {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Non-transient file I/O error, never retried.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The JSON text could not be produced or parsed.
    #[error("Failed to {operation} {domain} data")]
    Serialization {
        domain: Domain,
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Every write attempt failed transiently.
    #[error("Failed to write {path} after {attempts} attempts")]
    WriteFailed {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    /// The background auto-save lane for a domain has stopped.
    #[error("Auto-save for {domain} data is no longer running")]
    CoordinatorStopped { domain: Domain },

    /// A named backup folder does not exist.
    #[error("Backup not found: {name}")]
    BackupNotFound { name: String },

    /// Settings could not be rendered as TOML.
    #[error("Failed to serialize settings for {path}")]
    ConfigSerialization {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
}

impl PersistenceError {
    /// Classify an I/O error raised while performing `operation` on `path`.
    pub(crate) fn from_io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else if is_transient(&source) {
            Self::TransientIo {
                operation,
                path: path.to_path_buf(),
                source,
            }
        } else {
            Self::Io {
                operation,
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Whether the error is a missing file.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the error is worth retrying.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo { .. })
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { path } => {
                format!("No saved data was found at {}", path.display())
            }
            Self::TransientIo { path, .. } => {
                format!(
                    "The file at {} is being used by another program",
                    path.display()
                )
            }
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the file at {}", operation, path.display())
            }
            Self::Serialization {
                domain, operation, ..
            } => {
                if *operation == "parse" {
                    format!("The saved {} data is corrupted", domain.label())
                } else {
                    format!("The {} data could not be prepared for saving", domain.label())
                }
            }
            Self::WriteFailed { path, attempts, .. } => {
                format!(
                    "Could not save {} after {} attempts",
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("data file"),
                    attempts
                )
            }
            Self::CoordinatorStopped { domain } => {
                format!("Saving of {} data has stopped", domain.label())
            }
            Self::BackupNotFound { name } => format!("There is no backup named '{name}'"),
            Self::ConfigSerialization { path, .. } => {
                format!("The settings could not be saved to {}", path.display())
            }
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { .. }
            | Self::CoordinatorStopped { .. }
            | Self::ConfigSerialization { .. } => None,
            Self::TransientIo { .. } | Self::WriteFailed { .. } => Some(
                "Close any program that may have the data folder open and save again.".into(),
            ),
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that you have permission to read the data folder.".into())
                } else {
                    Some("Check disk space and permission to write to the data folder.".into())
                }
            }
            Self::Serialization { .. } => {
                Some("Restore the file from the Backup folder if one is available.".into())
            }
            Self::BackupNotFound { .. } => Some("List the available backups first.".into()),
        }
    }
}

/// Whether an I/O error is caused by short-lived contention rather than a
/// real fault.
pub fn is_transient(error: &io::Error) -> bool {
    if matches!(
        error.raw_os_error(),
        Some(WIN_SHARING_VIOLATION | WIN_LOCK_VIOLATION)
    ) && cfg!(windows)
    {
        return true;
    }

    matches!(
        error.kind(),
        io::ErrorKind::ResourceBusy
            | io::ErrorKind::ExecutableFileBusy
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::Interrupted
            | io::ErrorKind::TimedOut
    )
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
