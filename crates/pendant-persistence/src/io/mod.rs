//! File I/O for the domain files.
//!
//! This module handles:
//! - Retrying reads and shared-read writes (`DurableFileStore`)
//! - Content fingerprints for skipping redundant writes
//! - Timestamped backups
//! - Read-only status inspection

mod backup;
mod hash;
mod inspect;
mod store;

pub use backup::{BackupInfo, backup_name, create_backup, list_backups, prune_backups, read_backup};
pub use hash::Fingerprint;
pub use inspect::{DomainStatus, FileState, inspect_domain};
pub use store::{DurableFileStore, TextStore};
