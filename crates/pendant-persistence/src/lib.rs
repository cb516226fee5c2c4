//! Persistent storage for the teaching pendant's operator data.
//!
//! This crate keeps the state edited on the pendant (teach positions,
//! movement profiles, axis setup and system settings) in memory and on disk,
//! one JSON file per domain.
//!
//! # Features
//!
//! - **Per-domain files** under `<AppData>/TeachingPendantData/`
//! - **Debounced auto-save** with one background lane per domain
//! - **Single-flight writes**: a domain file is never written concurrently
//! - **Retries** for files briefly locked by other programs
//! - **Redundant-write suppression** via SHA-256 fingerprints
//! - **Timestamped backups** under `Backup/<yyyyMMdd_HHmmss>/`
//!
//! # File Layout
//!
//! ```text
//! TeachingPendantData/
//!   MovementData.json
//!   TeachingData.json
//!   SetupData.json
//!   SystemData.json
//!   Backup/20250101_120000/*.json
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pendant_persistence::{PersistenceConfig, PersistenceManager, TeachingData};
//!
//! let mut manager = PersistenceManager::new(PersistenceConfig::load(), &handle);
//! manager.load_all().await;
//!
//! let mut editor = manager.editor::<TeachingData>();
//! editor.working_mut().slot_count = 25;
//! manager.commit_edit(&mut editor);
//!
//! manager.shutdown().await;
//! ```
//!
//! # Architecture
//!
//! The crate is organized into:
//!
//! - `types/` - Domain containers and the `Snapshot` transport form
//! - `io/` - File I/O (retrying store, fingerprints, backups, inspection)
//! - `mirror/` - Canonical in-memory copies and the selection editor
//! - `autosave/` - Debounce tracking and the per-domain save lanes
//! - `manager.rs` - Bulk load/save and the UI-facing API
//! - `error.rs` - Error types with user-friendly messages

mod autosave;
mod config;
mod convert;
mod error;
mod io;
mod layout;
mod manager;
mod mirror;
mod notify;
mod serializer;
mod types;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use autosave::{
    AutoSaveConfig, AutoSaveCoordinator, FlushOutcome, FlushTracker, PendingFlush,
};
pub use config::{BackupConfig, DATA_DIR_ENV, PersistenceConfig, RetryConfig, RetryPolicy};
pub use convert::{FromSnapshot, PersistentModule, ToSnapshot};
pub use error::{PersistenceError, Result, is_transient};
pub use io::{
    BackupInfo, DomainStatus, DurableFileStore, FileState, Fingerprint, TextStore, backup_name,
    create_backup, inspect_domain, list_backups, prune_backups, read_backup,
};
pub use layout::{APP_DIR_NAME, BACKUP_DIR_NAME, DataLayout, Domain};
pub use manager::{LoadReport, LoadStatus, PersistenceManager, SaveReport};
pub use mirror::{DomainMirror, DomainMirrors, MirrorSlot, SelectionEditor};
pub use notify::{LogNotifier, Notifier, PersistenceEvent};
pub use serializer::{deserialize_container, parse_container, serialize_container};
pub use types::{
    AxisSetup, Container, Coord, CoordinateMode, GroupMap, GroupedContainer, LengthUnit,
    MotionProfile, MovementData, Record, Selection, SetupData, Snapshot, StageRecord, SystemData,
    TeachingData,
};
