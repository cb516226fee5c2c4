//! Auto-save for the domain files.
//!
//! Provides:
//! - `FlushTracker` - Tracks unsaved changes with debounce
//! - `AutoSaveConfig` - User settings for auto-save behavior
//! - `AutoSaveCoordinator` - One background lane per domain

mod config;
mod coordinator;
mod tracker;

pub use config::AutoSaveConfig;
pub use coordinator::{AutoSaveCoordinator, FlushOutcome, PendingFlush};
pub use tracker::FlushTracker;
