//! Save notifications for the rest of the application.

use std::path::PathBuf;

use crate::layout::Domain;

/// Typed event published by the auto-save lanes.
///
/// Subscribers get these through [`crate::PersistenceManager::subscribe`]
/// instead of reaching into other modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceEvent {
    /// The domain file was written.
    Saved { domain: Domain, path: PathBuf },
    /// A flush found the file already up to date and skipped the write.
    Unchanged { domain: Domain },
    /// A flush failed; the data stays pending in memory.
    SaveFailed { domain: Domain, reason: String },
}

impl PersistenceEvent {
    pub fn domain(&self) -> Domain {
        match self {
            Self::Saved { domain, .. }
            | Self::Unchanged { domain }
            | Self::SaveFailed { domain, .. } => *domain,
        }
    }
}

/// User-facing notification collaborator for bulk saves.
pub trait Notifier: Send + Sync {
    fn save_succeeded(&self);
    fn save_failed(&self, reason: &str);
}

/// Default notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn save_succeeded(&self) {
        tracing::info!("All data saved");
    }

    fn save_failed(&self, reason: &str) {
        tracing::error!("Failed to save data: {reason}");
    }
}
