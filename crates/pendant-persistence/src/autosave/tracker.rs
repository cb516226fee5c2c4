//! Unsaved-change tracking for one domain lane.

use std::time::Instant;

use super::AutoSaveConfig;

/// Tracks unsaved changes for one domain.
///
/// Drives the debounce timer of an auto-save lane. A failed flush keeps the
/// domain dirty but disarms the timer until the next change or forced flush.
#[derive(Debug, Clone, Default)]
pub struct FlushTracker {
    /// Whether there are unsaved changes.
    dirty: bool,

    /// Whether the debounce timer may fire.
    armed: bool,

    /// When the most recent change was made.
    last_change: Option<Instant>,

    /// When the first unsaved change was made.
    /// Reset when saved.
    first_unsaved_change: Option<Instant>,

    /// Whether a flush is currently in progress.
    saving: bool,
}

impl FlushTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Record a change and (re)arm the debounce timer.
    pub fn mark_dirty(&mut self) {
        self.mark_dirty_at(Instant::now());
    }

    pub(crate) fn mark_dirty_at(&mut self, now: Instant) {
        self.dirty = true;
        self.armed = true;
        self.last_change = Some(now);
        if self.first_unsaved_change.is_none() {
            self.first_unsaved_change = Some(now);
        }
    }

    /// Mark that a flush has started.
    pub fn start_save(&mut self) {
        self.saving = true;
    }

    /// Mark that a flush has completed successfully.
    pub fn save_complete(&mut self) {
        self.saving = false;
        self.dirty = false;
        self.armed = false;
        self.first_unsaved_change = None;
    }

    /// Mark that a flush has failed.
    pub fn save_failed(&mut self) {
        self.saving = false;
        // Still dirty; only a new change re-arms the timer.
        self.armed = false;
    }

    /// Drop pending state without saving.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// When the debounce timer should fire, if it is armed.
    ///
    /// The debounce restarts on every change, but never pushes the flush
    /// past `max_delay` after the first unsaved change.
    pub fn deadline(&self, config: &AutoSaveConfig) -> Option<Instant> {
        if !self.dirty || !self.armed || self.saving || !config.enabled {
            return None;
        }

        let last = self.last_change? + config.debounce();
        let first = self.first_unsaved_change? + config.max_delay();
        Some(last.min(first))
    }
}
