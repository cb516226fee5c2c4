//! Conversion traits between live state and persistence snapshots.
//!
//! These traits define how state crosses the boundary between its owner
//! and the serializable form. Every crossing is a deep copy; nothing on
//! one side may observe in-progress edits on the other.

use crate::types::Container;

/// Trait for types that can be converted to a persistence snapshot.
pub trait ToSnapshot {
    /// The snapshot type.
    type Snapshot;

    /// Deep-copy the current state out.
    fn to_snapshot(&self) -> Self::Snapshot;
}

/// Trait for types whose state can be replaced from a snapshot.
pub trait FromSnapshot {
    /// The snapshot type.
    type Snapshot;

    /// Validate `snapshot` and replace the current state with it.
    fn restore_from_snapshot(&mut self, snapshot: Self::Snapshot);
}

/// Contract implemented by every UI module that owns persisted state.
///
/// The persistence core never reaches into module widgets; it only hands
/// data over through these two calls.
pub trait PersistentModule {
    /// Container type this module edits.
    type Data: Container;

    /// Deep copy of the module's current state.
    fn get_persistent_data(&self) -> Self::Data;

    /// Replace the module's state with `data`.
    fn load_from_persistent_data(&mut self, data: Self::Data);
}
