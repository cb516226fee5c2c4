//! Canonical in-memory copies of each domain's state.
//!
//! # Lifetime
//!
//! [`DomainMirrors`] is created with defaults when the
//! [`crate::PersistenceManager`] is constructed, replaced by `load_all`, and
//! dropped with the manager at process exit. UI modules come and go; the
//! mirrors outlive them and are the source every new module instance is
//! populated from.
//!
//! Mirrors are only mutated through `&mut` access held by the UI thread, so
//! they need no lock. Background work only ever sees deep-cloned snapshots.

mod editor;

pub use editor::SelectionEditor;

use crate::convert::{FromSnapshot, ToSnapshot};
use crate::layout::Domain;
use crate::types::{Container, MovementData, SetupData, Snapshot, SystemData, TeachingData};

/// The canonical copy of one domain's state.
#[derive(Debug, Clone, Default)]
pub struct DomainMirror<C: Container> {
    data: C,
    revision: u64,
}

impl<C: Container> DomainMirror<C> {
    pub fn new(data: C) -> Self {
        Self { data, revision: 0 }
    }

    /// Read access to the live state.
    pub fn get(&self) -> &C {
        &self.data
    }

    /// Apply a mutation in place.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut C) -> R) -> R {
        let result = f(&mut self.data);
        self.revision += 1;
        result
    }

    /// Incremented on every mutation or replacement.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl<C: Container> ToSnapshot for DomainMirror<C> {
    type Snapshot = C;

    fn to_snapshot(&self) -> C {
        self.data.clone()
    }
}

impl<C: Container> FromSnapshot for DomainMirror<C> {
    type Snapshot = C;

    fn restore_from_snapshot(&mut self, mut snapshot: C) {
        snapshot.normalize();
        self.data = snapshot;
        self.revision += 1;
    }
}

/// The four domain mirrors.
#[derive(Debug, Clone, Default)]
pub struct DomainMirrors {
    pub movement: DomainMirror<MovementData>,
    pub teaching: DomainMirror<TeachingData>,
    pub setup: DomainMirror<SetupData>,
    pub system: DomainMirror<SystemData>,
}

impl DomainMirrors {
    pub fn get<C: MirrorSlot>(&self) -> &DomainMirror<C> {
        C::slot(self)
    }

    pub fn get_mut<C: MirrorSlot>(&mut self) -> &mut DomainMirror<C> {
        C::slot_mut(self)
    }

    /// Deep-copied snapshot of one domain.
    pub fn snapshot(&self, domain: Domain) -> Snapshot {
        match domain {
            Domain::Movement => self.movement.to_snapshot().into_snapshot(),
            Domain::Teaching => self.teaching.to_snapshot().into_snapshot(),
            Domain::Setup => self.setup.to_snapshot().into_snapshot(),
            Domain::System => self.system.to_snapshot().into_snapshot(),
        }
    }

    /// Replace one domain from a snapshot.
    pub fn restore(&mut self, snapshot: Snapshot) {
        match snapshot {
            Snapshot::Movement(data) => self.movement.restore_from_snapshot(data),
            Snapshot::Teaching(data) => self.teaching.restore_from_snapshot(data),
            Snapshot::Setup(data) => self.setup.restore_from_snapshot(data),
            Snapshot::System(data) => self.system.restore_from_snapshot(data),
        }
    }
}

/// Maps a container type to its mirror inside [`DomainMirrors`].
pub trait MirrorSlot: Container {
    fn slot(mirrors: &DomainMirrors) -> &DomainMirror<Self>;
    fn slot_mut(mirrors: &mut DomainMirrors) -> &mut DomainMirror<Self>;
}

macro_rules! mirror_slot {
    ($ty:ty, $field:ident) => {
        impl MirrorSlot for $ty {
            fn slot(mirrors: &DomainMirrors) -> &DomainMirror<Self> {
                &mirrors.$field
            }

            fn slot_mut(mirrors: &mut DomainMirrors) -> &mut DomainMirror<Self> {
                &mut mirrors.$field
            }
        }
    };
}

mirror_slot!(MovementData, movement);
mirror_slot!(TeachingData, teaching);
mirror_slot!(SetupData, setup);
mirror_slot!(SystemData, system);
