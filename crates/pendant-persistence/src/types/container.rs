//! Traits shared by the four domain containers.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use self::sealed::{Sealed as _, SelectionAccess as _};
use super::Snapshot;
use crate::layout::Domain;

/// Group name -> item name -> record.
pub type GroupMap<R> = BTreeMap<String, BTreeMap<String, R>>;

/// A serializable container holding one domain's state.
///
/// Containers are plain values: cloning one is a deep copy, which is what
/// every hand-off between a mirror and a working copy relies on.
///
/// The trait is sealed: only the four domain containers implement it.
pub trait Container:
    Serialize
    + DeserializeOwned
    + Default
    + Clone
    + PartialEq
    + fmt::Debug
    + Send
    + Sync
    + sealed::Sealed
    + 'static
{
    /// Domain this container persists.
    const DOMAIN: Domain;

    /// Repair out-of-range values after loading.
    fn normalize(&mut self);

    /// Number of records, for status displays.
    fn record_count(&self) -> usize;

    /// Wrap into the domain-tagged transport form.
    fn into_snapshot(self) -> Snapshot;
}

/// A record stored under a group/item key.
pub trait Record:
    Serialize + DeserializeOwned + Default + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    fn normalize(&mut self) {}
}

/// Currently selected group/item of a grouped container.
///
/// The selection can only be changed inside the crate. UI code switches it
/// through [`crate::PersistenceManager::select`], which commits pending
/// edits first. Whole-container edits keep the selection where it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Selection {
    group: Option<String>,
    item: Option<String>,
}

impl Selection {
    pub(crate) fn new(group: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            item: Some(item.into()),
        }
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn item(&self) -> Option<&str> {
        self.item.as_deref()
    }

    /// Both halves of the selection, if a record is selected.
    pub fn key(&self) -> Option<(&str, &str)> {
        Some((self.group.as_deref()?, self.item.as_deref()?))
    }

    pub(crate) fn set(&mut self, group: &str, item: &str) {
        self.group = Some(group.to_string());
        self.item = Some(item.to_string());
    }

    pub(crate) fn clear(&mut self) {
        self.group = None;
        self.item = None;
    }
}

/// A container organised as group -> item -> record plus a selection.
///
/// There is no public setter for the selection:
///
/// ```compile_fail
/// use pendant_persistence::{GroupedContainer, TeachingData};
///
/// let mut data = TeachingData::default();
/// data.selection_mut();
/// ```
pub trait GroupedContainer: Container + sealed::SelectionAccess {
    type Record: Record;

    fn groups(&self) -> &GroupMap<Self::Record>;

    fn groups_mut(&mut self) -> &mut GroupMap<Self::Record>;

    fn selection(&self) -> &Selection;

    fn record(&self, group: &str, item: &str) -> Option<&Self::Record> {
        self.groups().get(group)?.get(item)
    }

    fn record_mut(&mut self, group: &str, item: &str) -> Option<&mut Self::Record> {
        self.groups_mut().get_mut(group)?.get_mut(item)
    }

    /// Insert or replace the record at `group/item`.
    fn upsert(&mut self, group: &str, item: &str, record: Self::Record) {
        self.groups_mut()
            .entry(group.to_string())
            .or_default()
            .insert(item.to_string(), record);
    }

    /// Remove a record; an emptied group is removed too.
    fn remove(&mut self, group: &str, item: &str) -> Option<Self::Record> {
        let items = self.groups_mut().get_mut(group)?;
        let removed = items.remove(item);
        if items.is_empty() {
            self.groups_mut().remove(group);
        }
        if removed.is_some() {
            normalize_selection(self);
        }
        removed
    }
}

/// Normalize every record and the selection of a grouped container.
pub(crate) fn normalize_grouped<C: GroupedContainer>(container: &mut C) {
    for items in container.groups_mut().values_mut() {
        for record in items.values_mut() {
            record.normalize();
        }
    }
    normalize_selection(container);
}

/// Point a dangling selection at the first available record.
pub(crate) fn normalize_selection<C: GroupedContainer>(container: &mut C) {
    if let Some((group, item)) = container.selection().key()
        && container.record(group, item).is_some()
    {
        return;
    }

    let first = container.groups().iter().find_map(|(group, items)| {
        items
            .keys()
            .next()
            .map(|item| (group.clone(), item.clone()))
    });

    match first {
        Some((group, item)) => container.selection_mut().set(&group, &item),
        None => container.selection_mut().clear(),
    }
}

/// Run `f` on the container, then put the selection back where it was.
///
/// Falls back to normal repair when `f` removed the selected record.
pub(crate) fn keep_selection<C, R>(container: &mut C, f: impl FnOnce(&mut C) -> R) -> R
where
    C: Container,
{
    let before = container.selection_slot().cloned();
    let result = f(container);

    let Some(before) = before else {
        return result;
    };
    if let Some(selection) = container.selection_slot() {
        *selection = before;
    }
    container.repair_selection();
    result
}

pub(crate) fn count_records<R>(groups: &GroupMap<R>) -> usize {
    groups.values().map(BTreeMap::len).sum()
}

pub(crate) mod sealed {
    use super::Selection;

    pub trait Sealed {
        /// The persisted selection, for grouped containers.
        fn selection_slot(&mut self) -> Option<&mut Selection> {
            None
        }

        /// Point a dangling selection back at an existing record.
        fn repair_selection(&mut self) {}
    }

    pub trait SelectionAccess {
        fn selection_mut(&mut self) -> &mut Selection;
    }
}

/// Implements the crate-private selection access for a grouped container.
macro_rules! grouped_selection {
    ($ty:ty) => {
        impl $crate::types::container::sealed::Sealed for $ty {
            fn selection_slot(&mut self) -> Option<&mut $crate::types::Selection> {
                Some(&mut self.selection)
            }

            fn repair_selection(&mut self) {
                $crate::types::container::normalize_selection(self);
            }
        }

        impl $crate::types::container::sealed::SelectionAccess for $ty {
            fn selection_mut(&mut self) -> &mut $crate::types::Selection {
                &mut self.selection
            }
        }
    };
}

pub(crate) use grouped_selection;
