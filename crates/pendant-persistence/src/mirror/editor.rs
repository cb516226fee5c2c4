//! Working copy of the selected record.
//!
//! UI modules edit a scratch copy of one record. The only way to move the
//! selection is [`SelectionEditor::select`], which commits that scratch copy
//! into the mirror before switching, so edits to the previous record cannot
//! be left behind.

use super::DomainMirror;
use crate::types::{GroupedContainer, SelectionAccess as _};

#[derive(Debug, Clone)]
pub struct SelectionEditor<C: GroupedContainer> {
    key: Option<(String, String)>,
    working: C::Record,
    dirty: bool,
}

impl<C: GroupedContainer> SelectionEditor<C> {
    /// Open an editor on the mirror's current selection.
    pub fn open(mirror: &DomainMirror<C>) -> Self {
        let data = mirror.get();
        let key = data
            .selection()
            .key()
            .map(|(group, item)| (group.to_string(), item.to_string()));
        let working = key
            .as_ref()
            .and_then(|(group, item)| data.record(group, item))
            .cloned()
            .unwrap_or_default();

        Self {
            key,
            working,
            dirty: false,
        }
    }

    /// Selected group/item, if any.
    pub fn key(&self) -> Option<(&str, &str)> {
        self.key
            .as_ref()
            .map(|(group, item)| (group.as_str(), item.as_str()))
    }

    pub fn working(&self) -> &C::Record {
        &self.working
    }

    /// Mutable scratch copy; changes reach the mirror on the next commit.
    pub fn working_mut(&mut self) -> &mut C::Record {
        self.dirty = true;
        &mut self.working
    }

    /// Whether the scratch copy has edits not yet committed.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Copy the scratch record into the mirror.
    ///
    /// Returns `true` when the mirror changed.
    pub fn commit_edit(&mut self, mirror: &mut DomainMirror<C>) -> bool {
        let Some((group, item)) = &self.key else {
            self.dirty = false;
            return false;
        };

        let changed = mirror.get().record(group, item) != Some(&self.working);
        if changed {
            let record = self.working.clone();
            mirror.edit(|data| data.upsert(group, item, record));
        }
        self.dirty = false;
        changed
    }

    /// Commit pending edits, then select `group/item`.
    ///
    /// A missing record is created with defaults. Always changes the
    /// mirror (the selection is persisted state).
    pub fn select(&mut self, mirror: &mut DomainMirror<C>, group: &str, item: &str) {
        self.commit_edit(mirror);

        mirror.edit(|data| {
            if data.record(group, item).is_none() {
                data.upsert(group, item, C::Record::default());
            }
            data.selection_mut().set(group, item);
        });

        self.key = Some((group.to_string(), item.to_string()));
        self.working = mirror
            .get()
            .record(group, item)
            .cloned()
            .unwrap_or_default();
        self.dirty = false;
    }

    /// Throw away uncommitted edits and reload the scratch copy.
    pub fn revert(&mut self, mirror: &DomainMirror<C>) {
        *self = Self::open(mirror);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coord, TeachingData};

    #[test]
    fn test_select_commits_pending_edit_first() {
        let mut mirror = DomainMirror::new(TeachingData::default());
        let mut editor = SelectionEditor::open(&mirror);
        assert_eq!(editor.key(), Some(("Group1", "Cassette 1")));

        editor.working_mut().slot_count = 25;
        editor.select(&mut mirror, "Group1", "Cassette 2");

        let data = mirror.get();
        assert_eq!(data.record("Group1", "Cassette 1").unwrap().slot_count, 25);
        assert_eq!(data.selection().key(), Some(("Group1", "Cassette 2")));
        assert_eq!(editor.working().slot_count, 1);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_working_copy_does_not_alias_mirror() {
        let mut mirror = DomainMirror::new(TeachingData::default());
        let mut editor = SelectionEditor::open(&mirror);

        editor.working_mut().position_a = Coord::from_f64(10.25);
        assert_eq!(
            mirror.get().record("Group1", "Cassette 1").unwrap().position_a,
            Coord::ZERO
        );

        assert!(editor.commit_edit(&mut mirror));
        assert!(!editor.commit_edit(&mut mirror));
        assert_eq!(
            mirror.get().record("Group1", "Cassette 1").unwrap().position_a,
            Coord::from_f64(10.25)
        );
    }

    #[test]
    fn test_select_missing_record_creates_default() {
        let mut mirror = DomainMirror::new(TeachingData::empty());
        let mut editor = SelectionEditor::open(&mirror);
        assert_eq!(editor.key(), None);

        editor.select(&mut mirror, "Group2", "Aligner");
        assert!(mirror.get().record("Group2", "Aligner").is_some());
        assert_eq!(editor.key(), Some(("Group2", "Aligner")));
    }

    #[test]
    fn test_revert_discards_edits() {
        let mut mirror = DomainMirror::new(TeachingData::default());
        let mut editor = SelectionEditor::open(&mirror);
        editor.working_mut().pitch = 9;

        editor.revert(&mirror);
        assert_eq!(editor.working().pitch, 1);
        assert!(!editor.is_dirty());
        assert!(!editor.commit_edit(&mut mirror));
        assert_eq!(mirror.revision(), 0);
    }
}
