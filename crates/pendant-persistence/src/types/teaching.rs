//! Teach-point data: per-stage slot geometry and taught positions.

use serde::{Deserialize, Serialize};

use super::container::{
    Container, GroupMap, GroupedContainer, Record, Selection, count_records, grouped_selection,
    normalize_grouped,
};
use super::{Coord, Snapshot};
use crate::layout::Domain;

/// Groups created when no teaching file exists yet.
const DEFAULT_GROUP: &str = "Group1";
const DEFAULT_ITEMS: [&str; 4] = ["Cassette 1", "Cassette 2", "Cassette 3", "Cassette 4"];

/// One taught stage (cassette, aligner, buffer...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct StageRecord {
    pub slot_count: i32,
    pub pitch: i32,
    pub pick_offset: i32,
    pub place_offset: i32,
    pub speed: i32,
    pub position_a: Coord,
    pub position_b: Coord,
    pub position_c: Coord,
}

impl Default for StageRecord {
    fn default() -> Self {
        Self {
            slot_count: 1,
            pitch: 1,
            pick_offset: 1,
            place_offset: 1,
            speed: 1,
            position_a: Coord::ZERO,
            position_b: Coord::ZERO,
            position_c: Coord::ZERO,
        }
    }
}

impl Record for StageRecord {
    fn normalize(&mut self) {
        self.slot_count = self.slot_count.max(1);
        self.pitch = self.pitch.max(1);
        self.speed = self.speed.clamp(1, 100);
    }
}

/// How taught positions are interpreted by the motion layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateMode {
    #[default]
    Absolute,
    Relative,
}

/// Container persisted to `TeachingData.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TeachingData {
    groups: GroupMap<StageRecord>,
    selection: Selection,
    pub coordinate_mode: CoordinateMode,
}

impl TeachingData {
    /// A container with no groups at all.
    pub fn empty() -> Self {
        Self {
            groups: GroupMap::new(),
            selection: Selection::default(),
            coordinate_mode: CoordinateMode::default(),
        }
    }
}

impl Default for TeachingData {
    fn default() -> Self {
        let items = DEFAULT_ITEMS
            .iter()
            .map(|item| (item.to_string(), StageRecord::default()))
            .collect();
        Self {
            groups: GroupMap::from([(DEFAULT_GROUP.to_string(), items)]),
            selection: Selection::new(DEFAULT_GROUP, DEFAULT_ITEMS[0]),
            coordinate_mode: CoordinateMode::default(),
        }
    }
}

impl Container for TeachingData {
    const DOMAIN: Domain = Domain::Teaching;

    fn normalize(&mut self) {
        normalize_grouped(self);
    }

    fn record_count(&self) -> usize {
        count_records(&self.groups)
    }

    fn into_snapshot(self) -> Snapshot {
        Snapshot::Teaching(self)
    }
}

grouped_selection!(TeachingData);

impl GroupedContainer for TeachingData {
    type Record = StageRecord;

    fn groups(&self) -> &GroupMap<StageRecord> {
        &self.groups
    }

    fn groups_mut(&mut self) -> &mut GroupMap<StageRecord> {
        &mut self.groups
    }

    fn selection(&self) -> &Selection {
        &self.selection
    }
}
