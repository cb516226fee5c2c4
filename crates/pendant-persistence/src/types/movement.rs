//! Movement configuration: motion profiles per move.

use serde::{Deserialize, Serialize};

use super::container::{
    Container, GroupMap, GroupedContainer, Record, Selection, count_records, grouped_selection,
    normalize_grouped,
};
use super::{Coord, Snapshot};
use crate::layout::Domain;

const DEFAULT_GROUP: &str = "Group1";
const DEFAULT_ITEMS: [&str; 2] = ["Pick", "Place"];

/// Speed and clearance settings for one move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MotionProfile {
    /// Percent of maximum speed (1..=100).
    pub speed: i32,
    pub acceleration: i32,
    pub deceleration: i32,
    pub approach_height: Coord,
    pub retract_height: Coord,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            speed: 50,
            acceleration: 50,
            deceleration: 50,
            approach_height: Coord::ZERO,
            retract_height: Coord::ZERO,
        }
    }
}

impl Record for MotionProfile {
    fn normalize(&mut self) {
        self.speed = self.speed.clamp(1, 100);
        self.acceleration = self.acceleration.clamp(1, 100);
        self.deceleration = self.deceleration.clamp(1, 100);
    }
}

/// Container persisted to `MovementData.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MovementData {
    groups: GroupMap<MotionProfile>,
    selection: Selection,
}

impl Default for MovementData {
    fn default() -> Self {
        let items = DEFAULT_ITEMS
            .iter()
            .map(|item| (item.to_string(), MotionProfile::default()))
            .collect();
        Self {
            groups: GroupMap::from([(DEFAULT_GROUP.to_string(), items)]),
            selection: Selection::new(DEFAULT_GROUP, DEFAULT_ITEMS[0]),
        }
    }
}

impl Container for MovementData {
    const DOMAIN: Domain = Domain::Movement;

    fn normalize(&mut self) {
        normalize_grouped(self);
    }

    fn record_count(&self) -> usize {
        count_records(&self.groups)
    }

    fn into_snapshot(self) -> Snapshot {
        Snapshot::Movement(self)
    }
}

grouped_selection!(MovementData);

impl GroupedContainer for MovementData {
    type Record = MotionProfile;

    fn groups(&self) -> &GroupMap<MotionProfile> {
        &self.groups
    }

    fn groups_mut(&mut self) -> &mut GroupMap<MotionProfile> {
        &mut self.groups
    }

    fn selection(&self) -> &Selection {
        &self.selection
    }
}
