//! Setup parameters: per-axis calibration and limits.

use serde::{Deserialize, Serialize};

use super::container::{
    Container, GroupMap, GroupedContainer, Record, Selection, count_records, grouped_selection,
    normalize_grouped,
};
use super::{Coord, Snapshot};
use crate::layout::Domain;

const DEFAULT_GROUP: &str = "Axes";
const DEFAULT_ITEMS: [&str; 3] = ["X", "Y", "Z"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AxisSetup {
    pub enabled: bool,
    pub home_offset: Coord,
    pub soft_limit_min: Coord,
    pub soft_limit_max: Coord,
    pub jog_step: Coord,
}

impl Default for AxisSetup {
    fn default() -> Self {
        Self {
            enabled: true,
            home_offset: Coord::ZERO,
            soft_limit_min: Coord::ZERO,
            soft_limit_max: Coord::ZERO,
            jog_step: Coord::from_hundredths(100),
        }
    }
}

impl Record for AxisSetup {
    fn normalize(&mut self) {
        if self.soft_limit_min > self.soft_limit_max {
            std::mem::swap(&mut self.soft_limit_min, &mut self.soft_limit_max);
        }
        if self.jog_step <= Coord::ZERO {
            self.jog_step = Coord::from_hundredths(1);
        }
    }
}

/// Container persisted to `SetupData.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SetupData {
    groups: GroupMap<AxisSetup>,
    selection: Selection,
}

impl Default for SetupData {
    fn default() -> Self {
        let items = DEFAULT_ITEMS
            .iter()
            .map(|item| (item.to_string(), AxisSetup::default()))
            .collect();
        Self {
            groups: GroupMap::from([(DEFAULT_GROUP.to_string(), items)]),
            selection: Selection::new(DEFAULT_GROUP, DEFAULT_ITEMS[0]),
        }
    }
}

impl Container for SetupData {
    const DOMAIN: Domain = Domain::Setup;

    fn normalize(&mut self) {
        normalize_grouped(self);
    }

    fn record_count(&self) -> usize {
        count_records(&self.groups)
    }

    fn into_snapshot(self) -> Snapshot {
        Snapshot::Setup(self)
    }
}

grouped_selection!(SetupData);

impl GroupedContainer for SetupData {
    type Record = AxisSetup;

    fn groups(&self) -> &GroupMap<AxisSetup> {
        &self.groups
    }

    fn groups_mut(&mut self) -> &mut GroupMap<AxisSetup> {
        &mut self.groups
    }

    fn selection(&self) -> &Selection {
        &self.selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_soft_limits_are_swapped() {
        let mut axis = AxisSetup {
            soft_limit_min: Coord::from_f64(300.0),
            soft_limit_max: Coord::from_f64(-5.0),
            jog_step: Coord::ZERO,
            ..AxisSetup::default()
        };
        axis.normalize();
        assert_eq!(axis.soft_limit_min, Coord::from_f64(-5.0));
        assert_eq!(axis.soft_limit_max, Coord::from_f64(300.0));
        assert_eq!(axis.jog_step, Coord::from_hundredths(1));
    }
}
