//! Global system settings (flat, no groups).

use serde::{Deserialize, Serialize};

use super::Snapshot;
use super::container::Container;
use crate::layout::Domain;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Millimeter,
    Inch,
}

/// Container persisted to `SystemData.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SystemData {
    pub language: String,
    pub controller_address: String,
    pub controller_port: u16,
    pub jog_speed_percent: i32,
    pub confirm_before_move: bool,
    pub length_unit: LengthUnit,
}

impl Default for SystemData {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            controller_address: "192.168.0.10".to_string(),
            controller_port: 502,
            jog_speed_percent: 10,
            confirm_before_move: true,
            length_unit: LengthUnit::default(),
        }
    }
}

impl super::container::sealed::Sealed for SystemData {}

impl Container for SystemData {
    const DOMAIN: Domain = Domain::System;

    fn normalize(&mut self) {
        let defaults = Self::default();
        if self.language.trim().is_empty() {
            self.language = defaults.language;
        }
        if self.controller_address.trim().is_empty() {
            self.controller_address = defaults.controller_address;
        }
        if self.controller_port == 0 {
            self.controller_port = defaults.controller_port;
        }
        self.jog_speed_percent = self.jog_speed_percent.clamp(1, 100);
    }

    fn record_count(&self) -> usize {
        1
    }

    fn into_snapshot(self) -> Snapshot {
        Snapshot::System(self)
    }
}
