//! Persistence types for the four domain files.
//!
//! Each container is a plain serde value; cloning one is the deep copy used
//! whenever state crosses between a mirror, a UI working copy and the
//! background writer.

mod container;
mod coord;
mod movement;
mod setup;
mod system;
mod teaching;

pub use container::{Container, GroupMap, GroupedContainer, Record, Selection};
pub(crate) use container::keep_selection;
pub(crate) use container::sealed::SelectionAccess;
pub use coord::Coord;
pub use movement::{MotionProfile, MovementData};
pub use setup::{AxisSetup, SetupData};
pub use system::{LengthUnit, SystemData};
pub use teaching::{CoordinateMode, StageRecord, TeachingData};

use crate::error::Result;
use crate::layout::Domain;
use crate::serializer::{parse_container, serialize_container};

/// Domain-tagged, deep-cloned transport form of a mirror.
///
/// Owned by whoever holds it; never aliases live mirror state.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Movement(MovementData),
    Teaching(TeachingData),
    Setup(SetupData),
    System(SystemData),
}

impl Snapshot {
    pub fn domain(&self) -> Domain {
        match self {
            Self::Movement(_) => Domain::Movement,
            Self::Teaching(_) => Domain::Teaching,
            Self::Setup(_) => Domain::Setup,
            Self::System(_) => Domain::System,
        }
    }

    /// Render the canonical JSON text for this snapshot.
    pub fn to_json(&self) -> Result<String> {
        match self {
            Self::Movement(data) => serialize_container(data),
            Self::Teaching(data) => serialize_container(data),
            Self::Setup(data) => serialize_container(data),
            Self::System(data) => serialize_container(data),
        }
    }

    /// Parse the file text for `domain`.
    ///
    /// `Ok(None)` means the text was empty.
    pub fn parse(domain: Domain, text: &str) -> Result<Option<Self>> {
        Ok(match domain {
            Domain::Movement => parse_container::<MovementData>(text)?.map(Container::into_snapshot),
            Domain::Teaching => parse_container::<TeachingData>(text)?.map(Container::into_snapshot),
            Domain::Setup => parse_container::<SetupData>(text)?.map(Container::into_snapshot),
            Domain::System => parse_container::<SystemData>(text)?.map(Container::into_snapshot),
        })
    }

    /// Default contents for `domain`.
    pub fn default_for(domain: Domain) -> Self {
        match domain {
            Domain::Movement => MovementData::default().into_snapshot(),
            Domain::Teaching => TeachingData::default().into_snapshot(),
            Domain::Setup => SetupData::default().into_snapshot(),
            Domain::System => SystemData::default().into_snapshot(),
        }
    }
}
