//! Element taxonomy and canonical shape sizes.

use crate::geom::Size;

pub const POOL_TYPE: &str = "bpmn:Participant";
pub const LANE_TYPE: &str = "bpmn:Lane";

pub const EVENT_SIZE: Size = Size::new(36.0, 36.0);
pub const GATEWAY_SIZE: Size = Size::new(50.0, 50.0);
pub const ACTIVITY_SIZE: Size = Size::new(120.0, 80.0);
pub const DATA_SIZE: Size = Size::new(50.0, 65.0);
pub const DEFAULT_SIZE: Size = Size::new(100.0, 80.0);

const EVENT_MARKERS: &[&str] = &[
    "startevent",
    "endevent",
    "intermediatecatch",
    "intermediatethrow",
];
const GATEWAY_MARKERS: &[&str] = &["gateway"];
const ACTIVITY_MARKERS: &[&str] = &["task", "activity", "subprocess"];
const DATA_MARKERS: &[&str] = &["dataobject", "datastore"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `bpmn:Participant`, matched exactly.
    Pool,
    /// `bpmn:Lane`, matched exactly.
    Lane,
    Event,
    Gateway,
    Activity,
    Data,
    Other,
}

impl ElementKind {
    /// Classifies a BPMN type tag.
    ///
    /// Containers are recognized by their exact tag. Everything else uses a case-insensitive
    /// substring match so vendor-specific or future tags (`bpmn:UserTask`,
    /// `custom:EventBasedGateway`) still land in the right family. The first family that
    /// matches wins, in the order events, gateways, activities, data.
    pub fn from_type_tag(tag: &str) -> Self {
        match tag {
            POOL_TYPE => return Self::Pool,
            LANE_TYPE => return Self::Lane,
            _ => {}
        }

        let lower = tag.to_ascii_lowercase();
        let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));
        if has(EVENT_MARKERS) {
            Self::Event
        } else if has(GATEWAY_MARKERS) {
            Self::Gateway
        } else if has(ACTIVITY_MARKERS) {
            Self::Activity
        } else if has(DATA_MARKERS) {
            Self::Data
        } else {
            Self::Other
        }
    }

    /// Canonical shape size. Pools and lanes get the default size here; their real boxes are
    /// derived from their content during composition.
    pub fn size(self) -> Size {
        match self {
            Self::Event => EVENT_SIZE,
            Self::Gateway => GATEWAY_SIZE,
            Self::Activity => ACTIVITY_SIZE,
            Self::Data => DATA_SIZE,
            Self::Pool | Self::Lane | Self::Other => DEFAULT_SIZE,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, Self::Pool | Self::Lane)
    }
}

/// Canonical size for a BPMN type tag. Total: unknown tags get [`DEFAULT_SIZE`].
pub fn dimensions_for(type_tag: &str) -> Size {
    ElementKind::from_type_tag(type_tag).size()
}
