use bevy::prelude::*;

use crate::geometry::Bezier3;
use crate::vehicle_types::bitmask_ops;

/// Node id. `0` is the null id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub u16);

/// Segment id. `0` is the null id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SegmentId(pub u16);

/// Lane instance id. `0` is the null id and terminates a segment's lane chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LaneId(pub u32);

macro_rules! null_id {
    ($ty:ident) => {
        impl $ty {
            pub const NULL: Self = Self(0);

            #[inline]
            pub fn is_null(self) -> bool {
                self.0 == 0
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

null_id!(NodeId);
null_id!(SegmentId);
null_id!(LaneId);

/// Physical media a lane can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LaneVehicleTypes(pub u16);

bitmask_ops!(LaneVehicleTypes, u16);

impl LaneVehicleTypes {
    pub const CAR: Self = Self(1 << 0);
    pub const METRO: Self = Self(1 << 1);
    pub const TRAIN: Self = Self(1 << 2);
    pub const SHIP: Self = Self(1 << 3);
    pub const PLANE: Self = Self(1 << 4);
    pub const BICYCLE: Self = Self(1 << 5);
    pub const TRAM: Self = Self(1 << 6);
}

/// Lane usage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LaneType(pub u8);

bitmask_ops!(LaneType, u8);

impl LaneType {
    pub const VEHICLE: Self = Self(1 << 0);
    pub const PEDESTRIAN: Self = Self(1 << 1);
    pub const PARKING: Self = Self(1 << 2);
    /// Dedicated public-transport lane (bus/taxi lanes).
    pub const TRANSPORT_VEHICLE: Self = Self(1 << 3);
}

/// Traversal direction of a lane relative to its segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LaneDirection {
    #[default]
    None,
    Forward,
    Backward,
    Both,
}

impl LaneDirection {
    /// Swap forward and backward; `None` and `Both` are symmetric.
    pub fn inverted(self) -> Self {
        match self {
            LaneDirection::Forward => LaneDirection::Backward,
            LaneDirection::Backward => LaneDirection::Forward,
            other => other,
        }
    }

    pub fn inverted_if(self, condition: bool) -> Self {
        if condition {
            self.inverted()
        } else {
            self
        }
    }
}

/// Service class of a segment prefab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceClass {
    #[default]
    Road,
    Train,
    Metro,
    Tram,
    Ship,
    Airplane,
    Beautification,
}

/// Static description of one lane of a segment prefab.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneInfo {
    pub vehicle_types: LaneVehicleTypes,
    pub lane_type: LaneType,
    pub direction: LaneDirection,
    /// Speed limit in game units (1.0 = 50 km/h).
    pub speed_limit: f32,
}

impl LaneInfo {
    pub fn new(vehicle_types: LaneVehicleTypes, direction: LaneDirection) -> Self {
        Self {
            vehicle_types,
            lane_type: LaneType::VEHICLE,
            direction,
            speed_limit: 1.0,
        }
    }

    pub fn with_lane_type(mut self, lane_type: LaneType) -> Self {
        self.lane_type = lane_type;
        self
    }

    pub fn with_speed_limit(mut self, speed_limit: f32) -> Self {
        self.speed_limit = speed_limit;
        self
    }

    pub fn is_road_lane(&self) -> bool {
        self.vehicle_types.intersects(LaneVehicleTypes::CAR)
    }

    pub fn is_rail_lane(&self) -> bool {
        self.vehicle_types.intersects(LaneVehicleTypes::TRAIN)
    }
}

/// Static description of a segment prefab: its lanes in index order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentInfo {
    pub service: ServiceClass,
    pub lanes: Vec<LaneInfo>,
}

impl SegmentInfo {
    pub fn new(service: ServiceClass, lanes: Vec<LaneInfo>) -> Self {
        Self { service, lanes }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_road_segment(&self) -> bool {
        self.service == ServiceClass::Road
    }

    pub fn is_rail_segment(&self) -> bool {
        self.service == ServiceClass::Train
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Vec3,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub info: SegmentInfo,
    /// Head of the singly-linked lane instance chain.
    pub first_lane: LaneId,
    pub inverted: bool,
    pub created: bool,
}

/// Lane instance on a concrete segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    pub id: LaneId,
    pub segment: SegmentId,
    pub next_lane: LaneId,
    pub bezier: Bezier3,
    /// Curvature used by the target-speed model.
    pub curve: f32,
    pub created: bool,
}

/// A position on a path: segment, lane index and byte offset along the lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PathPosition {
    pub segment: SegmentId,
    pub lane: u8,
    pub offset: u8,
}

impl PathPosition {
    pub fn new(segment: SegmentId, lane: u8, offset: u8) -> Self {
        Self {
            segment,
            lane,
            offset,
        }
    }
}
