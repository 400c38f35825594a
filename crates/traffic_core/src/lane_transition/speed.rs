use bevy::prelude::*;

use crate::config::OFFSET_SCALE;
use crate::network::{LaneId, LaneNetwork, PathPosition};
use crate::vehicles::{Vehicle, VehicleInfo};

/// Target speed of a vehicle on a lane with the given speed limit and
/// curvature.
pub trait TargetSpeed {
    fn target_speed(&self, info: &VehicleInfo, speed_limit: f32, curve: f32) -> f32;
}

/// Curve-limited speed used for trains and metros.
#[derive(Debug, Clone, Copy, Default)]
pub struct RailSpeedModel;

impl TargetSpeed for RailSpeedModel {
    fn target_speed(&self, info: &VehicleInfo, speed_limit: f32, curve: f32) -> f32 {
        let turning = info.turning.max(f32::EPSILON);
        let curve_speed = 1000.0 / (1.0 + curve * 1000.0 / turning) + 2.0;
        curve_speed.min(8.0 * speed_limit).min(info.max_speed)
    }
}

/// Point on a lane a vehicle steers toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPosition {
    pub position: Vec3,
    pub direction: Vec3,
    pub max_speed: f32,
}

/// Position and heading on `lane_id` at the byte `offset`, and the speed the
/// vehicle may drive there.
///
/// Falls back to a limit of 1 on a straight lane when the path position's lane
/// index is not part of its segment's prefab.
pub fn calculate_segment_position(
    network: &LaneNetwork,
    speed: &dyn TargetSpeed,
    vehicle: &Vehicle,
    position: PathPosition,
    lane_id: LaneId,
    offset: u8,
) -> SegmentPosition {
    let t = offset as f32 * OFFSET_SCALE;
    let lane = network.lane(lane_id);
    let (point, direction, curve) = lane.map_or((Vec3::ZERO, Vec3::ZERO, 0.0), |lane| {
        (lane.bezier.position(t), lane.bezier.tangent(t), lane.curve)
    });

    let lane_info = network
        .segment(position.segment)
        .and_then(|segment| segment.info.lanes.get(position.lane as usize));
    let max_speed = match lane_info {
        Some(info) => speed.target_speed(&vehicle.info, info.speed_limit, curve),
        None => speed.target_speed(&vehicle.info, 1.0, 0.0),
    };

    SegmentPosition {
        position: point,
        direction,
        max_speed,
    }
}
