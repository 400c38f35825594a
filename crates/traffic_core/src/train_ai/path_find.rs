use bevy::prelude::*;

use crate::config::{
    MAX_PATH_LENGTH, PATH_POSITION_SEARCH_RADIUS, SECONDARY_POSITION_TOLERANCE,
    SHORT_TRIP_DISTANCE,
};
use crate::network::LaneType;
use crate::vehicle_types::VehicleTypes;
use crate::vehicles::{RailKind, VehicleFlags, VehicleId};

use super::controller::PathLifecycleController;
use super::types::{PathPositionQuery, PathRequest, TrainAiContext};

impl PathLifecycleController {
    /// Request a new route between two world positions.
    ///
    /// On success the previous path (if any) is released, the new handle is
    /// stored and the vehicle starts waiting for it.
    pub fn start_path_find(
        ctx: &mut TrainAiContext,
        id: VehicleId,
        start: Vec3,
        end: Vec3,
        start_both_ways: bool,
        end_both_ways: bool,
    ) -> bool {
        let Some(vehicle) = ctx.vehicles.get(id) else {
            return false;
        };
        let flags = vehicle.flags;
        let kind = vehicle.info.kind;

        let category = ctx
            .host
            .vehicle_category(id, ctx.vehicles)
            .map(|category| {
                if category == VehicleTypes::CARGO_TRAIN {
                    VehicleTypes::CARGO_VEHICLE
                } else {
                    category
                }
            });

        let start = if !flags.contains(VehicleFlags::SPAWNED) && start.distance(end) < SHORT_TRIP_DISTANCE {
            end
        } else {
            start
        };

        let (start_underground, end_underground) = match kind {
            RailKind::Metro => (true, true),
            RailKind::Train => (
                flags.intersects(VehicleFlags::UNDERGROUND | VehicleFlags::TRANSITION),
                false,
            ),
        };

        let query = |position: Vec3, allow_underground: bool| PathPositionQuery {
            position,
            lane_type: LaneType::VEHICLE,
            kind,
            allow_underground,
            max_distance: PATH_POSITION_SEARCH_RADIUS,
        };
        let Some(from) = ctx.paths.find_path_position(&query(start, start_underground)) else {
            return false;
        };
        let Some(to) = ctx.paths.find_path_position(&query(end, end_underground)) else {
            return false;
        };

        let request = PathRequest {
            vehicle: id,
            category,
            start: from.primary,
            start_secondary: from.secondary_within(start_both_ways, SECONDARY_POSITION_TOLERANCE),
            end: to.primary,
            end_secondary: to.secondary_within(end_both_ways, SECONDARY_POSITION_TOLERANCE),
            lane_type: LaneType::VEHICLE,
            kind,
            max_length: MAX_PATH_LENGTH,
        };
        let Some(handle) = ctx.paths.create_path(&request) else {
            return false;
        };

        let Some(vehicle) = ctx.vehicles.get_mut(id) else {
            ctx.paths.release_path(handle);
            return false;
        };
        let previous = std::mem::replace(&mut vehicle.path, handle);
        vehicle.flags.insert(VehicleFlags::WAITING_PATH);
        if !previous.is_null() {
            ctx.paths.release_path(previous);
        }
        true
    }
}
