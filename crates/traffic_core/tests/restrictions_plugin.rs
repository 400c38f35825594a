//! Restriction edits and lane-layout changes driven through Bevy events.
//!
//! Run: cargo test -p traffic_core --test restrictions_plugin

use bevy::prelude::*;

use traffic_core::network::{
    LaneDirection, LaneInfo, LaneNetwork, LaneVehicleTypes, NodeId, SegmentId, SegmentInfo,
    ServiceClass,
};
use traffic_core::restrictions::{
    EditLaneRestrictionEvent, LaneRestrictions, NodeInvalidations, RestrictionEdit,
    SegmentLanesChangedEvent,
};
use traffic_core::vehicle_state::{VehicleEphemeralStates, VehicleReleasedEvent};
use traffic_core::vehicles::VehicleId;
use traffic_core::{DrivingSide, TrafficCorePlugin, TrafficOptions, VehicleTypes};

fn app_with_track() -> (App, SegmentId, NodeId, NodeId) {
    let mut app = App::new();
    app.add_plugins(TrafficCorePlugin);

    let (segment, start, end) = {
        let mut network = app.world_mut().resource_mut::<LaneNetwork>();
        let start = network.add_node(Vec3::ZERO);
        let end = network.add_node(Vec3::new(80.0, 0.0, 0.0));
        let segment = network.add_segment(
            start,
            end,
            SegmentInfo::new(
                ServiceClass::Train,
                vec![
                    LaneInfo::new(LaneVehicleTypes::TRAIN, LaneDirection::Forward),
                    LaneInfo::new(LaneVehicleTypes::TRAIN, LaneDirection::Backward),
                ],
            ),
        );
        (segment, start, end)
    };
    (app, segment, start, end)
}

fn allowed_into(app: &mut App, segment: SegmentId, node: NodeId) -> VehicleTypes {
    app.world_mut()
        .resource_scope(|world, mut restrictions: Mut<LaneRestrictions>| {
            let network = world.resource::<LaneNetwork>();
            let side = world.resource::<TrafficOptions>().driving_side;
            restrictions.allowed_types(network, side, segment, node)
        })
}

#[test]
fn test_plugin_registers_stores() {
    let (app, _, _, _) = app_with_track();
    let options = app.world().resource::<TrafficOptions>();
    assert_eq!(options.driving_side, DrivingSide::RightHand);
    assert!(app.world().get_resource::<LaneRestrictions>().is_some());
    assert!(app.world().get_resource::<VehicleEphemeralStates>().is_some());
}

#[test]
fn test_edit_event_applies_and_bumps_generations() {
    let (mut app, segment, start, end) = app_with_track();
    assert_eq!(allowed_into(&mut app, segment, end), VehicleTypes::RAIL_VEHICLE);

    let lane_id = app
        .world()
        .resource::<LaneNetwork>()
        .lane_at(segment, 0)
        .unwrap();
    app.world_mut().send_event(EditLaneRestrictionEvent {
        segment_id: segment,
        lane_index: 0,
        lane_id,
        edit: RestrictionEdit::Remove(VehicleTypes::CARGO_TRAIN),
    });
    app.update();

    assert_eq!(allowed_into(&mut app, segment, end), VehicleTypes::PASSENGER_TRAIN);
    assert_eq!(allowed_into(&mut app, segment, start), VehicleTypes::RAIL_VEHICLE);

    let invalidations = app.world().resource::<NodeInvalidations>();
    assert_eq!(invalidations.node_generation(start), 1);
    assert_eq!(invalidations.node_generation(end), 1);
}

#[test]
fn test_edit_event_on_missing_segment_is_ignored() {
    let (mut app, segment, _, _) = app_with_track();
    let lane_id = app
        .world()
        .resource::<LaneNetwork>()
        .lane_at(segment, 0)
        .unwrap();
    app.world_mut().send_event(EditLaneRestrictionEvent {
        segment_id: SegmentId(77),
        lane_index: 0,
        lane_id,
        edit: RestrictionEdit::Set(VehicleTypes::NONE),
    });
    app.update();

    assert_eq!(app.world().resource::<NodeInvalidations>().generation, 0);
    assert!(!app.world().resource::<LaneRestrictions>().has_overrides(SegmentId(77)));
}

#[test]
fn test_lanes_changed_event_drops_overrides() {
    let (mut app, segment, _, end) = app_with_track();
    let lane_id = app
        .world()
        .resource::<LaneNetwork>()
        .lane_at(segment, 0)
        .unwrap();
    app.world_mut().send_event(EditLaneRestrictionEvent {
        segment_id: segment,
        lane_index: 0,
        lane_id,
        edit: RestrictionEdit::Set(VehicleTypes::NONE),
    });
    app.update();
    assert_eq!(allowed_into(&mut app, segment, end), VehicleTypes::NONE);

    app.world_mut()
        .send_event(SegmentLanesChangedEvent { segment_id: segment });
    app.update();
    assert!(!app.world().resource::<LaneRestrictions>().has_overrides(segment));
    assert_eq!(allowed_into(&mut app, segment, end), VehicleTypes::RAIL_VEHICLE);
}

#[test]
fn test_left_hand_option_flips_approach() {
    let (mut app, segment, start, _) = app_with_track();
    app.world_mut().resource_mut::<TrafficOptions>().driving_side = DrivingSide::LeftHand;
    let lane_id = app
        .world()
        .resource::<LaneNetwork>()
        .lane_at(segment, 0)
        .unwrap();
    app.world_mut().send_event(EditLaneRestrictionEvent {
        segment_id: segment,
        lane_index: 0,
        lane_id,
        edit: RestrictionEdit::Set(VehicleTypes::CARGO_TRAIN),
    });
    app.update();

    // Lane 0 runs forward, which leads to the start node under left-hand rules.
    assert_eq!(allowed_into(&mut app, segment, start), VehicleTypes::CARGO_TRAIN);
}

#[test]
fn test_released_vehicle_state_is_dropped() {
    let (mut app, _, _, _) = app_with_track();
    app.world_mut()
        .resource_mut::<VehicleEphemeralStates>()
        .record_position(VehicleId(3), Vec3::ONE);

    app.world_mut()
        .send_event(VehicleReleasedEvent { vehicle: VehicleId(3) });
    app.update();

    assert!(app.world().resource::<VehicleEphemeralStates>().is_empty());
}
