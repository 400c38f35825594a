use bevy::prelude::*;

use crate::config::{
    APPROACH_PROBE_MIN_LENGTH_SQ, APPROACH_PROBE_START_INSET, EXIT_PROBE_MIN_LENGTH_SQ,
    LANE_SPACE_LOOKAHEAD, SAFETY_MARGIN,
};
use crate::geometry::{Bezier3, Segment3};
use crate::network::{LaneId, LaneNetwork, NodeId, PathPosition};
use crate::options::TrafficOptions;
use crate::vehicle_state::VehicleStateTracker;
use crate::vehicles::{Frame, Vehicle, VehicleId};

/// Free-space check on a lane, provided by the host's lane occupancy data.
pub trait LaneSpace {
    fn check_space(&self, lane: LaneId, space: f32, ignore: VehicleId) -> bool;
}

/// Whether a probe segment hits any unit outside the probing vehicle's
/// consist and the ignored vehicle.
pub trait OverlapQuery {
    fn overlaps(&self, vehicle: VehicleId, probe: &Segment3, ignore: VehicleId) -> bool;
}

/// A vehicle asking to cross the node between two path positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentChangeRequest {
    pub vehicle: VehicleId,
    pub frame: Frame,
    pub prev_position: PathPosition,
    pub prev_target_node: NodeId,
    pub prev_lane: LaneId,
    pub next_position: PathPosition,
    pub next_target_node: NodeId,
    pub next_lane: LaneId,
}

/// Junction right-of-way (timed lights, priority signs).
pub trait JunctionArbiter {
    /// Returns whether the vehicle may enter, and the speed it must hold
    /// when it may not.
    fn may_change_segment(&mut self, request: &SegmentChangeRequest) -> (bool, f32);
}

/// Collaborators consulted at a lane transition.
pub struct LaneTransitionContext<'a> {
    pub network: &'a LaneNetwork,
    pub options: &'a TrafficOptions,
    pub space: &'a dyn LaneSpace,
    pub overlaps: &'a dyn OverlapQuery,
    pub arbiter: &'a mut dyn JunctionArbiter,
    pub tracker: &'a mut dyn VehicleStateTracker,
}

/// Everything known about a vehicle about to leave its lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextLaneProbe {
    pub vehicle: VehicleId,
    pub frame: Frame,
    pub braking: f32,
    pub wheel_base: f32,
    /// Physical segment the vehicle occupies now.
    pub current_segment: Segment3,
    /// Curve of the lane connection ahead.
    pub curve: Bezier3,
    pub next_position: PathPosition,
    pub next_lane: LaneId,
    pub next_offset: u8,
    pub prev_position: PathPosition,
    pub prev_lane: LaneId,
    pub prev_offset: u8,
}

impl NextLaneProbe {
    /// Probe for `vehicle` with the lane positions left empty.
    pub fn new(id: VehicleId, vehicle: &Vehicle, curve: Bezier3) -> Self {
        Self {
            vehicle: id,
            frame: vehicle.frame,
            braking: vehicle.info.braking,
            wheel_base: vehicle.info.wheel_base,
            current_segment: vehicle.segment,
            curve,
            next_position: PathPosition::default(),
            next_lane: LaneId::NULL,
            next_offset: 0,
            prev_position: PathPosition::default(),
            prev_lane: LaneId::NULL,
            prev_offset: 0,
        }
    }

    pub fn with_next(mut self, position: PathPosition, lane: LaneId, offset: u8) -> Self {
        self.next_position = position;
        self.next_lane = lane;
        self.next_offset = offset;
        self
    }

    pub fn with_prev(mut self, position: PathPosition, lane: LaneId, offset: u8) -> Self {
        self.prev_position = position;
        self.prev_lane = lane;
        self.prev_offset = offset;
        self
    }

    /// Front and rear axle positions.
    fn anchors(&self) -> (Vec3, Vec3) {
        let half = self.frame.rotation * Vec3::new(0.0, 0.0, self.wheel_base * 0.5);
        (self.frame.position + half, self.frame.position - half)
    }

    fn braking_distance(&self) -> f32 {
        0.5 * self.frame.velocity.length_squared() / self.braking.max(f32::EPSILON)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextLaneOutcome {
    /// Nothing to do this tick (still far away, or free to enter).
    Clear,
    /// The next lane has no room.
    NoSpace,
    /// A probe overlaps another vehicle.
    Blocked,
    /// The junction holds the vehicle back.
    ArbitrationRejected,
    /// The junction lets the vehicle through.
    ArbitrationAccepted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextLaneDecision {
    pub max_speed: f32,
    pub outcome: NextLaneOutcome,
}

impl NextLaneDecision {
    fn new(max_speed: f32, outcome: NextLaneOutcome) -> Self {
        Self { max_speed, outcome }
    }
}

/// Decide how fast a vehicle may keep going as it reaches the next lane.
///
/// Once the vehicle is within braking distance of the connection it must
/// commit: the next lane needs room, the two probes along the connection must
/// be free of other vehicles, and a shared junction must admit it.
pub fn check_next_lane(
    ctx: &mut LaneTransitionContext,
    probe: &NextLaneProbe,
    max_speed: f32,
) -> NextLaneDecision {
    #[cfg(feature = "trace")]
    let _span = bevy::log::info_span!("check_next_lane").entered();

    if ctx.options.tracks_positions() {
        if let Err(err) = ctx.tracker.update_vehicle_pos_between(
            probe.vehicle,
            probe.prev_position,
            probe.next_position,
        ) {
            error!("Train {} position update failed: {err}", probe.vehicle.0);
        }
    }

    let (front, rear) = probe.anchors();
    let braking = probe.braking_distance();
    let closest = front.distance(probe.curve.a).min(rear.distance(probe.curve.a));
    if closest < braking - SAFETY_MARGIN {
        return NextLaneDecision::new(max_speed, NextLaneOutcome::Clear);
    }

    if !ctx
        .space
        .check_space(probe.next_lane, LANE_SPACE_LOOKAHEAD, probe.vehicle)
    {
        return NextLaneDecision::new(0.0, NextLaneOutcome::NoSpace);
    }

    let middle = probe.curve.position(0.5);
    let approach_start = if probe.current_segment.a.distance_squared(middle)
        < probe.curve.a.distance_squared(middle)
    {
        probe.current_segment.a
    } else {
        probe.curve.a
    };
    let mut approach = Segment3::new(approach_start, middle);
    if approach.length_squared() >= APPROACH_PROBE_MIN_LENGTH_SQ {
        approach.a += approach.direction() * APPROACH_PROBE_START_INSET;
        if ctx.overlaps.overlaps(probe.vehicle, &approach, probe.vehicle) {
            return NextLaneDecision::new(0.0, NextLaneOutcome::Blocked);
        }
    }

    let exit = Segment3::new(middle, probe.curve.d);
    if exit.length_squared() >= EXIT_PROBE_MIN_LENGTH_SQ
        && ctx.overlaps.overlaps(probe.vehicle, &exit, probe.vehicle)
    {
        return NextLaneDecision::new(0.0, NextLaneOutcome::Blocked);
    }

    let next_target = target_node(
        ctx.network,
        probe.next_position,
        probe.next_offset < probe.next_position.offset,
    );
    let prev_target = target_node(ctx.network, probe.prev_position, probe.prev_offset == 0);
    if next_target.is_null() || next_target != prev_target {
        return NextLaneDecision::new(max_speed, NextLaneOutcome::Clear);
    }

    let request = SegmentChangeRequest {
        vehicle: probe.vehicle,
        frame: probe.frame,
        prev_position: probe.prev_position,
        prev_target_node: prev_target,
        prev_lane: probe.prev_lane,
        next_position: probe.next_position,
        next_target_node: next_target,
        next_lane: probe.next_lane,
    };
    let (may_change, held_speed) = ctx.arbiter.may_change_segment(&request);
    if may_change {
        NextLaneDecision::new(max_speed, NextLaneOutcome::ArbitrationAccepted)
    } else {
        NextLaneDecision::new(held_speed, NextLaneOutcome::ArbitrationRejected)
    }
}

/// Start node of the position's segment when `toward_start`, else its end
/// node. Null for unknown segments.
fn target_node(network: &LaneNetwork, position: PathPosition, toward_start: bool) -> NodeId {
    network
        .segment(position.segment)
        .map_or(NodeId::NULL, |segment| {
            if toward_start {
                segment.start_node
            } else {
                segment.end_node
            }
        })
}
