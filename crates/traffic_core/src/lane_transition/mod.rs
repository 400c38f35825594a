//! Lane-transition safety for rail vehicles.
//!
//! Runs when a train is about to move onto the next lane of its path: probes
//! the connection curve for other vehicles, asks the junction for right of
//! way and computes the speed the train may keep.

mod guard;
mod speed;

pub use guard::{
    check_next_lane, JunctionArbiter, LaneSpace, LaneTransitionContext, NextLaneDecision,
    NextLaneOutcome, NextLaneProbe, OverlapQuery, SegmentChangeRequest,
};
pub use speed::{calculate_segment_position, RailSpeedModel, SegmentPosition, TargetSpeed};
