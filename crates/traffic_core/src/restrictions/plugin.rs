use bevy::prelude::*;

use crate::network::{LaneId, LaneNetwork, SegmentId};

use super::observers::NodeInvalidations;
use super::resolver::LaneRestrictions;
use super::types::RestrictionEdit;

/// Fired by the authoring tool to change what may use a lane.
#[derive(Event, Debug, Clone, Copy)]
pub struct EditLaneRestrictionEvent {
    pub segment_id: SegmentId,
    pub lane_index: u8,
    pub lane_id: LaneId,
    pub edit: RestrictionEdit,
}

/// Fired by the host when a segment was rebuilt with a different lane layout.
#[derive(Event, Debug, Clone, Copy)]
pub struct SegmentLanesChangedEvent {
    pub segment_id: SegmentId,
}

/// Drop cached defaults and stale overrides of rebuilt segments.
pub fn invalidate_changed_segments(
    mut events: EventReader<SegmentLanesChangedEvent>,
    mut restrictions: ResMut<LaneRestrictions>,
) {
    for event in events.read() {
        restrictions.on_segment_lanes_changed(event.segment_id);
    }
}

/// Apply queued restriction edits, notifying both end nodes of every edited
/// segment before the next system reads the network.
pub fn apply_restriction_edits(
    mut events: EventReader<EditLaneRestrictionEvent>,
    network: Res<LaneNetwork>,
    mut restrictions: ResMut<LaneRestrictions>,
    mut invalidations: ResMut<NodeInvalidations>,
) {
    for event in events.read() {
        let applied = restrictions.apply_edit(
            &network,
            &mut *invalidations,
            event.segment_id,
            event.lane_index,
            event.lane_id,
            event.edit,
        );
        if !applied {
            warn!(
                "Ignoring restriction edit on segment {} lane {}: segment or lane not created",
                event.segment_id.0, event.lane_index
            );
        }
    }
}

pub struct RestrictionsPlugin;

impl Plugin for RestrictionsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LaneNetwork>()
            .init_resource::<LaneRestrictions>()
            .init_resource::<NodeInvalidations>()
            .add_event::<EditLaneRestrictionEvent>()
            .add_event::<SegmentLanesChangedEvent>()
            .add_systems(
                Update,
                (invalidate_changed_segments, apply_restriction_edits).chain(),
            );
    }
}
