use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::network::{
    LaneDirection, LaneId, LaneInfo, LaneNetwork, LaneType, LaneVehicleTypes, NodeId, Segment,
    SegmentId,
};
use crate::options::DrivingSide;
use crate::vehicle_types::VehicleTypes;

use super::observers::NodeObserver;
use super::types::{RestrictionEdit, RestrictionOverride};

/// Lane vehicle-type restrictions.
///
/// Two stores per segment: a sparse override array written only by edits, and
/// a dense default cache filled lazily from each lane's capability flags. Both
/// are indexed by lane index; a cache whose length no longer matches the
/// segment's lane count is thrown away and rebuilt.
#[derive(Resource, Debug, Default)]
pub struct LaneRestrictions {
    overrides: HashMap<SegmentId, Vec<RestrictionOverride>>,
    default_cache: HashMap<SegmentId, Vec<Option<VehicleTypes>>>,
}

/// Maximum set of categories a lane's medium can carry.
pub fn base_mask(info: &LaneInfo) -> VehicleTypes {
    if info.is_road_lane() {
        VehicleTypes::ROAD_VEHICLE
    } else if info.is_rail_lane() {
        VehicleTypes::RAIL_VEHICLE
    } else {
        VehicleTypes::NONE
    }
}

/// Base mask of a lane instance; empty for uncreated lanes or segments.
pub fn base_mask_for_lane_id(network: &LaneNetwork, lane_id: LaneId) -> VehicleTypes {
    created_lane_info(network, lane_id).map_or(VehicleTypes::NONE, |(_, _, info)| base_mask(info))
}

/// Categories a lane allows when nobody restricted it.
pub fn compute_default_types(info: &LaneInfo) -> VehicleTypes {
    let media = info.vehicle_types;
    let mut types = VehicleTypes::NONE;
    if media.intersects(LaneVehicleTypes::BICYCLE) {
        types |= VehicleTypes::BICYCLE;
    }
    if media.intersects(LaneVehicleTypes::TRAM) {
        types |= VehicleTypes::TRAM;
    }
    if info.lane_type.intersects(LaneType::TRANSPORT_VEHICLE) {
        types |= VehicleTypes::ROAD_PUBLIC_TRANSPORT | VehicleTypes::SERVICE | VehicleTypes::EMERGENCY;
    } else if media.intersects(LaneVehicleTypes::CAR) {
        types |= VehicleTypes::ROAD_VEHICLE;
    }
    if media.intersects(LaneVehicleTypes::TRAIN | LaneVehicleTypes::METRO) {
        types |= VehicleTypes::RAIL_VEHICLE;
    }
    if media.intersects(LaneVehicleTypes::SHIP) {
        types |= VehicleTypes::SHIP;
    }
    if media.intersects(LaneVehicleTypes::PLANE) {
        types |= VehicleTypes::PLANE;
    }
    types
}

fn created_lane_info(network: &LaneNetwork, lane_id: LaneId) -> Option<(SegmentId, u8, &LaneInfo)> {
    if !network.is_lane_created(lane_id) {
        return None;
    }
    let (segment, index, info) = network.lane_position(lane_id)?;
    network.is_segment_created(segment).then_some((segment, index, info))
}

/// Notify the observers of both end nodes of a segment.
fn notify_start_end_node(segment: &Segment, observer: &mut dyn NodeObserver) {
    if !segment.start_node.is_null() {
        observer.notify(segment.start_node);
    }
    if !segment.end_node.is_null() {
        observer.notify(segment.end_node);
    }
}

impl LaneRestrictions {
    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Union of the categories allowed on every lane of `segment` that leads
    /// into `node`.
    pub fn allowed_types(
        &mut self,
        network: &LaneNetwork,
        side: DrivingSide,
        segment: SegmentId,
        node: NodeId,
    ) -> VehicleTypes {
        self.allowed_types_by_lane(network, side, segment, node)
            .into_values()
            .fold(VehicleTypes::NONE, |acc, types| acc | types)
    }

    /// Allowed categories per lane index for the lanes of `segment` leading
    /// into `node`. Lanes nobody may use are left out.
    pub fn allowed_types_by_lane(
        &mut self,
        network: &LaneNetwork,
        side: DrivingSide,
        segment_id: SegmentId,
        node_id: NodeId,
    ) -> BTreeMap<u8, VehicleTypes> {
        #[cfg(feature = "trace")]
        let _span = bevy::log::info_span!("allowed_types_by_lane").entered();

        let mut result = BTreeMap::new();
        let Some(segment) = network.created_segment(segment_id) else {
            return result;
        };
        if !network.is_node_created(node_id) {
            return result;
        }

        let forward = LaneDirection::Forward
            .inverted_if(segment.inverted)
            .inverted_if(side.is_left_hand());
        let lane_count = segment.info.lane_count();

        for (index, info, _) in network.segment_lanes(segment_id) {
            let to_node = if info.direction == forward {
                segment.end_node
            } else {
                segment.start_node
            };
            if to_node != node_id {
                continue;
            }
            let types = self.resolve(segment_id, lane_count, index, info);
            if !types.is_empty() {
                result.insert(index, types);
            }
        }
        result
    }

    /// Allowed categories of one lane: the override if set, else the default.
    pub fn allowed_types_for_lane(
        &mut self,
        network: &LaneNetwork,
        segment_id: SegmentId,
        lane_index: u8,
    ) -> VehicleTypes {
        let Some(segment) = network.created_segment(segment_id) else {
            return VehicleTypes::NONE;
        };
        let lane_count = segment.info.lane_count();
        match segment.info.lanes.get(lane_index as usize) {
            Some(info) => self.resolve(segment_id, lane_count, lane_index, info),
            None => VehicleTypes::NONE,
        }
    }

    /// Default categories of one lane, ignoring overrides.
    pub fn default_allowed_types(
        &mut self,
        network: &LaneNetwork,
        segment_id: SegmentId,
        lane_index: u8,
    ) -> VehicleTypes {
        let Some(segment) = network.created_segment(segment_id) else {
            return VehicleTypes::NONE;
        };
        let lane_count = segment.info.lane_count();
        match segment.info.lanes.get(lane_index as usize) {
            Some(info) => self.cached_default(segment_id, lane_count, lane_index, info),
            None => VehicleTypes::NONE,
        }
    }

    /// Default categories of a lane instance, located by walking its
    /// segment's lane chain.
    pub fn default_allowed_types_for_lane_id(
        &mut self,
        network: &LaneNetwork,
        lane_id: LaneId,
    ) -> VehicleTypes {
        match created_lane_info(network, lane_id) {
            Some((segment_id, index, info)) => {
                let lane_count = network
                    .segment(segment_id)
                    .map_or(0, |segment| segment.info.lane_count());
                self.cached_default(segment_id, lane_count, index, info)
            }
            None => VehicleTypes::NONE,
        }
    }

    /// Whether any override array exists for the segment. Overrides equal to
    /// the default still count.
    pub fn has_overrides(&self, segment: SegmentId) -> bool {
        self.overrides.contains_key(&segment)
    }

    pub fn override_for(&self, segment: SegmentId, lane_index: u8) -> RestrictionOverride {
        self.overrides
            .get(&segment)
            .and_then(|lanes| lanes.get(lane_index as usize))
            .copied()
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Edits
    // -------------------------------------------------------------------------

    /// Replace the allowed categories of a lane.
    pub fn set_allowed(
        &mut self,
        network: &LaneNetwork,
        observer: &mut dyn NodeObserver,
        segment_id: SegmentId,
        lane_index: u8,
        lane_id: LaneId,
        types: VehicleTypes,
    ) -> bool {
        self.edit(network, observer, segment_id, lane_index, lane_id, |_| types)
    }

    /// Allow additional categories on a lane.
    pub fn add_allowed(
        &mut self,
        network: &LaneNetwork,
        observer: &mut dyn NodeObserver,
        segment_id: SegmentId,
        lane_index: u8,
        lane_id: LaneId,
        types: VehicleTypes,
    ) -> bool {
        self.edit(network, observer, segment_id, lane_index, lane_id, |current| current | types)
    }

    /// Forbid categories on a lane.
    pub fn remove_allowed(
        &mut self,
        network: &LaneNetwork,
        observer: &mut dyn NodeObserver,
        segment_id: SegmentId,
        lane_index: u8,
        lane_id: LaneId,
        types: VehicleTypes,
    ) -> bool {
        self.edit(network, observer, segment_id, lane_index, lane_id, |current| current & !types)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn toggle_allowed(
        &mut self,
        network: &LaneNetwork,
        observer: &mut dyn NodeObserver,
        segment_id: SegmentId,
        lane_index: u8,
        lane_id: LaneId,
        types: VehicleTypes,
        add: bool,
    ) -> bool {
        if add {
            self.add_allowed(network, observer, segment_id, lane_index, lane_id, types)
        } else {
            self.remove_allowed(network, observer, segment_id, lane_index, lane_id, types)
        }
    }

    /// Dispatch a [`RestrictionEdit`].
    pub fn apply_edit(
        &mut self,
        network: &LaneNetwork,
        observer: &mut dyn NodeObserver,
        segment_id: SegmentId,
        lane_index: u8,
        lane_id: LaneId,
        edit: RestrictionEdit,
    ) -> bool {
        match edit {
            RestrictionEdit::Set(types) => {
                self.set_allowed(network, observer, segment_id, lane_index, lane_id, types)
            }
            RestrictionEdit::Add(types) => {
                self.add_allowed(network, observer, segment_id, lane_index, lane_id, types)
            }
            RestrictionEdit::Remove(types) => {
                self.remove_allowed(network, observer, segment_id, lane_index, lane_id, types)
            }
            RestrictionEdit::Toggle { types, add } => {
                self.toggle_allowed(network, observer, segment_id, lane_index, lane_id, types, add)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Invalidation
    // -------------------------------------------------------------------------

    /// Drop the default cache of one segment.
    pub fn clear_cache(&mut self, segment: SegmentId) {
        self.default_cache.remove(&segment);
    }

    /// The segment's lane layout changed: lane indices no longer mean what
    /// they did, so overrides go along with the cache.
    pub fn on_segment_lanes_changed(&mut self, segment: SegmentId) {
        self.default_cache.remove(&segment);
        self.overrides.remove(&segment);
    }

    /// Forget everything (level unload).
    pub fn clear_all(&mut self) {
        self.default_cache.clear();
        self.overrides.clear();
    }

    pub fn cached_segment_count(&self) -> usize {
        self.default_cache.len()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn edit(
        &mut self,
        network: &LaneNetwork,
        observer: &mut dyn NodeObserver,
        segment_id: SegmentId,
        lane_index: u8,
        lane_id: LaneId,
        apply: impl FnOnce(VehicleTypes) -> VehicleTypes,
    ) -> bool {
        let Some(segment) = network.created_segment(segment_id) else {
            return false;
        };
        if !network.is_lane_created(lane_id) {
            return false;
        }
        let lane_count = segment.info.lane_count();
        let Some(info) = segment.info.lanes.get(lane_index as usize) else {
            return false;
        };

        let current = self.resolve(segment_id, lane_count, lane_index, info);
        let types = apply(current) & base_mask(info);

        let lanes = self.overrides.entry(segment_id).or_default();
        if lanes.len() != lane_count {
            *lanes = vec![RestrictionOverride::Unset; lane_count];
        }
        lanes[lane_index as usize] = RestrictionOverride::Explicit(types);

        debug!(
            "Lane restriction on segment {} lane {} set to {:#06x}",
            segment_id.0,
            lane_index,
            types.bits()
        );
        notify_start_end_node(segment, observer);
        true
    }

    fn resolve(&mut self, segment: SegmentId, lane_count: usize, lane_index: u8, info: &LaneInfo) -> VehicleTypes {
        let explicit = self
            .overrides
            .get(&segment)
            .filter(|lanes| lanes.len() == lane_count)
            .and_then(|lanes| lanes.get(lane_index as usize))
            .and_then(|o| o.explicit());
        match explicit {
            Some(types) => types,
            None => self.cached_default(segment, lane_count, lane_index, info),
        }
    }

    fn cached_default(
        &mut self,
        segment: SegmentId,
        lane_count: usize,
        lane_index: u8,
        info: &LaneInfo,
    ) -> VehicleTypes {
        let cache = self.default_cache.entry(segment).or_default();
        if cache.len() != lane_count {
            *cache = vec![None; lane_count];
        }
        match cache.get_mut(lane_index as usize) {
            Some(Some(types)) => *types,
            Some(slot) => {
                let types = compute_default_types(info);
                *slot = Some(types);
                types
            }
            None => compute_default_types(info),
        }
    }
}
