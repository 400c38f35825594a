use bevy::prelude::*;

use crate::geometry::Bezier3;

use super::types::*;

/// Read model of the road/rail network: nodes, segments and lane instances,
/// each addressed by its id as an index. Slot 0 of every table is the null
/// entry and never counts as created.
#[derive(Resource, Debug, Clone)]
pub struct LaneNetwork {
    nodes: Vec<Node>,
    segments: Vec<Segment>,
    lanes: Vec<Lane>,
}

impl Default for LaneNetwork {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                id: NodeId::NULL,
                position: Vec3::ZERO,
                created: false,
            }],
            segments: vec![Segment {
                id: SegmentId::NULL,
                start_node: NodeId::NULL,
                end_node: NodeId::NULL,
                info: SegmentInfo::default(),
                first_lane: LaneId::NULL,
                inverted: false,
                created: false,
            }],
            lanes: vec![Lane {
                id: LaneId::NULL,
                segment: SegmentId::NULL,
                next_lane: LaneId::NULL,
                bezier: Bezier3::default(),
                curve: 0.0,
                created: false,
            }],
        }
    }
}

impl LaneNetwork {
    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        if id.is_null() {
            return None;
        }
        self.nodes.get(id.index())
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        if id.is_null() {
            return None;
        }
        self.segments.get(id.index())
    }

    pub fn lane(&self, id: LaneId) -> Option<&Lane> {
        if id.is_null() {
            return None;
        }
        self.lanes.get(id.index())
    }

    pub fn lane_mut(&mut self, id: LaneId) -> Option<&mut Lane> {
        if id.is_null() {
            return None;
        }
        self.lanes.get_mut(id.index())
    }

    /// The segment if it exists and is created.
    pub fn created_segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segment(id).filter(|s| s.created)
    }

    pub fn is_node_created(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.created)
    }

    pub fn is_segment_created(&self, id: SegmentId) -> bool {
        self.created_segment(id).is_some()
    }

    pub fn is_lane_created(&self, id: LaneId) -> bool {
        self.lane(id).is_some_and(|l| l.created)
    }

    /// Walk the lane chain of a segment, yielding `(index, info, lane id)`.
    ///
    /// Stops at whichever ends first: the prefab lane list or the instance
    /// chain. An unknown segment yields nothing.
    pub fn segment_lanes(&self, id: SegmentId) -> SegmentLanes<'_> {
        match self.segment(id) {
            Some(segment) => SegmentLanes {
                network: self,
                infos: &segment.info.lanes,
                current: segment.first_lane,
                index: 0,
            },
            None => SegmentLanes {
                network: self,
                infos: &[],
                current: LaneId::NULL,
                index: 0,
            },
        }
    }

    /// Segment and lane index of a lane instance, found by walking the owning
    /// segment's chain.
    pub fn lane_position(&self, lane_id: LaneId) -> Option<(SegmentId, u8, &LaneInfo)> {
        let lane = self.lane(lane_id)?;
        self.segment_lanes(lane.segment)
            .find(|(_, _, id)| *id == lane_id)
            .map(|(index, info, _)| (lane.segment, index, info))
    }

    /// Lane instance id at `lane_index` of a segment.
    pub fn lane_at(&self, segment: SegmentId, lane_index: u8) -> Option<LaneId> {
        self.segment_lanes(segment)
            .find(|(index, _, _)| *index == lane_index)
            .map(|(_, _, id)| id)
    }

    // -------------------------------------------------------------------------
    // Construction (driven by the host when the network changes)
    // -------------------------------------------------------------------------

    /// Returns [`NodeId::NULL`] once the id space is exhausted.
    pub fn add_node(&mut self, position: Vec3) -> NodeId {
        let Ok(raw) = u16::try_from(self.nodes.len()) else {
            warn!("Node table full, refusing node at {position}");
            return NodeId::NULL;
        };
        let id = NodeId(raw);
        self.nodes.push(Node {
            id,
            position,
            created: true,
        });
        id
    }

    /// Add a created segment between two nodes, allocating one straight lane
    /// instance per prefab lane. Returns [`SegmentId::NULL`] once the id
    /// space is exhausted.
    pub fn add_segment(&mut self, start_node: NodeId, end_node: NodeId, info: SegmentInfo) -> SegmentId {
        let Ok(raw) = u16::try_from(self.segments.len()) else {
            warn!("Segment table full, refusing segment {start_node:?} -> {end_node:?}");
            return SegmentId::NULL;
        };
        let id = SegmentId(raw);
        self.segments.push(Segment {
            id,
            start_node,
            end_node,
            info: SegmentInfo::default(),
            first_lane: LaneId::NULL,
            inverted: false,
            created: true,
        });
        self.replace_segment_info(id, info);
        id
    }

    /// Swap in a new prefab for a segment (road upgrade). Existing lane
    /// instances are released and a fresh chain is allocated.
    pub fn replace_segment_info(&mut self, id: SegmentId, info: SegmentInfo) {
        let old_lanes: Vec<LaneId> = self.segment_lanes(id).map(|(_, _, lane)| lane).collect();
        for lane in old_lanes {
            if let Some(lane) = self.lane_mut(lane) {
                lane.created = false;
                lane.next_lane = LaneId::NULL;
            }
        }

        let Some(segment) = self.segment(id) else {
            return;
        };
        let from = self.node(segment.start_node).map_or(Vec3::ZERO, |n| n.position);
        let to = self.node(segment.end_node).map_or(Vec3::ZERO, |n| n.position);
        let bezier = Bezier3::straight(from, to);

        let mut first = LaneId::NULL;
        let mut prev = LaneId::NULL;
        for _ in 0..info.lanes.len() {
            let Ok(raw) = u32::try_from(self.lanes.len()) else {
                warn!("Lane table full, segment {id:?} left with a partial lane chain");
                break;
            };
            let lane_id = LaneId(raw);
            self.lanes.push(Lane {
                id: lane_id,
                segment: id,
                next_lane: LaneId::NULL,
                bezier,
                curve: 0.0,
                created: true,
            });
            if prev.is_null() {
                first = lane_id;
            } else if let Some(prev_lane) = self.lane_mut(prev) {
                prev_lane.next_lane = lane_id;
            }
            prev = lane_id;
        }

        if let Some(segment) = self.segments.get_mut(id.index()) {
            segment.info = info;
            segment.first_lane = first;
        }
    }

    pub fn set_segment_inverted(&mut self, id: SegmentId, inverted: bool) {
        if id.is_null() {
            return;
        }
        if let Some(segment) = self.segments.get_mut(id.index()) {
            segment.inverted = inverted;
        }
    }

    /// Mark a segment and its lanes as no longer created.
    pub fn release_segment(&mut self, id: SegmentId) {
        let lanes: Vec<LaneId> = self.segment_lanes(id).map(|(_, _, lane)| lane).collect();
        for lane in lanes {
            if let Some(lane) = self.lane_mut(lane) {
                lane.created = false;
            }
        }
        if id.is_null() {
            return;
        }
        if let Some(segment) = self.segments.get_mut(id.index()) {
            segment.created = false;
        }
    }

    pub fn release_node(&mut self, id: NodeId) {
        if id.is_null() {
            return;
        }
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.created = false;
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len() - 1
    }
}

/// Iterator over a segment's lanes, see [`LaneNetwork::segment_lanes`].
pub struct SegmentLanes<'a> {
    network: &'a LaneNetwork,
    infos: &'a [LaneInfo],
    current: LaneId,
    index: usize,
}

impl<'a> Iterator for SegmentLanes<'a> {
    type Item = (u8, &'a LaneInfo, LaneId);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_null() || self.index >= self.infos.len() {
            return None;
        }
        let index = u8::try_from(self.index).ok()?;
        let info = &self.infos[self.index];
        let item = (index, info, self.current);
        self.current = self
            .network
            .lane(self.current)
            .map_or(LaneId::NULL, |lane| lane.next_lane);
        self.index += 1;
        Some(item)
    }
}
