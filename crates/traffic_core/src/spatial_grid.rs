use bevy::prelude::*;
use std::collections::HashMap;

use crate::config::{OVERLAP_RADIUS, VEHICLE_BUCKET_SIZE, WORLD_HALF_EXTENT};
use crate::geometry::Segment3;
use crate::lane_transition::OverlapQuery;
use crate::options::TrafficOptions;
use crate::vehicles::{VehicleArena, VehicleFlags, VehicleId};

const BUCKETS_PER_SIDE: usize = (2.0 * WORLD_HALF_EXTENT / VEHICLE_BUCKET_SIZE) as usize + 1;
const TOTAL_BUCKETS: usize = BUCKETS_PER_SIDE * BUCKETS_PER_SIDE;

/// Physical extent of one unit: its segment inflated by `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCapsule {
    pub unit: VehicleId,
    /// First unit of the consist the unit belongs to.
    pub head: VehicleId,
    pub segment: Segment3,
    pub radius: f32,
}

/// Bucketed index of spawned units on the ground plane (x/z), rebuilt every
/// tick from the vehicle arena.
#[derive(Resource)]
pub struct VehicleSpatialIndex {
    buckets: Vec<Vec<UnitCapsule>>,
    heads: HashMap<VehicleId, VehicleId>,
}

impl Default for VehicleSpatialIndex {
    fn default() -> Self {
        Self {
            buckets: (0..TOTAL_BUCKETS).map(|_| Vec::new()).collect(),
            heads: HashMap::new(),
        }
    }
}

impl VehicleSpatialIndex {
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.heads.clear();
    }

    /// Insert a capsule into every bucket its inflated bounds touch.
    pub fn insert(&mut self, capsule: UnitCapsule) {
        self.heads.insert(capsule.unit, capsule.head);
        let (min, max) = capsule.segment.bounds();
        let inflate = Vec3::splat(capsule.radius);
        let (min_bx, min_bz) = Self::bucket_coords(min - inflate);
        let (max_bx, max_bz) = Self::bucket_coords(max + inflate);
        for bz in Self::bucket_span(min_bz, max_bz) {
            for bx in Self::bucket_span(min_bx, max_bx) {
                if let Some(idx) = Self::flat_index(bx, bz) {
                    self.buckets[idx].push(capsule);
                }
            }
        }
    }

    /// Capsules in the buckets covering the given bounds. A capsule spanning
    /// several buckets may be yielded more than once.
    pub fn query_bounds(&self, min: Vec3, max: Vec3) -> impl Iterator<Item = &UnitCapsule> {
        let (min_bx, min_bz) = Self::bucket_coords(min);
        let (max_bx, max_bz) = Self::bucket_coords(max);
        Self::bucket_span(min_bz, max_bz)
            .flat_map(move |bz| Self::bucket_span(min_bx, max_bx).map(move |bx| (bx, bz)))
            .filter_map(|(bx, bz)| Self::flat_index(bx, bz))
            .flat_map(move |idx| self.buckets[idx].iter())
    }

    /// Consist head of an indexed unit, or the unit itself when unknown.
    pub fn head_of(&self, unit: VehicleId) -> VehicleId {
        self.heads.get(&unit).copied().unwrap_or(unit)
    }

    pub fn unit_count(&self) -> usize {
        self.heads.len()
    }

    /// Re-index every spawned unit of the arena.
    pub fn rebuild(&mut self, vehicles: &VehicleArena, max_hops: u32) {
        #[cfg(feature = "trace")]
        let _span = bevy::log::info_span!("vehicle_index_rebuild").entered();

        self.clear();
        for (id, vehicle) in vehicles.iter_alive() {
            if !vehicle.flags.contains(VehicleFlags::SPAWNED) {
                continue;
            }
            self.insert(UnitCapsule {
                unit: id,
                head: consist_head(vehicles, id, max_hops),
                segment: vehicle.segment,
                radius: OVERLAP_RADIUS,
            });
        }
    }

    #[inline]
    fn bucket_coords(p: Vec3) -> (i32, i32) {
        (
            ((p.x + WORLD_HALF_EXTENT) / VEHICLE_BUCKET_SIZE).floor() as i32,
            ((p.z + WORLD_HALF_EXTENT) / VEHICLE_BUCKET_SIZE).floor() as i32,
        )
    }

    /// Bucket range limited to the grid. Empty when the bounds lie entirely
    /// outside the world.
    #[inline]
    fn bucket_span(lo: i32, hi: i32) -> std::ops::RangeInclusive<i32> {
        lo.max(0)..=hi.min(BUCKETS_PER_SIDE as i32 - 1)
    }

    #[inline]
    fn flat_index(bx: i32, bz: i32) -> Option<usize> {
        if bx >= 0 && bz >= 0 && (bx as usize) < BUCKETS_PER_SIDE && (bz as usize) < BUCKETS_PER_SIDE {
            Some(bz as usize * BUCKETS_PER_SIDE + bx as usize)
        } else {
            None
        }
    }
}

impl OverlapQuery for VehicleSpatialIndex {
    fn overlaps(&self, vehicle: VehicleId, probe: &Segment3, ignore: VehicleId) -> bool {
        let own_head = self.head_of(vehicle);
        let ignored_head = if ignore.is_null() {
            VehicleId::NULL
        } else {
            self.head_of(ignore)
        };
        let (min, max) = probe.bounds();
        let inflate = Vec3::splat(OVERLAP_RADIUS);
        self.query_bounds(min - inflate, max + inflate).any(|capsule| {
            capsule.head != own_head
                && capsule.head != ignored_head
                && capsule.segment.distance_to_segment(probe) < capsule.radius
        })
    }
}

/// Walk leading links to the first unit, bounded by `max_hops`.
fn consist_head(vehicles: &VehicleArena, unit: VehicleId, max_hops: u32) -> VehicleId {
    let mut current = unit;
    for _ in 0..max_hops {
        match vehicles.get(current) {
            Some(v) if !v.leading.is_null() => current = v.leading,
            _ => break,
        }
    }
    current
}

pub fn rebuild_vehicle_index(
    vehicles: Res<VehicleArena>,
    options: Res<TrafficOptions>,
    mut index: ResMut<VehicleSpatialIndex>,
) {
    index.rebuild(&vehicles, options.max_consist_hops);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicles::{Vehicle, VehicleInfo};

    fn spawned_unit(arena: &mut VehicleArena, from: Vec3, to: Vec3) -> VehicleId {
        let mut vehicle = Vehicle::new(VehicleInfo::default()).with_flags(VehicleFlags::SPAWNED);
        vehicle.segment = Segment3::new(from, to);
        arena.insert(vehicle)
    }

    #[test]
    fn test_query_bounds_finds_nearby_units() {
        let mut index = VehicleSpatialIndex::default();
        let segment = Segment3::new(Vec3::new(10.0, 0.0, 10.0), Vec3::new(20.0, 0.0, 10.0));
        index.insert(UnitCapsule {
            unit: VehicleId(1),
            head: VehicleId(1),
            segment,
            radius: 2.0,
        });

        assert!(index
            .query_bounds(Vec3::new(0.0, 0.0, 0.0), Vec3::new(30.0, 0.0, 30.0))
            .any(|c| c.unit == VehicleId(1)));
        assert!(index
            .query_bounds(Vec3::new(2000.0, 0.0, 2000.0), Vec3::new(2100.0, 0.0, 2100.0))
            .next()
            .is_none());
    }

    #[test]
    fn test_out_of_world_units_are_dropped() {
        let mut index = VehicleSpatialIndex::default();
        let far = Vec3::new(WORLD_HALF_EXTENT * 3.0, 0.0, 0.0);
        index.insert(UnitCapsule {
            unit: VehicleId(1),
            head: VehicleId(1),
            segment: Segment3::new(far, far + Vec3::X),
            radius: 2.0,
        });
        assert!(index
            .query_bounds(Vec3::splat(-WORLD_HALF_EXTENT), Vec3::splat(WORLD_HALF_EXTENT))
            .next()
            .is_none());
    }

    #[test]
    fn test_unbounded_segments_stay_within_grid() {
        let mut index = VehicleSpatialIndex::default();
        index.insert(UnitCapsule {
            unit: VehicleId(1),
            head: VehicleId(1),
            segment: Segment3::new(
                Vec3::new(f32::NEG_INFINITY, 0.0, 32.0),
                Vec3::new(f32::INFINITY, 0.0, 32.0),
            ),
            radius: 2.0,
        });
        index.insert(UnitCapsule {
            unit: VehicleId(2),
            head: VehicleId(2),
            segment: Segment3::new(Vec3::splat(f32::NAN), Vec3::splat(f32::NAN)),
            radius: 2.0,
        });

        let hits = index
            .query_bounds(Vec3::splat(f32::NEG_INFINITY), Vec3::splat(f32::INFINITY))
            .filter(|c| c.unit == VehicleId(1))
            .count();
        assert_eq!(hits, BUCKETS_PER_SIDE);
        assert_eq!(index.unit_count(), 2);
    }

    #[test]
    fn test_overlap_ignores_own_consist() {
        let mut arena = VehicleArena::default();
        let front = spawned_unit(&mut arena, Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0));
        let back = spawned_unit(&mut arena, Vec3::new(-12.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0));
        arena.link(front, back);

        let mut index = VehicleSpatialIndex::default();
        index.rebuild(&arena, 16);
        assert_eq!(index.head_of(back), front);

        let probe = Segment3::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0));
        assert!(!index.overlaps(front, &probe, front));
        assert!(!index.overlaps(back, &probe, VehicleId::NULL));
    }

    #[test]
    fn test_overlap_detects_other_consist() {
        let mut arena = VehicleArena::default();
        let me = spawned_unit(&mut arena, Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0));
        let other = spawned_unit(&mut arena, Vec3::new(30.0, 0.0, -5.0), Vec3::new(30.0, 0.0, 5.0));

        let mut index = VehicleSpatialIndex::default();
        index.rebuild(&arena, 16);

        let crossing = Segment3::new(Vec3::new(20.0, 0.0, 0.0), Vec3::new(40.0, 0.0, 0.0));
        assert!(index.overlaps(me, &crossing, me));
        // Ignoring the other consist clears the probe.
        assert!(!index.overlaps(me, &crossing, other));

        let clear = Segment3::new(Vec3::new(20.0, 0.0, 20.0), Vec3::new(40.0, 0.0, 20.0));
        assert!(!index.overlaps(me, &clear, me));
    }

    #[test]
    fn test_rebuild_skips_unspawned() {
        let mut arena = VehicleArena::default();
        arena.insert(Vehicle::new(VehicleInfo::default()));
        spawned_unit(&mut arena, Vec3::ZERO, Vec3::X);

        let mut index = VehicleSpatialIndex::default();
        index.rebuild(&arena, 16);
        assert_eq!(index.unit_count(), 1);

        index.clear();
        assert_eq!(index.unit_count(), 0);
    }
}
