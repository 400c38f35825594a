//! Vehicle arena shared with the host.
//!
//! The host allocates and frees vehicle slots; the traffic core only flips
//! flags, swaps path handles and walks the leading/trailing links of a
//! consist.

use bevy::prelude::*;

use crate::geometry::Segment3;
use crate::vehicle_types::bitmask_ops;

/// Vehicle id. `0` is the null id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VehicleId(pub u16);

impl VehicleId {
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

/// Opaque route handle issued by the path-search collaborator. `0` = none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PathHandle(pub u32);

impl PathHandle {
    pub const NULL: Self = Self(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VehicleFlags(pub u32);

bitmask_ops!(VehicleFlags, u32);

impl VehicleFlags {
    pub const CREATED: Self = Self(1 << 0);
    pub const DELETED: Self = Self(1 << 1);
    pub const SPAWNED: Self = Self(1 << 2);
    pub const WAITING_PATH: Self = Self(1 << 3);
    pub const WAITING_SPACE: Self = Self(1 << 4);
    pub const WAITING_CARGO: Self = Self(1 << 5);
    pub const REVERSED: Self = Self(1 << 6);
    pub const UNDERGROUND: Self = Self(1 << 7);
    pub const TRANSITION: Self = Self(1 << 8);

    /// A vehicle carrying none of these has nothing left to do.
    pub const ACTIVE: Self = Self(
        Self::SPAWNED.0 | Self::WAITING_PATH.0 | Self::WAITING_SPACE.0 | Self::WAITING_CARGO.0,
    );
}

/// Last simulated pose of a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RailKind {
    #[default]
    Train,
    Metro,
}

/// Static prefab data of a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleInfo {
    pub class_name: String,
    pub kind: RailKind,
    /// Deceleration, in units per tick squared.
    pub braking: f32,
    pub wheel_base: f32,
    pub turning: f32,
    pub max_speed: f32,
}

impl Default for VehicleInfo {
    fn default() -> Self {
        Self {
            class_name: "Train".to_string(),
            kind: RailKind::Train,
            braking: 0.5,
            wheel_base: 8.0,
            turning: 0.5,
            max_speed: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vehicle {
    pub flags: VehicleFlags,
    pub path: PathHandle,
    pub leading: VehicleId,
    pub trailing: VehicleId,
    pub frame: Frame,
    /// Physical segment the unit currently occupies (rear to front).
    pub segment: Segment3,
    /// Ticks spent blocked; saturates at 255.
    pub block_counter: u8,
    pub info: VehicleInfo,
}

impl Vehicle {
    pub fn new(info: VehicleInfo) -> Self {
        Self {
            flags: VehicleFlags::CREATED,
            info,
            ..Default::default()
        }
    }

    pub fn with_flags(mut self, flags: VehicleFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_reversed(&self) -> bool {
        self.flags.contains(VehicleFlags::REVERSED)
    }

    pub fn is_alive(&self) -> bool {
        self.flags.contains(VehicleFlags::CREATED) && !self.flags.contains(VehicleFlags::DELETED)
    }
}

/// Vehicle slots addressed by [`VehicleId`]. Slot 0 is the null vehicle.
#[derive(Resource, Debug, Clone)]
pub struct VehicleArena {
    vehicles: Vec<Vehicle>,
}

impl Default for VehicleArena {
    fn default() -> Self {
        Self {
            vehicles: vec![Vehicle::default()],
        }
    }
}

impl VehicleArena {
    /// Store a vehicle in the next slot. Returns [`VehicleId::NULL`] and
    /// drops the vehicle once the id space is exhausted.
    pub fn insert(&mut self, vehicle: Vehicle) -> VehicleId {
        let Ok(raw) = u16::try_from(self.vehicles.len()) else {
            warn!("Vehicle arena full, dropping {}", vehicle.info.class_name);
            return VehicleId::NULL;
        };
        let id = VehicleId(raw);
        self.vehicles.push(vehicle);
        id
    }

    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        if id.is_null() {
            return None;
        }
        self.vehicles.get(id.index())
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        if id.is_null() {
            return None;
        }
        self.vehicles.get_mut(id.index())
    }

    /// Created and not deleted.
    pub fn is_alive(&self, id: VehicleId) -> bool {
        self.get(id).is_some_and(Vehicle::is_alive)
    }

    pub fn flags(&self, id: VehicleId) -> VehicleFlags {
        self.get(id).map_or(VehicleFlags::NONE, |v| v.flags)
    }

    /// Couple `trailing` behind `leading`.
    pub fn link(&mut self, leading: VehicleId, trailing: VehicleId) {
        if let Some(lead) = self.get_mut(leading) {
            lead.trailing = trailing;
        }
        if let Some(trail) = self.get_mut(trailing) {
            trail.leading = leading;
        }
    }

    /// Last unit of the consist starting at `id`, following trailing links
    /// for at most `max_hops` hops.
    pub fn last_vehicle(&self, id: VehicleId, max_hops: u32) -> VehicleId {
        let mut current = id;
        let mut hops = 0;
        while let Some(vehicle) = self.get(current) {
            if vehicle.trailing.is_null() || hops >= max_hops {
                break;
            }
            current = vehicle.trailing;
            hops += 1;
        }
        current
    }

    /// Next unit when walking the consist from its front.
    pub fn next_unit(&self, id: VehicleId, reversed: bool) -> VehicleId {
        self.get(id).map_or(VehicleId::NULL, |v| {
            if reversed {
                v.leading
            } else {
                v.trailing
            }
        })
    }

    /// Number of slots including the null slot.
    pub fn capacity(&self) -> usize {
        self.vehicles.len()
    }

    pub fn iter_alive(&self) -> impl Iterator<Item = (VehicleId, &Vehicle)> {
        self.vehicles
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, v)| v.is_alive())
            .map(|(i, v)| (VehicleId(i as u16), v))
    }
}
