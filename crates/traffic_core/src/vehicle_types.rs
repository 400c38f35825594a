//! Vehicle category bitmask used by lane restrictions.
//!
//! One bit per category a player can allow or forbid on a lane; the composite
//! constants (`ROAD_VEHICLE`, `RAIL_VEHICLE`, ...) are unions of those bits.

use serde::{Deserialize, Serialize};

/// Implements the set-algebra operators and helpers for a `u16`/`u32` bitmask
/// newtype.
macro_rules! bitmask_ops {
    ($ty:ident, $repr:ty) => {
        impl $ty {
            pub const NONE: Self = Self(0);

            #[inline]
            pub const fn bits(self) -> $repr {
                self.0
            }

            #[inline]
            pub const fn from_bits(bits: $repr) -> Self {
                Self(bits)
            }

            #[inline]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// True if every bit of `other` is set in `self`.
            #[inline]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// True if `self` and `other` share at least one bit.
            #[inline]
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            #[inline]
            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            #[inline]
            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }
        }

        impl std::ops::BitOr for $ty {
            type Output = Self;
            #[inline]
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $ty {
            #[inline]
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl std::ops::BitAnd for $ty {
            type Output = Self;
            #[inline]
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl std::ops::BitAndAssign for $ty {
            #[inline]
            fn bitand_assign(&mut self, rhs: Self) {
                self.0 &= rhs.0;
            }
        }

        impl std::ops::Not for $ty {
            type Output = Self;
            #[inline]
            fn not(self) -> Self {
                Self(!self.0)
            }
        }
    };
}

pub(crate) use bitmask_ops;

/// Set of vehicle categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VehicleTypes(pub u16);

bitmask_ops!(VehicleTypes, u16);

impl VehicleTypes {
    pub const PASSENGER_CAR: Self = Self(1 << 0);
    pub const BUS: Self = Self(1 << 1);
    pub const TAXI: Self = Self(1 << 2);
    pub const CARGO_TRUCK: Self = Self(1 << 3);
    pub const SERVICE: Self = Self(1 << 4);
    pub const EMERGENCY: Self = Self(1 << 5);
    pub const PASSENGER_TRAIN: Self = Self(1 << 6);
    pub const CARGO_TRAIN: Self = Self(1 << 7);
    pub const TRAM: Self = Self(1 << 8);
    pub const BICYCLE: Self = Self(1 << 9);
    pub const PEDESTRIAN: Self = Self(1 << 10);
    pub const PASSENGER_SHIP: Self = Self(1 << 11);
    pub const CARGO_SHIP: Self = Self(1 << 12);
    pub const PASSENGER_PLANE: Self = Self(1 << 13);

    pub const ROAD_PUBLIC_TRANSPORT: Self = Self(Self::BUS.0 | Self::TAXI.0);
    pub const ROAD_VEHICLE: Self = Self(
        Self::PASSENGER_CAR.0
            | Self::ROAD_PUBLIC_TRANSPORT.0
            | Self::CARGO_TRUCK.0
            | Self::SERVICE.0
            | Self::EMERGENCY.0,
    );
    pub const RAIL_VEHICLE: Self = Self(Self::PASSENGER_TRAIN.0 | Self::CARGO_TRAIN.0);
    pub const SHIP: Self = Self(Self::PASSENGER_SHIP.0 | Self::CARGO_SHIP.0);
    pub const PLANE: Self = Self::PASSENGER_PLANE;
    pub const CARGO_VEHICLE: Self =
        Self(Self::CARGO_TRUCK.0 | Self::CARGO_TRAIN.0 | Self::CARGO_SHIP.0);
    pub const PUBLIC_TRANSPORT: Self =
        Self(Self::ROAD_PUBLIC_TRANSPORT.0 | Self::PASSENGER_TRAIN.0 | Self::TRAM.0);
}

/// Whether `vehicle_type` may use a lane with the given permission set.
/// `None` means the lane carries no restriction information at all.
pub fn is_allowed(allowed: Option<VehicleTypes>, vehicle_type: VehicleTypes) -> bool {
    allowed.map_or(true, |types| types.intersects(vehicle_type))
}

pub fn is_bicycle_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::BICYCLE)
}

pub fn is_bus_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::BUS)
}

pub fn is_cargo_train_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::CARGO_TRAIN)
}

pub fn is_cargo_truck_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::CARGO_TRUCK)
}

pub fn is_emergency_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::EMERGENCY)
}

pub fn is_passenger_car_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::PASSENGER_CAR)
}

pub fn is_passenger_train_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::PASSENGER_TRAIN)
}

pub fn is_service_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::SERVICE)
}

pub fn is_taxi_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::TAXI)
}

pub fn is_tram_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::TRAM)
}

pub fn is_rail_vehicle_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::RAIL_VEHICLE)
}

pub fn is_road_vehicle_allowed(allowed: Option<VehicleTypes>) -> bool {
    is_allowed(allowed, VehicleTypes::ROAD_VEHICLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composites_are_disjoint_where_expected() {
        assert!(!VehicleTypes::ROAD_VEHICLE.intersects(VehicleTypes::RAIL_VEHICLE));
        assert!(!VehicleTypes::ROAD_VEHICLE.intersects(VehicleTypes::BICYCLE));
        assert!(VehicleTypes::ROAD_VEHICLE.contains(VehicleTypes::ROAD_PUBLIC_TRANSPORT));
        assert!(VehicleTypes::CARGO_VEHICLE.contains(VehicleTypes::CARGO_TRAIN));
    }

    #[test]
    fn test_set_algebra() {
        let mut types = VehicleTypes::BUS | VehicleTypes::TAXI;
        assert_eq!(types, VehicleTypes::ROAD_PUBLIC_TRANSPORT);
        types.remove(VehicleTypes::TAXI);
        assert_eq!(types, VehicleTypes::BUS);
        types.insert(VehicleTypes::TRAM);
        assert!(types.contains(VehicleTypes::TRAM));
        assert_eq!(types & !VehicleTypes::BUS, VehicleTypes::TRAM);
        assert!((VehicleTypes::NONE).is_empty());
    }

    #[test]
    fn test_is_allowed_without_restriction() {
        assert!(is_allowed(None, VehicleTypes::CARGO_TRUCK));
        assert!(is_bicycle_allowed(None));
    }

    #[test]
    fn test_is_allowed_with_restriction() {
        let allowed = Some(VehicleTypes::ROAD_PUBLIC_TRANSPORT);
        assert!(is_bus_allowed(allowed));
        assert!(is_taxi_allowed(allowed));
        assert!(!is_passenger_car_allowed(allowed));
        assert!(is_road_vehicle_allowed(allowed));
        assert!(!is_rail_vehicle_allowed(allowed));
        assert!(!is_emergency_allowed(Some(VehicleTypes::NONE)));
    }
}
