use crate::vehicle_types::VehicleTypes;

/// Per-lane manual restriction. `Unset` inherits the computed default;
/// `Explicit` wins even when it equals the default or is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestrictionOverride {
    #[default]
    Unset,
    Explicit(VehicleTypes),
}

impl RestrictionOverride {
    pub fn explicit(self) -> Option<VehicleTypes> {
        match self {
            RestrictionOverride::Unset => None,
            RestrictionOverride::Explicit(types) => Some(types),
        }
    }
}

/// A single restriction edit, as issued by the authoring tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionEdit {
    Set(VehicleTypes),
    Add(VehicleTypes),
    Remove(VehicleTypes),
    Toggle { types: VehicleTypes, add: bool },
}
