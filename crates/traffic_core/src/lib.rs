use bevy::prelude::*;

pub mod config;
pub mod error;
pub mod geometry;
pub mod lane_transition;
pub mod network;
pub mod options;
pub mod restrictions;
pub mod spatial_grid;
pub mod train_ai;
pub mod vehicle_state;
pub mod vehicle_types;
pub mod vehicles;

pub use error::TrainAiError;
pub use options::{DrivingSide, TrafficOptions};
pub use vehicle_types::VehicleTypes;

use restrictions::RestrictionsPlugin;
use spatial_grid::{rebuild_vehicle_index, VehicleSpatialIndex};
use vehicle_state::VehicleStatePlugin;
use vehicles::VehicleArena;

/// Registers the shared stores and the restriction and vehicle-state
/// plugins. Train ticks are driven by the host through
/// [`train_ai::PathLifecycleController`].
pub struct TrafficCorePlugin;

impl Plugin for TrafficCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TrafficOptions>()
            .init_resource::<VehicleArena>()
            .init_resource::<VehicleSpatialIndex>()
            .add_systems(Update, rebuild_vehicle_index);

        app.add_plugins((RestrictionsPlugin, VehicleStatePlugin));
    }
}
