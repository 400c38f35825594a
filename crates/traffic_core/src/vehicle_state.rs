//! Per-vehicle scratch state kept beside the host's vehicle arena.
//!
//! Holds what the host's vehicle record has no room for: how long a path
//! request has been pending and where the vehicle was last seen. Entries are
//! created on first touch and dropped when the vehicle is released.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::error::TrainAiError;
use crate::network::PathPosition;
use crate::vehicles::{Vehicle, VehicleId};

/// Traffic-load accounting kept by the host (lane occupancy, junction
/// queues). Every call is best-effort: callers log failures and carry on.
pub trait VehicleStateTracker {
    fn on_path_find_ready(&mut self, id: VehicleId, vehicle: &Vehicle) -> Result<(), TrainAiError>;

    fn log_traffic(&mut self, id: VehicleId, vehicle: &Vehicle) -> Result<(), TrainAiError>;

    fn update_vehicle_pos(&mut self, id: VehicleId, vehicle: &Vehicle) -> Result<(), TrainAiError>;

    /// Position update for a vehicle about to move from `prev` to `next`.
    fn update_vehicle_pos_between(
        &mut self,
        id: VehicleId,
        prev: PathPosition,
        next: PathPosition,
    ) -> Result<(), TrainAiError>;
}

/// Tracker for hosts without traffic-load accounting.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTracking;

impl VehicleStateTracker for NoTracking {
    fn on_path_find_ready(&mut self, _: VehicleId, _: &Vehicle) -> Result<(), TrainAiError> {
        Ok(())
    }

    fn log_traffic(&mut self, _: VehicleId, _: &Vehicle) -> Result<(), TrainAiError> {
        Ok(())
    }

    fn update_vehicle_pos(&mut self, _: VehicleId, _: &Vehicle) -> Result<(), TrainAiError> {
        Ok(())
    }

    fn update_vehicle_pos_between(
        &mut self,
        _: VehicleId,
        _: PathPosition,
        _: PathPosition,
    ) -> Result<(), TrainAiError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleEphemeralState {
    /// Ticks the current path request has been pending.
    pub path_wait_counter: u16,
    pub last_position: Option<Vec3>,
}

#[derive(Resource, Debug, Default)]
pub struct VehicleEphemeralStates {
    states: HashMap<VehicleId, VehicleEphemeralState>,
}

impl VehicleEphemeralStates {
    pub fn get(&self, id: VehicleId) -> Option<&VehicleEphemeralState> {
        self.states.get(&id)
    }

    pub fn state_mut(&mut self, id: VehicleId) -> &mut VehicleEphemeralState {
        self.states.entry(id).or_default()
    }

    pub fn path_wait(&self, id: VehicleId) -> u16 {
        self.get(id).map_or(0, |s| s.path_wait_counter)
    }

    pub fn reset_path_wait(&mut self, id: VehicleId) {
        // Avoid allocating an entry just to store a zero.
        if let Some(state) = self.states.get_mut(&id) {
            state.path_wait_counter = 0;
        }
    }

    /// Count one more pending tick, saturating at `limit`.
    pub fn increment_path_wait(&mut self, id: VehicleId, limit: u16) -> u16 {
        let state = self.state_mut(id);
        state.path_wait_counter = state.path_wait_counter.saturating_add(1).min(limit);
        state.path_wait_counter
    }

    pub fn path_wait_saturated(&self, id: VehicleId, limit: u16) -> bool {
        self.path_wait(id) >= limit
    }

    pub fn record_position(&mut self, id: VehicleId, position: Vec3) {
        self.state_mut(id).last_position = Some(position);
    }

    pub fn last_position(&self, id: VehicleId) -> Option<Vec3> {
        self.get(id).and_then(|s| s.last_position)
    }

    pub fn release(&mut self, id: VehicleId) {
        self.states.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Fired by the host after it freed a vehicle slot.
#[derive(Event, Debug, Clone, Copy)]
pub struct VehicleReleasedEvent {
    pub vehicle: VehicleId,
}

pub fn drop_released_vehicle_state(
    mut events: EventReader<VehicleReleasedEvent>,
    mut states: ResMut<VehicleEphemeralStates>,
) {
    for event in events.read() {
        states.release(event.vehicle);
    }
}

pub struct VehicleStatePlugin;

impl Plugin for VehicleStatePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VehicleEphemeralStates>()
            .add_event::<VehicleReleasedEvent>()
            .add_systems(Update, drop_released_vehicle_state);
    }
}
