use bevy::prelude::*;

use crate::error::TrainAiError;
use crate::network::{LaneType, PathPosition};
use crate::options::TrafficOptions;
use crate::vehicle_state::{VehicleEphemeralStates, VehicleStateTracker};
use crate::vehicle_types::VehicleTypes;
use crate::vehicles::{PathHandle, RailKind, VehicleArena, VehicleId};

// =============================================================================
// Path search collaborator
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    Pending,
    Ready,
    Failed,
}

/// Snap a world position onto the nearest usable lanes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPositionQuery {
    pub position: Vec3,
    pub lane_type: LaneType,
    pub kind: RailKind,
    pub allow_underground: bool,
    pub max_distance: f32,
}

/// Nearest lane position and the nearest one in the opposite direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPositionCandidates {
    pub primary: PathPosition,
    pub secondary: Option<PathPosition>,
    pub primary_distance: f32,
    pub secondary_distance: f32,
}

impl PathPositionCandidates {
    /// Keep the secondary candidate only when both directions are allowed and
    /// it is not much farther away than the primary one.
    pub fn secondary_within(&self, both_ways: bool, tolerance: f32) -> Option<PathPosition> {
        if !both_ways || self.secondary_distance > self.primary_distance * tolerance {
            None
        } else {
            self.secondary
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathRequest {
    pub vehicle: VehicleId,
    /// Category the lane restrictions are checked against; `None` skips them.
    pub category: Option<VehicleTypes>,
    pub start: PathPosition,
    pub start_secondary: Option<PathPosition>,
    pub end: PathPosition,
    pub end_secondary: Option<PathPosition>,
    pub lane_type: LaneType,
    pub kind: RailKind,
    pub max_length: f32,
}

/// Opaque path search. Handles are allocated by `create_path` and must be
/// handed back through `release_path` exactly once.
pub trait PathManager {
    fn find_path_position(&self, query: &PathPositionQuery) -> Option<PathPositionCandidates>;

    fn create_path(&mut self, request: &PathRequest) -> Option<PathHandle>;

    fn release_path(&mut self, handle: PathHandle);

    fn status(&self, handle: PathHandle) -> PathStatus;
}

// =============================================================================
// Host simulation
// =============================================================================

/// Per-unit behaviour owned by the host simulation.
pub trait VehicleHost {
    /// Turn a ready path into vehicle state (first path unit, target
    /// positions). Failing leaves the vehicle to be unspawned.
    fn path_find_ready(&mut self, id: VehicleId, vehicles: &mut VehicleArena) -> Result<(), TrainAiError>;

    fn try_spawn(&mut self, id: VehicleId, vehicles: &mut VehicleArena);

    /// Advance one unit of the consist led by `lead`.
    fn simulation_step(&mut self, unit: VehicleId, lead: VehicleId, vehicles: &mut VehicleArena);

    fn unspawn(&mut self, id: VehicleId, vehicles: &mut VehicleArena);

    /// Free the vehicle slot. The path handle has already been released.
    fn release_vehicle(&mut self, id: VehicleId, vehicles: &mut VehicleArena);

    /// Restriction category of the vehicle, if it has one.
    fn vehicle_category(&self, id: VehicleId, vehicles: &VehicleArena) -> Option<VehicleTypes>;
}

/// Everything a train tick touches.
pub struct TrainAiContext<'a> {
    pub vehicles: &'a mut VehicleArena,
    pub states: &'a mut VehicleEphemeralStates,
    pub options: &'a TrafficOptions,
    pub paths: &'a mut dyn PathManager,
    pub host: &'a mut dyn VehicleHost,
    pub tracker: &'a mut dyn VehicleStateTracker,
}

// =============================================================================
// Outcomes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnspawnReason {
    /// The host failed to consume a ready path.
    PathConsumeFailed,
    /// The search failed, no handle was held, or it took too long.
    PathFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    /// The consist flipped direction twice within one tick.
    InconsistentOrientation,
    /// Not spawned and not waiting for anything.
    Idle,
    /// Blocked for too long.
    Stuck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continued,
    /// The vehicle was deleted during the tick.
    Ended,
    Unspawned(UnspawnReason),
    Released(ReleaseReason),
}
