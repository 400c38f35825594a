//! Train and metro path lifecycle.
//!
//! Called by the host once per tick per consist. Polls the pending path
//! request, moves the units in travel order and releases vehicles that are
//! idle or stuck. Path search itself stays behind [`PathManager`].

mod controller;
mod path_find;
mod types;

pub use controller::PathLifecycleController;
pub use types::{
    PathManager, PathPositionCandidates, PathPositionQuery, PathRequest, PathStatus,
    ReleaseReason, StepOutcome, TrainAiContext, UnspawnReason, VehicleHost,
};
