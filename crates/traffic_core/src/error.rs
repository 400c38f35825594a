// ---------------------------------------------------------------------------
// TrainAiError: failures reported by host callbacks during a train tick
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors returned by the host and tracker callbacks of the train controller.
///
/// None of these escape [`crate::train_ai::PathLifecycleController`]: a failed
/// path consumption clears the vehicle's path and unspawns it, and tracking
/// failures are logged and swallowed.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainAiError {
    /// The host could not turn a ready path into vehicle state.
    PathConsumption(String),
    /// Traffic-load bookkeeping failed.
    Tracking(String),
}

impl fmt::Display for TrainAiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainAiError::PathConsumption(msg) => write!(f, "Path consumption failed: {msg}"),
            TrainAiError::Tracking(msg) => write!(f, "Vehicle tracking failed: {msg}"),
        }
    }
}

impl std::error::Error for TrainAiError {}
