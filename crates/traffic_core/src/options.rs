//! Runtime options for the traffic core.
//!
//! Collects the switches the host exposes in its options menu into a single
//! [`TrafficOptions`] resource. Loading them from disk is the host's job; the
//! serde derives let it do so with whatever format it already uses.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::MAX_CONSIST_HOPS;

/// Which side of the road traffic keeps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrivingSide {
    #[default]
    RightHand,
    LeftHand,
}

impl DrivingSide {
    pub fn is_left_hand(self) -> bool {
        self == DrivingSide::LeftHand
    }
}

/// Tunables read by the restriction resolver and the train controller.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficOptions {
    /// Release vehicles whose block counter saturated.
    pub despawn_when_stuck: bool,
    pub driving_side: DrivingSide,
    /// 0 = most accurate. Position bookkeeping at lane transitions only runs
    /// at levels 0 and 1.
    pub sim_accuracy: u8,
    /// Hop bound for consist traversal.
    pub max_consist_hops: u32,
    /// Ticks a path request may stay pending before it is abandoned.
    pub path_wait_limit: u16,
}

impl Default for TrafficOptions {
    fn default() -> Self {
        Self {
            despawn_when_stuck: true,
            driving_side: DrivingSide::RightHand,
            sim_accuracy: 1,
            max_consist_hops: MAX_CONSIST_HOPS,
            path_wait_limit: u16::MAX,
        }
    }
}

impl TrafficOptions {
    /// Whether optional position instrumentation should run.
    pub fn tracks_positions(&self) -> bool {
        self.sim_accuracy <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TrafficOptions::default();
        assert!(options.despawn_when_stuck);
        assert_eq!(options.driving_side, DrivingSide::RightHand);
        assert_eq!(options.max_consist_hops, 16_384);
        assert_eq!(options.path_wait_limit, u16::MAX);
        assert!(options.tracks_positions());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let options: TrafficOptions =
            serde_json::from_str(r#"{ "driving_side": "LeftHand", "sim_accuracy": 3 }"#)
                .expect("deserialize");
        assert!(options.driving_side.is_left_hand());
        assert_eq!(options.sim_accuracy, 3);
        assert!(!options.tracks_positions());
        assert!(options.despawn_when_stuck);
        assert_eq!(options.max_consist_hops, 16_384);
    }

    #[test]
    fn test_json_roundtrip() {
        let options = TrafficOptions {
            despawn_when_stuck: false,
            path_wait_limit: 600,
            ..Default::default()
        };
        let json = serde_json::to_string(&options).expect("serialize");
        let back: TrafficOptions = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, options);
    }
}
