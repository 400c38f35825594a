//! Road and rail network read model.
//!
//! The host owns the real network; [`LaneNetwork`] mirrors the parts this
//! crate reads: which nodes, segments and lanes exist, each segment's prefab
//! lanes, and the singly-linked chain of lane instances per segment.

mod store;
mod types;

pub use store::{LaneNetwork, SegmentLanes};
pub use types::*;
