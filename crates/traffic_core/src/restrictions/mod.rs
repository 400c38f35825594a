//! Lane vehicle restrictions.
//!
//! Decides which vehicle categories may use each lane. A player-set override
//! always wins; otherwise the default is derived from the lane's capability
//! flags and cached per segment. Every edit notifies both end nodes of the
//! segment so path views built on the old permissions get rebuilt.

mod observers;
mod plugin;
mod resolver;
mod types;

pub use observers::{NodeInvalidations, NodeObserver};
pub use plugin::{
    apply_restriction_edits, invalidate_changed_segments, EditLaneRestrictionEvent,
    RestrictionsPlugin, SegmentLanesChangedEvent,
};
pub use resolver::{base_mask, base_mask_for_lane_id, compute_default_types, LaneRestrictions};
pub use types::{RestrictionEdit, RestrictionOverride};
